//! Route registration in the central registration file.

use crate::go_file::{GoFile, ImportSpec, import_specs};
use crate::normalize::write_if_changed;
use crate::syntax::{parse_go, text};
use protoforge_core::{Error, Result, RouterConfig};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tree_sitter::Node;

/// What [`inject_router`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The registration file did not exist and was created with the call
    Created,
    /// The call was appended to the registration function
    Inserted,
    /// An identical call was already registered
    AlreadyPresent,
}

impl Outcome {
    /// Returns `true` if the file was written.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Created | Self::Inserted)
    }
}

/// Ensures `call` is registered exactly once in `file`.
///
/// A missing file is created from a skeleton holding an empty registration
/// function. When `import_path` is given, the call's package qualifier is
/// rewritten to the alias that path has in the file, importing it under a
/// fresh alias (`base`, `base1`, `base2`, ...) if needed. Only top-level
/// statements of the registration function count as registered calls, and
/// they are compared with whitespace removed.
///
/// # Errors
///
/// Returns [`Error::SourceParse`] if the file does not parse or lacks the
/// registration function, and [`Error::Io`] on read or write failures.
///
/// # Examples
///
/// ```
/// use protoforge_core::RouterConfig;
/// use protoforge_files::{Outcome, inject_router};
///
/// let dir = tempfile::tempdir().unwrap();
/// let kernel = dir.path().join("controllers/kernel.go");
/// let config = RouterConfig::default();
///
/// let call = "auth.AuthServiceRouter(router)";
/// let path = Some("example.com/app/controllers/auth");
/// assert_eq!(inject_router(&kernel, path, call, &config).unwrap(), Outcome::Created);
/// assert_eq!(inject_router(&kernel, path, call, &config).unwrap(), Outcome::AlreadyPresent);
/// ```
pub fn inject_router(
    file: &Path,
    import_path: Option<&str>,
    call: &str,
    config: &RouterConfig,
) -> Result<Outcome> {
    let (current, created) = if file.is_file() {
        (fs::read_to_string(file).map_err(|e| Error::io(file, e))?, false)
    } else {
        (skeleton(config), true)
    };

    let tree = parse_go(file, &current)?;
    let root = tree.root_node();
    let imports = top_level_imports(root, &current);
    let (call, new_import) = qualify(call, import_path, &imports);

    let body = registration_body(root, &current, &config.function).ok_or_else(|| {
        Error::SourceParse {
            path: file.to_path_buf(),
            message: format!("function {} not found", config.function),
        }
    })?;

    if contains_call(body, &current, &call) {
        tracing::debug!("{call} already registered in {}", file.display());
        return Ok(Outcome::AlreadyPresent);
    }

    let edited = insert_statement(&current, body, &call);
    let mut go_file = GoFile::parse(file, &edited)?;
    if let Some(spec) = new_import {
        go_file.add_import(spec);
    }

    if created && let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let previous = if created { "" } else { current.as_str() };
    write_if_changed(file, previous, &go_file.render())?;
    tracing::info!("Registered {call} in {}", file.display());
    Ok(if created {
        Outcome::Created
    } else {
        Outcome::Inserted
    })
}

fn skeleton(config: &RouterConfig) -> String {
    format!(
        "package {package}\n\nimport (\n\t\"{import}\"\n)\n\n// {function} registers the generated routes.\nfunc {function}({param} {ty}) {{\n}}\n",
        package = config.package_name(),
        import = config.router_import,
        function = config.function,
        param = config.router_param,
        ty = config.router_type,
    )
}

fn top_level_imports(root: Node<'_>, source: &str) -> Vec<ImportSpec> {
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .filter(|n| n.kind() == "import_declaration")
        .flat_map(|n| import_specs(n, source))
        .collect()
}

/// Rewrites the call qualifier to the alias `import_path` has in the file.
///
/// Returns the import to add when the path is not imported yet.
fn qualify(
    call: &str,
    import_path: Option<&str>,
    imports: &[ImportSpec],
) -> (String, Option<ImportSpec>) {
    let Some(path) = import_path else {
        return (call.to_string(), None);
    };
    if let Some(existing) = imports.iter().find(|s| s.path == path && !s.is_unbound()) {
        return (requalify(call, &existing.bound_name()), None);
    }

    let taken: HashSet<String> = imports.iter().map(ImportSpec::bound_name).collect();
    let base = ImportSpec::new(None, path).bound_name();
    let mut alias = base.clone();
    let mut suffix = 1;
    while taken.contains(&alias) {
        alias = format!("{base}{suffix}");
        suffix += 1;
    }
    let name = (alias != base).then_some(alias.as_str());
    tracing::debug!("Importing {path} as {alias}");
    (requalify(call, &alias), Some(ImportSpec::new(name, path)))
}

fn requalify(call: &str, alias: &str) -> String {
    let paren = call.find('(').unwrap_or(call.len());
    match call.find('.') {
        Some(dot) if dot < paren => format!("{alias}{}", &call[dot..]),
        _ => format!("{alias}.{call}"),
    }
}

fn registration_body<'t>(root: Node<'t>, source: &str, function: &str) -> Option<Node<'t>> {
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .filter(|n| n.kind() == "function_declaration")
        .find(|n| {
            n.child_by_field_name("name")
                .is_some_and(|name| text(name, source) == function)
        })
        .and_then(|n| n.child_by_field_name("body"))
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Statements directly inside `block`, looking through `statement_list`.
fn statements(block: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = block.walk();
    block
        .named_children(&mut cursor)
        .flat_map(|child| {
            if child.kind() == "statement_list" {
                let mut inner = child.walk();
                child.named_children(&mut inner).collect()
            } else {
                vec![child]
            }
        })
        .collect()
}

/// Returns `true` if `call` is a top-level expression statement of `body`.
///
/// Calls nested inside other expressions or blocks do not count.
fn contains_call(body: Node<'_>, source: &str, call: &str) -> bool {
    let wanted = squash(call);
    statements(body)
        .into_iter()
        .filter(|s| s.kind() == "expression_statement")
        .any(|s| squash(text(s, source)) == wanted)
}

/// Appends `call` as the last statement of `body`.
fn insert_statement(source: &str, body: Node<'_>, call: &str) -> String {
    let close = body.end_byte() - 1;
    let head = source[..close].trim_end_matches([' ', '\t']);
    let separator = if head.ends_with('\n') { "" } else { "\n" };
    format!("{head}{separator}\t{call}\n{}", &source[close..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(pairs: &[(Option<&str>, &str)]) -> Vec<ImportSpec> {
        pairs
            .iter()
            .map(|(name, path)| ImportSpec::new(*name, path))
            .collect()
    }

    #[test]
    fn test_requalify() {
        assert_eq!(requalify("shop.ShopRouter(router)", "shop1"), "shop1.ShopRouter(router)");
        assert_eq!(requalify("ShopRouter(router)", "shop"), "shop.ShopRouter(router)");
    }

    #[test]
    fn test_qualify_reuses_existing_alias() {
        let imports = specs(&[(Some("s"), "example.com/app/controllers/shop")]);
        let (call, import) = qualify(
            "shop.ShopRouter(router)",
            Some("example.com/app/controllers/shop"),
            &imports,
        );
        assert_eq!(call, "s.ShopRouter(router)");
        assert_eq!(import, None);
    }

    #[test]
    fn test_qualify_synthesizes_unique_alias() {
        let imports = specs(&[
            (None, "github.com/goal-web/contracts"),
            (None, "example.com/app/controllers/shop"),
            (Some("shop1"), "example.com/legacy/shop"),
        ]);
        let (call, import) = qualify(
            "shop.ShopRouter(router)",
            Some("example.com/app/controllers/admin/shop"),
            &imports,
        );
        assert_eq!(call, "shop2.ShopRouter(router)");
        assert_eq!(
            import,
            Some(ImportSpec::new(Some("shop2"), "example.com/app/controllers/admin/shop"))
        );
    }

    #[test]
    fn test_insert_into_empty_and_filled_bodies() {
        let source = "package c\n\nfunc Register(r R) {}\n";
        let tree = parse_go(Path::new("k.go"), source).unwrap();
        let body = registration_body(tree.root_node(), source, "Register").unwrap();
        assert_eq!(
            insert_statement(source, body, "a.A(r)"),
            "package c\n\nfunc Register(r R) {\n\ta.A(r)\n}\n"
        );

        let source = "package c\n\nfunc Register(r R) {\n\ta.A(r)\n}\n";
        let tree = parse_go(Path::new("k.go"), source).unwrap();
        let body = registration_body(tree.root_node(), source, "Register").unwrap();
        assert!(contains_call(body, source, "a.A( r )"));
        assert_eq!(
            insert_statement(source, body, "b.B(r)"),
            "package c\n\nfunc Register(r R) {\n\ta.A(r)\n\tb.B(r)\n}\n"
        );
    }

    #[test]
    fn test_nested_call_is_not_registered() {
        let source = "package c\n\nfunc Register(r R) {\n\twrap(a.A(r))\n\tif ok {\n\t\ta.A(r)\n\t}\n\tb.B(r)\n}\n";
        let tree = parse_go(Path::new("k.go"), source).unwrap();
        let body = registration_body(tree.root_node(), source, "Register").unwrap();
        assert!(!contains_call(body, source, "a.A(r)"));
        assert!(contains_call(body, source, "b.B(r)"));
        assert!(contains_call(body, source, "wrap(a.A(r))"));
    }

    #[test]
    fn test_skeleton_parses() {
        let source = skeleton(&RouterConfig::default());
        let tree = parse_go(Path::new("kernel.go"), &source).unwrap();
        assert!(registration_body(tree.root_node(), &source, "Register").is_some());
        assert!(source.starts_with("package controllers\n"));
    }
}
