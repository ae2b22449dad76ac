//! Structured view of a Go source file and its canonical rendering.
//!
//! A [`GoFile`] keeps only what the post-processor edits: the comments above
//! the package clause, the package clause itself, the import specs, and each
//! remaining top-level declaration as verbatim text with its attached
//! comments. Rendering always produces the same layout, so
//! `render(parse(render(x))) == render(x)`.
//!
//! # Examples
//!
//! ```
//! use protoforge_files::GoFile;
//! use std::path::Path;
//!
//! let source = "package models\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n)\n\nfunc Name() string { return fmt.Sprint(1) }\n";
//! let mut file = GoFile::parse(Path::new("name.go"), source).unwrap();
//! let removed = file.prune_imports();
//! assert_eq!(removed[0].path, "strings");
//! assert_eq!(
//!     file.render(),
//!     "package models\n\nimport (\n\t\"fmt\"\n)\n\nfunc Name() string { return fmt.Sprint(1) }\n"
//! );
//! ```

use crate::syntax::{comment_body, descendants_of_kind, parse_go, text};
use protoforge_core::Result;
use std::collections::HashSet;
use std::path::Path;
use tree_sitter::Node;

/// One import spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit name: an alias, `_`, or `.`
    pub name: Option<String>,
    /// Import path without quotes
    pub path: String,
}

impl ImportSpec {
    /// Creates a spec.
    #[must_use]
    pub fn new(name: Option<&str>, path: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            path: path.to_string(),
        }
    }

    /// Identifier the import binds in the file.
    ///
    /// Without an explicit name this is the last path segment, skipping a
    /// trailing major-version segment (`/v2`) and a `.vN` suffix, with `-`
    /// mapped to `_`.
    ///
    /// # Examples
    ///
    /// ```
    /// use protoforge_files::ImportSpec;
    ///
    /// assert_eq!(ImportSpec::new(None, "github.com/goal-web/contracts").bound_name(), "contracts");
    /// assert_eq!(ImportSpec::new(None, "github.com/jackc/pgx/v5").bound_name(), "pgx");
    /// assert_eq!(ImportSpec::new(None, "gopkg.in/yaml.v3").bound_name(), "yaml");
    /// assert_eq!(ImportSpec::new(Some("svc"), "example.com/app/services").bound_name(), "svc");
    /// ```
    #[must_use]
    pub fn bound_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let mut segments = self.path.rsplit('/');
        let mut last = segments.next().unwrap_or_default();
        if is_major_version(last)
            && let Some(previous) = segments.next()
        {
            last = previous;
        }
        let last = match last.rsplit_once(".v") {
            Some((stem, version)) if is_digits(version) => stem,
            _ => last,
        };
        last.replace('-', "_")
    }

    /// Returns `true` for `_` and `.` imports, which are never pruned.
    #[must_use]
    pub fn is_unbound(&self) -> bool {
        matches!(self.name.as_deref(), Some("_" | "."))
    }

    fn render(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} \"{}\"", self.path),
            None => format!("\"{}\"", self.path),
        }
    }

    fn is_std(&self) -> bool {
        !self.path.split('/').next().unwrap_or_default().contains('.')
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_major_version(segment: &str) -> bool {
    segment.strip_prefix('v').is_some_and(is_digits)
}

/// A parsed Go file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoFile {
    leading_comments: Vec<String>,
    package: String,
    imports: Vec<ImportSpec>,
    decls: Vec<String>,
    used_names: HashSet<String>,
}

struct Chunk {
    text: String,
    end_row: usize,
}

impl GoFile {
    /// Parses Go source.
    ///
    /// # Errors
    ///
    /// Returns [`protoforge_core::Error::SourceParse`] if the source has a
    /// syntax error or no package clause.
    pub fn parse(path: &Path, source: &str) -> Result<Self> {
        let tree = parse_go(path, source)?;
        let root = tree.root_node();

        let mut leading_comments = Vec::new();
        let mut package = None;
        let mut imports: Vec<ImportSpec> = Vec::new();
        let mut used_names = HashSet::new();
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut pending: Vec<Node<'_>> = Vec::new();

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            match node.kind() {
                "comment" if package.is_none() => {
                    leading_comments.push(text(node, source).trim_end().to_string());
                }
                "package_clause" => package = Some(text(node, source).to_string()),
                "import_declaration" => {
                    for spec in import_specs(node, source) {
                        if !imports.contains(&spec) {
                            imports.push(spec);
                        }
                    }
                }
                "comment" => {
                    let row = node.start_position().row;
                    if pending.is_empty()
                        && let Some(last) = chunks.last_mut()
                        && last.end_row == row
                    {
                        last.text.push(' ');
                        last.text.push_str(text(node, source).trim_end());
                        continue;
                    }
                    flush_detached(&mut pending, row, &mut chunks, source);
                    pending.push(node);
                }
                _ => {
                    collect_names(node, source, &mut used_names);
                    flush_detached(&mut pending, node.start_position().row, &mut chunks, source);
                    let mut chunk = comment_lines(&pending, source);
                    chunk.push_str(text(node, source));
                    pending.clear();
                    chunks.push(Chunk {
                        text: chunk,
                        end_row: node.end_position().row,
                    });
                }
            }
        }
        if let Some(last) = pending.last() {
            let text = comment_lines(&pending, source);
            chunks.push(Chunk {
                text: text.trim_end().to_string(),
                end_row: last.end_position().row,
            });
        }

        let package = package.ok_or_else(|| protoforge_core::Error::SourceParse {
            path: path.to_path_buf(),
            message: "missing package clause".to_string(),
        })?;

        Ok(Self {
            leading_comments,
            package,
            imports,
            decls: chunks.into_iter().map(|c| c.text).collect(),
            used_names,
        })
    }

    /// Import specs in order.
    #[must_use]
    pub fn imports(&self) -> &[ImportSpec] {
        &self.imports
    }

    /// Adds an import unless the same spec is already present.
    pub fn add_import(&mut self, spec: ImportSpec) {
        if !self.imports.contains(&spec) {
            self.imports.push(spec);
        }
    }

    /// Places `header` at the top of the file exactly once.
    ///
    /// Each header line is compared with the existing leading comments on
    /// their text with comment markers stripped; matching copies are removed
    /// before the header is prepended. Lines that are not comments get a
    /// `// ` prefix unless the whole header is one block comment. Returns
    /// `true` if the comments changed.
    pub fn ensure_header(&mut self, header: &str) -> bool {
        let trimmed = header.trim();
        let block = trimmed.starts_with("/*") && trimmed.ends_with("*/");
        let lines: Vec<String> = header
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| {
                if block || l.starts_with("//") {
                    l.to_string()
                } else {
                    format!("// {l}")
                }
            })
            .collect();
        if lines.is_empty() {
            return false;
        }
        let bodies: Vec<&str> = lines.iter().map(|l| comment_body(l)).collect();
        let before = self.leading_comments.clone();
        self.leading_comments
            .retain(|c| !bodies.contains(&comment_body(c)));
        let mut comments = lines.clone();
        comments.append(&mut self.leading_comments);
        self.leading_comments = comments;
        self.leading_comments != before
    }

    /// Removes imports whose bound name is never referenced.
    ///
    /// `_` and `.` imports are kept. Returns the removed specs.
    pub fn prune_imports(&mut self) -> Vec<ImportSpec> {
        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.imports)
            .into_iter()
            .partition(|spec| spec.is_unbound() || self.used_names.contains(&spec.bound_name()));
        self.imports = kept;
        for spec in &removed {
            tracing::debug!("Pruned unused import \"{}\"", spec.path);
        }
        removed
    }

    /// Renders the canonical form.
    #[must_use]
    pub fn render(&self) -> String {
        let mut sections: Vec<String> = Vec::new();
        if !self.leading_comments.is_empty() {
            sections.push(self.leading_comments.join("\n"));
        }
        sections.push(self.package.clone());
        if !self.imports.is_empty() {
            sections.push(self.render_imports());
        }
        sections.extend(self.decls.iter().cloned());

        let joined = sections.join("\n\n");
        let mut out: String = joined
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        out.push('\n');
        out
    }

    fn render_imports(&self) -> String {
        let (standard, external): (Vec<&ImportSpec>, Vec<&ImportSpec>) =
            self.imports.iter().partition(|spec| spec.is_std());
        let mut block = String::from("import (\n");
        for spec in &standard {
            block.push('\t');
            block.push_str(&spec.render());
            block.push('\n');
        }
        if !standard.is_empty() && !external.is_empty() {
            block.push('\n');
        }
        for spec in &external {
            block.push('\t');
            block.push_str(&spec.render());
            block.push('\n');
        }
        block.push(')');
        block
    }
}

/// Emits pending comments as a detached chunk when a blank line separates
/// them from the node starting at `next_row`.
fn flush_detached(
    pending: &mut Vec<Node<'_>>,
    next_row: usize,
    chunks: &mut Vec<Chunk>,
    source: &str,
) {
    let Some(last) = pending.last() else {
        return;
    };
    if next_row > last.end_position().row + 1 {
        let text = comment_lines(pending, source);
        chunks.push(Chunk {
            text: text.trim_end().to_string(),
            end_row: last.end_position().row,
        });
        pending.clear();
    }
}

fn comment_lines(comments: &[Node<'_>], source: &str) -> String {
    let mut out = String::new();
    for comment in comments {
        out.push_str(text(*comment, source).trim_end());
        out.push('\n');
    }
    out
}

pub(crate) fn import_specs(declaration: Node<'_>, source: &str) -> Vec<ImportSpec> {
    let mut nodes = Vec::new();
    descendants_of_kind(declaration, "import_spec", &mut nodes);
    nodes
        .into_iter()
        .filter_map(|spec| {
            let path = spec.child_by_field_name("path")?;
            let path = text(path, source).trim_matches(|c| c == '"' || c == '`');
            let name = spec
                .child_by_field_name("name")
                .map(|name| text(name, source));
            Some(ImportSpec::new(name, path))
        })
        .collect()
}

fn collect_names(node: Node<'_>, source: &str, out: &mut HashSet<String>) {
    if matches!(
        node.kind(),
        "identifier" | "package_identifier" | "type_identifier" | "field_identifier"
    ) {
        out.insert(text(node, source).to_string());
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_names(child, source, out);
    }
}
