//! Import and alias resolution for one output file.
//!
//! Resolution never mutates the extracted schema: every call works on a
//! clone, so the host pass and the SDK pass cannot observe each other's
//! rewritten display types.
//!
//! Host mode binds each referenced package to a short alias (its base name,
//! or `base{i}` on collision, where `i` is the position of the field or method
//! that first needed it). SDK mode imports each referenced type by name from
//! a relative module path.
//!
//! # Examples
//!
//! ```
//! use protoforge_codegen::imports::ImportSet;
//!
//! let mut imports = ImportSet::new();
//! assert_eq!(imports.bind_package("example.com/app/models/auth", 0), "auth");
//! assert_eq!(imports.bind_package("example.com/app/enums/auth", 3), "auth3");
//! assert_eq!(imports.bind_package("example.com/app/models/auth", 7), "auth");
//! assert_eq!(imports.len(), 2);
//! ```

use crate::naming::package_base;
use crate::schema::{Field, Message, Service, TypeRef, TypeRegistry};
use protoforge_core::cli::GenerationMode;
use serde::Serialize;

/// One import line of a generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Import {
    /// Package alias (host) or imported type name (SDK)
    pub alias: String,
    /// Package import path (host) or relative module path (SDK)
    pub path: String,
}

/// Imports of one generated file, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImportSet {
    entries: Vec<Import>,
}

impl ImportSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias already bound to `path`.
    #[must_use]
    pub fn alias_of(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|i| i.path == path)
            .map(|i| i.alias.as_str())
    }

    /// Returns `true` if `alias` is taken.
    #[must_use]
    pub fn is_bound(&self, alias: &str) -> bool {
        self.entries.iter().any(|i| i.alias == alias)
    }

    /// Binds `alias` to `path` unless the alias is taken.
    ///
    /// Returns `false` when nothing was added.
    pub fn insert(&mut self, alias: impl Into<String>, path: impl Into<String>) -> bool {
        let alias = alias.into();
        if self.is_bound(&alias) {
            return false;
        }
        self.entries.push(Import {
            alias,
            path: path.into(),
        });
        true
    }

    /// Returns the alias for a host package, binding a new one if needed.
    ///
    /// A package keeps the alias it was first given. A new package whose
    /// base name is taken becomes `base{index}`, incremented further while
    /// that is taken too.
    pub fn bind_package(&mut self, path: &str, index: usize) -> String {
        if let Some(alias) = self.alias_of(path) {
            return alias.to_string();
        }
        let base = go_identifier(package_base(path));
        let mut alias = base.clone();
        let mut suffix = index;
        while self.is_bound(&alias) {
            alias = format!("{base}{suffix}");
            suffix += 1;
        }
        tracing::debug!("Bound alias {alias} to {path}");
        self.insert(alias.clone(), path);
        alias
    }

    /// Iterates over the imports in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Import> {
        self.entries.iter()
    }

    /// Number of imports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no imports.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ImportSet {
    type Item = &'a Import;
    type IntoIter = std::slice::Iter<'a, Import>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Resolves the imports of a message file.
///
/// Own fields are visited first, then relations; the positional index used
/// for collision suffixes runs across both.
#[must_use]
pub fn resolve_message(
    message: &Message,
    registry: &TypeRegistry,
    mode: GenerationMode,
) -> (Message, ImportSet) {
    let mut resolved = message.clone();
    let mut imports = ImportSet::new();
    let Message {
        fields, relations, ..
    } = &mut resolved;
    for (index, field) in fields.iter_mut().chain(relations.iter_mut()).enumerate() {
        match mode {
            GenerationMode::Host => {
                resolve_host_field(field, index, &message.import_path, registry, &mut imports);
            }
            GenerationMode::Sdk => {
                resolve_sdk_field(field, &message.file_path, registry, &mut imports);
            }
        }
    }
    (resolved, imports)
}

/// Where a service is rendered: its own file or the controller generated
/// for an `@controller` service.
#[derive(Debug, Clone)]
pub struct ServiceTarget<'a> {
    /// Import path of the package being generated
    pub import_path: &'a str,
    /// Output path of the file being generated
    pub file_path: &'a str,
    /// Imports bound before any method is visited
    pub preset: ImportSet,
}

impl<'a> ServiceTarget<'a> {
    /// The service's own file.
    #[must_use]
    pub fn own(service: &'a Service) -> Self {
        Self {
            import_path: &service.import_path,
            file_path: &service.file_path,
            preset: ImportSet::new(),
        }
    }

    /// The controller generated for a `Service` marked `@controller`, with
    /// `svc` bound to the service package.
    ///
    /// Returns `None` when the service has no such controller.
    #[must_use]
    pub fn controller(service: &'a Service) -> Option<Self> {
        let file_path = service.controller_file_path.as_deref()?;
        let mut preset = ImportSet::new();
        preset.insert("svc", service.import_path.clone());
        Some(Self {
            import_path: &service.controller_import_path,
            file_path,
            preset,
        })
    }
}

/// Resolves the imports of a service file.
///
/// One alias table covers the whole file; for each method the input type
/// is visited before the output type, both with the method's index.
#[must_use]
pub fn resolve_service(
    service: &Service,
    target: ServiceTarget<'_>,
    mode: GenerationMode,
) -> (Service, ImportSet) {
    let mut resolved = service.clone();
    let mut imports = target.preset;
    for (index, method) in resolved.methods.iter_mut().enumerate() {
        for type_ref in [&mut method.input, &mut method.output] {
            match mode {
                GenerationMode::Host => {
                    resolve_host_ref(type_ref, index, target.import_path, &mut imports);
                }
                GenerationMode::Sdk => resolve_sdk_ref(type_ref, target.file_path, &mut imports),
            }
        }
    }
    (resolved, imports)
}

fn resolve_host_field(
    field: &mut Field,
    index: usize,
    own_package: &str,
    registry: &TypeRegistry,
    imports: &mut ImportSet,
) {
    if let Some(go_type) = &field.go_type {
        field.display_type.clone_from(go_type);
        field.target_type.clone_from(go_type);
        return;
    }
    field.display_type = host_display(&field.type_name, index, own_package, registry, imports);
    let is_message = registry.get(&field.type_name).is_some_and(|e| e.is_message());
    let element = if field.pointer || field.is_relation || (is_message && field.repeated) {
        format!("*{}", field.display_type)
    } else {
        field.display_type.clone()
    };
    field.target_type = match &field.key_type {
        Some(key) => format!("map[{}]{element}", go_scalar(key).unwrap_or(key)),
        None if field.repeated => format!("[]{element}"),
        None => element,
    };
}

fn host_display(
    type_name: &str,
    index: usize,
    own_package: &str,
    registry: &TypeRegistry,
    imports: &mut ImportSet,
) -> String {
    let Some(entry) = registry.get(type_name) else {
        return go_scalar(type_name).unwrap_or(type_name).to_string();
    };
    if entry.import_path == own_package {
        return entry.name.clone();
    }
    let alias = imports.bind_package(&entry.import_path, index);
    format!("{alias}.{}", entry.name)
}

fn resolve_host_ref(
    type_ref: &mut TypeRef,
    index: usize,
    own_package: &str,
    imports: &mut ImportSet,
) {
    type_ref.display = match type_ref.import_path.as_deref() {
        None => type_ref.name.clone(),
        Some(path) if path == own_package => type_ref.name.clone(),
        Some(path) => {
            let alias = imports.bind_package(path, index);
            format!("{alias}.{}", type_ref.name)
        }
    };
}

fn resolve_sdk_field(
    field: &mut Field,
    own_file: &str,
    registry: &TypeRegistry,
    imports: &mut ImportSet,
) {
    let element = match registry.get(&field.type_name) {
        Some(entry) => {
            if entry.file_path != own_file {
                imports.insert(entry.name.clone(), relative_module(own_file, &entry.file_path));
            }
            entry.name.clone()
        }
        None => ts_scalar(&field.type_name)
            .unwrap_or(&field.type_name)
            .to_string(),
    };
    field.display_type.clone_from(&element);
    field.target_type = match &field.key_type {
        Some(key) => format!("Record<{}, {element}>", ts_scalar(key).unwrap_or(key)),
        None if field.repeated => format!("{element}[]"),
        None => element,
    };
}

fn resolve_sdk_ref(type_ref: &mut TypeRef, own_file: &str, imports: &mut ImportSet) {
    if let Some(file_path) = type_ref.file_path.as_deref()
        && file_path != own_file
    {
        imports.insert(type_ref.name.clone(), relative_module(own_file, file_path));
    }
    type_ref.display = type_ref.name.clone();
}

/// Module path of `target` relative to the directory of `from`, with the
/// extension stripped.
///
/// # Examples
///
/// ```
/// use protoforge_codegen::imports::relative_module;
///
/// assert_eq!(
///     relative_module("controllers/auth/Auth_gen.go", "requests/auth/Login_gen.go"),
///     "../../requests/auth/Login_gen"
/// );
/// assert_eq!(relative_module("models/User_gen.go", "models/Post_gen.go"), "./Post_gen");
/// ```
#[must_use]
pub fn relative_module(from: &str, target: &str) -> String {
    let target = target.rsplit_once('.').map_or(target, |(stem, _)| stem);
    let from_dir: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let from_dir = &from_dir[..from_dir.len().saturating_sub(1)];
    let target_parts: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();

    let common = from_dir
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from_dir.len() - common;
    let rest = target_parts[common..].join("/");
    if ups == 0 {
        format!("./{rest}")
    } else {
        format!("{}{rest}", "../".repeat(ups))
    }
}

/// Go type of a protobuf scalar.
#[must_use]
pub fn go_scalar(type_name: &str) -> Option<&'static str> {
    Some(match type_name {
        "double" => "float64",
        "float" => "float32",
        "int32" | "sint32" | "sfixed32" => "int32",
        "int64" | "sint64" | "sfixed64" => "int64",
        "uint32" | "fixed32" => "uint32",
        "uint64" | "fixed64" => "uint64",
        "bool" => "bool",
        "string" => "string",
        "bytes" => "[]byte",
        _ => return None,
    })
}

/// TypeScript type of a protobuf scalar.
#[must_use]
pub fn ts_scalar(type_name: &str) -> Option<&'static str> {
    Some(match type_name {
        "double" | "float" | "int32" | "sint32" | "sfixed32" | "uint32" | "fixed32" | "int64"
        | "sint64" | "sfixed64" | "uint64" | "fixed64" => "number",
        "bool" => "boolean",
        "string" => "string",
        "bytes" => "Uint8Array",
        _ => return None,
    })
}

fn go_identifier(name: &str) -> String {
    let name = name.split('.').next().unwrap_or(name);
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() || cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("pkg{cleaned}")
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_package_keeps_alias() {
        let mut imports = ImportSet::new();
        assert_eq!(imports.bind_package("app/models/auth", 0), "auth");
        assert_eq!(imports.bind_package("app/models/auth", 4), "auth");
        assert_eq!(imports.len(), 1);
    }

    #[test]
    fn test_collision_suffix_skips_taken_aliases() {
        let mut imports = ImportSet::new();
        imports.insert("auth", "app/a/auth");
        imports.insert("auth2", "app/b/auth");
        assert_eq!(imports.bind_package("app/c/auth", 2), "auth3");
    }

    #[test]
    fn test_preset_alias_is_respected() {
        let mut imports = ImportSet::new();
        assert!(imports.insert("svc", "app/services/auth"));
        assert!(!imports.insert("svc", "app/other"));
        assert_eq!(imports.alias_of("app/services/auth"), Some("svc"));
        assert_eq!(imports.bind_package("app/services/auth", 0), "svc");
    }

    #[test]
    fn test_go_identifier() {
        assert_eq!(go_identifier("go-redis"), "go_redis");
        assert_eq!(go_identifier("yaml.v3"), "yaml");
        assert_eq!(go_identifier("2fa"), "pkg2fa");
    }

    #[test]
    fn test_relative_module() {
        assert_eq!(
            relative_module("models/Post_gen.go", "models/auth/User_gen.go"),
            "./auth/User_gen"
        );
        assert_eq!(
            relative_module("results/Login_gen.go", "models/User_gen.go"),
            "../models/User_gen"
        );
    }

    #[test]
    fn test_scalars() {
        assert_eq!(go_scalar("fixed32"), Some("uint32"));
        assert_eq!(go_scalar("bytes"), Some("[]byte"));
        assert_eq!(ts_scalar("int64"), Some("number"));
        assert_eq!(ts_scalar("UserModel"), None);
    }
}
