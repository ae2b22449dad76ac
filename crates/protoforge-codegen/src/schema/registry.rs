//! Per-run type registry and extraction context.

use super::{MessageKind, ProtoSchema};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

/// What a registered name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A message of the given role
    Message(MessageKind),
    /// An enum
    Enum,
}

/// Registry entry for one declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    /// Declared name
    pub name: String,
    /// Kind of declaration
    pub kind: TypeKind,
    /// Package import path
    pub import_path: String,
    /// Qualified name, e.g. `auth.UserModel`
    pub display_name: String,
    /// Output path relative to the output root
    pub file_path: String,
}

impl TypeEntry {
    /// Returns `true` for message entries.
    #[must_use]
    pub const fn is_message(&self) -> bool {
        matches!(self.kind, TypeKind::Message(_))
    }
}

/// Mapping from declared type name to its entry.
///
/// Later declarations of the same name replace earlier ones; a warning is
/// logged because references become ambiguous.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<String, TypeEntry>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type.
    pub fn insert(&mut self, entry: TypeEntry) {
        if let Some(previous) = self.entries.get(&entry.name)
            && previous.import_path != entry.import_path
        {
            tracing::warn!(
                "Type {} declared in both {} and {}; using the latter",
                entry.name,
                previous.import_path,
                entry.import_path
            );
        }
        self.entries.insert(entry.name.clone(), entry);
    }

    /// Looks up a type by declared name.
    ///
    /// Fully qualified names (`pkg.v1.User`) fall back to their last
    /// segment.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeEntry> {
        self.entries.get(name).or_else(|| {
            name.rsplit_once('.')
                .and_then(|(_, short)| self.entries.get(short))
        })
    }

    /// Returns `true` if the name resolves.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State shared by one generation run.
///
/// Owns the type registry and the memoized schemas; nothing here is global,
/// so independent runs never observe each other.
#[derive(Debug)]
pub struct SchemaContext {
    /// Registry of every type extracted so far
    pub registry: TypeRegistry,
    pub(super) base_package: String,
    pub(super) working_dir: PathBuf,
    pub(super) schemas: HashMap<PathBuf, Rc<ProtoSchema>>,
    pub(super) order: Vec<PathBuf>,
    pub(super) stack: Vec<PathBuf>,
}

impl SchemaContext {
    /// Creates a context.
    ///
    /// `base_package` prefixes every import path; `working_dir` is the first
    /// directory searched for imported files.
    #[must_use]
    pub fn new(base_package: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry: TypeRegistry::new(),
            base_package: base_package.into(),
            working_dir: working_dir.into(),
            schemas: HashMap::new(),
            order: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Base package used for import paths.
    #[must_use]
    pub fn base_package(&self) -> &str {
        &self.base_package
    }

    /// Extracted schemas, imported files before their importers.
    pub fn schemas(&self) -> impl Iterator<Item = &Rc<ProtoSchema>> {
        self.order.iter().filter_map(|p| self.schemas.get(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, import_path: &str) -> TypeEntry {
        TypeEntry {
            name: name.to_string(),
            kind: TypeKind::Message(MessageKind::Model),
            import_path: import_path.to_string(),
            display_name: format!("{}.{name}", crate::naming::package_base(import_path)),
            file_path: "models/User_gen.go".to_string(),
        }
    }

    #[test]
    fn test_lookup_by_short_and_qualified_name() {
        let mut registry = TypeRegistry::new();
        registry.insert(entry("UserModel", "app/models"));
        assert!(registry.contains("UserModel"));
        assert!(registry.contains("auth.v1.UserModel"));
        assert!(!registry.contains("PostModel"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_later_declaration_wins() {
        let mut registry = TypeRegistry::new();
        registry.insert(entry("UserModel", "app/models/a"));
        registry.insert(entry("UserModel", "app/models/b"));
        assert_eq!(
            registry.get("UserModel").unwrap().import_path,
            "app/models/b"
        );
    }

    #[test]
    fn test_contexts_are_independent() {
        let mut first = SchemaContext::new("app", ".");
        first.registry.insert(entry("UserModel", "app/models"));
        let second = SchemaContext::new("app", ".");
        assert!(second.registry.is_empty());
        assert_eq!(first.base_package(), "app");
    }
}
