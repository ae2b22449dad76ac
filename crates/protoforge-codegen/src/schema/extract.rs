//! Message extraction and recursive import loading.

use super::{
    Field, Message, MessageKind, ProtoSchema, SchemaContext, Timestamps, TypeEntry, TypeKind,
};
use crate::directive::{Directive, DirectiveBlock, as_line_comments};
use crate::naming::{
    join_path, package_base, table_name, to_pascal_case, trim_suffixes,
};
use protoforge_core::{Error, Result};
use protoforge_idl::{Comments, MessageElement, ParseError, ProtoFile};
use std::path::{Path, PathBuf};
use std::rc::Rc;

const DEFAULT_SOFT_DELETE: &str = "deleted_at";
const DEFAULT_CREATED_AT: &str = "created_at";
const DEFAULT_UPDATED_AT: &str = "updated_at";

impl SchemaContext {
    /// Extracts one IDL file and, first, every file it imports.
    ///
    /// `dir` is the package directory used for output paths unless the file
    /// declares `option go_package`. Imported files inherit the importer's
    /// effective directory. Results are memoized by canonical path, so a file
    /// imported from several places is extracted once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read,
    /// [`Error::IdlParse`] on a syntax error, and [`Error::CircularImport`]
    /// when the file is reachable from one of its own imports.
    pub fn extract_file(
        &mut self,
        path: impl AsRef<Path>,
        dir: &str,
    ) -> Result<Rc<ProtoSchema>> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path).map_err(|e| Error::io(path, e))?;

        if let Some(schema) = self.schemas.get(&canonical) {
            return Ok(Rc::clone(schema));
        }
        if let Some(pos) = self.stack.iter().position(|p| p == &canonical) {
            let mut chain = self.stack[pos..].to_vec();
            chain.push(canonical);
            return Err(Error::CircularImport { chain });
        }

        let file = protoforge_idl::parse_file(&canonical).map_err(|e| match e {
            ParseError::Io { path, source } => Error::Io { path, source },
            other => Error::IdlParse {
                path: canonical.clone(),
                message: other.to_string(),
            },
        })?;

        let dir = effective_dir(&file, dir);
        tracing::debug!("Extracting {} (dir '{dir}')", canonical.display());

        self.stack.push(canonical.clone());
        let references = self.load_imports(&file, &canonical, &dir);
        self.stack.pop();
        let references = references?;

        self.register_types(&file, &dir);

        let mut schema = ProtoSchema {
            path: canonical.clone(),
            dir: dir.clone(),
            references,
            ..ProtoSchema::default()
        };
        for message in flatten_messages(&file) {
            let extracted = self.build_message(message, &dir);
            match extracted.kind {
                MessageKind::Model => schema.models.push(extracted),
                MessageKind::Data => schema.data.push(extracted),
                MessageKind::Request => schema.requests.push(extracted),
                MessageKind::Result => schema.results.push(extracted),
            }
        }
        let (services, controllers) = self.build_services(&file, &dir);
        schema.services = services;
        schema.controllers = controllers;
        schema.enums = self.build_enums(&file, &dir);

        let schema = Rc::new(schema);
        self.schemas.insert(canonical.clone(), Rc::clone(&schema));
        self.order.push(canonical);
        Ok(schema)
    }

    fn load_imports(
        &mut self,
        file: &ProtoFile,
        importer: &Path,
        dir: &str,
    ) -> Result<Vec<Rc<ProtoSchema>>> {
        let mut references = Vec::new();
        for import in file.imports() {
            let Some(target) = self.locate_import(&import.path, importer) else {
                tracing::warn!(
                    "Import \"{}\" in {} not found; its types are treated as opaque",
                    import.path,
                    importer.display()
                );
                continue;
            };
            references.push(self.extract_file(&target, dir)?);
        }
        Ok(references)
    }

    fn locate_import(&self, import: &str, importer: &Path) -> Option<PathBuf> {
        let from_working_dir = self.working_dir.join(import);
        if from_working_dir.is_file() {
            return Some(from_working_dir);
        }
        importer
            .parent()
            .map(|parent| parent.join(import))
            .filter(|p| p.is_file())
    }

    /// Registers every message and enum of `file` before any field is built,
    /// so declarations may reference types declared later in the same file.
    fn register_types(&mut self, file: &ProtoFile, dir: &str) {
        for message in flatten_messages(file) {
            let kind = MessageKind::classify(&message.name);
            let raw_name = raw_message_name(&message.name, kind);
            let paths = OutputPaths::new(&self.base_package, kind.role_dir(), dir, &raw_name);
            self.registry.insert(TypeEntry {
                name: message.name.clone(),
                kind: TypeKind::Message(kind),
                display_name: format!("{}.{}", paths.package, message.name),
                import_path: paths.import_path,
                file_path: paths.file_path,
            });
        }
        for decl in flatten_enums(file) {
            let paths =
                OutputPaths::new(&self.base_package, "enums", dir, raw_enum_name(&decl.name));
            self.registry.insert(TypeEntry {
                name: decl.name.clone(),
                kind: TypeKind::Enum,
                display_name: format!("{}.{}", paths.package, decl.name),
                import_path: paths.import_path,
                file_path: paths.file_path,
            });
        }
    }

    fn build_message(&self, message: &protoforge_idl::Message, dir: &str) -> Message {
        let kind = MessageKind::classify(&message.name);
        let raw_name = raw_message_name(&message.name, kind);
        let paths = OutputPaths::new(&self.base_package, kind.role_dir(), dir, &raw_name);
        let block = DirectiveBlock::from_comments(&message.comments);
        let is_model = kind == MessageKind::Model;

        let mut soft_delete = None;
        let mut authenticatable = false;
        let mut timestamps = None;
        let mut table = None;
        for directive in block.directives() {
            match directive {
                Directive::Table(name) => table = Some(name),
                Directive::SoftDelete(column) => {
                    soft_delete =
                        Some(column.unwrap_or_else(|| DEFAULT_SOFT_DELETE.to_string()));
                }
                Directive::Authenticatable => authenticatable = true,
                Directive::Timestamps(_) => {
                    timestamps = Some(Timestamps {
                        created: block.indexed_value("timestamps", 0, DEFAULT_CREATED_AT),
                        updated: block.indexed_value("timestamps", 1, DEFAULT_UPDATED_AT),
                    });
                }
                _ => {}
            }
        }

        let mut declared: Vec<FieldDraft<'_>> = Vec::new();
        for element in &message.elements {
            let ordinal = declared.len();
            match element {
                MessageElement::Field(field) => declared.push(FieldDraft {
                    name: field.name.clone(),
                    type_name: field.type_name.clone(),
                    key_type: None,
                    repeated: field.is_repeated(),
                    json_option: json_name_option(&field.options),
                    comments: &field.comments,
                    ordinal,
                }),
                MessageElement::Map(map) => declared.push(FieldDraft {
                    name: map.name.clone(),
                    type_name: map.value_type.clone(),
                    key_type: Some(map.key_type.clone()),
                    repeated: false,
                    json_option: json_name_option(&map.options),
                    comments: &map.comments,
                    ordinal,
                }),
                _ => {}
            }
        }

        let primary_key = primary_key(&message.name, &declared);
        let mut fields = Vec::new();
        let mut relations = Vec::new();
        for draft in &declared {
            let field = self.build_field(draft, is_model, &primary_key, timestamps.as_ref());
            if field.is_relation {
                relations.push(field);
            } else {
                fields.push(field);
            }
        }

        Message {
            name: message.name.clone(),
            kind,
            is_model,
            fields,
            relations,
            table_name: table.unwrap_or_else(|| table_name(&raw_name)),
            primary_key,
            soft_delete,
            authenticatable,
            timestamps,
            display_name: format!("{}.{}", paths.package, message.name),
            import_path: paths.import_path,
            package: paths.package,
            file_path: paths.file_path,
            template: kind.template().to_string(),
            comments: as_line_comments(block.doc_lines()),
            raw_name,
        }
    }

    fn build_field(
        &self,
        draft: &FieldDraft<'_>,
        is_model: bool,
        primary_key: &str,
        timestamps: Option<&Timestamps>,
    ) -> Field {
        let block = DirectiveBlock::from_comments(draft.comments);
        let mut tags = None;
        let mut pointer = false;
        let mut go_type = None;
        let mut carbon = false;
        let mut relation = None;
        for directive in block.directives() {
            match directive {
                Directive::GoTag(tag) => tags = Some(tag),
                Directive::Pointer => pointer = true,
                Directive::GoType(ty) => go_type = Some(ty),
                Directive::Carbon => carbon = true,
                Directive::Relation(kind) => relation = Some(kind),
                _ => {}
            }
        }

        let relation = relation.filter(|kind| {
            let eligible = is_model && draft.type_name.ends_with("Model");
            if !eligible {
                tracing::debug!(
                    "@{kind:?} on '{}' ignored: only Model fields of a Model type are relations",
                    draft.name
                );
            }
            eligible
        });
        let is_relation = relation.is_some();
        let json_name = draft
            .json_option
            .clone()
            .unwrap_or_else(|| draft.name.clone());
        let primary = draft.name == primary_key;

        let struct_tag = if is_relation {
            relation_tag(tags.as_deref(), &json_name)
        } else {
            let db_type = self.db_type(draft, carbon, timestamps);
            column_tag(&ColumnTag {
                tags: tags.as_deref(),
                json_name: &json_name,
                db_type: &db_type,
                primary,
                with_db: is_model,
                timestamps,
            })
        };

        Field {
            camel_name: to_pascal_case(&draft.name),
            name: draft.name.clone(),
            type_name: draft.type_name.clone(),
            key_type: draft.key_type.clone(),
            json_name,
            repeated: draft.repeated,
            pointer,
            is_relation,
            relation,
            tags,
            go_type,
            primary,
            carbon,
            comments: as_line_comments(block.doc_lines()),
            ordinal: draft.ordinal,
            display_type: draft.type_name.clone(),
            target_type: draft.type_name.clone(),
            struct_tag,
        }
    }

    /// Storage column type of a field.
    fn db_type(
        &self,
        draft: &FieldDraft<'_>,
        carbon: bool,
        timestamps: Option<&Timestamps>,
    ) -> String {
        if draft.key_type.is_some() || draft.repeated {
            return "json".to_string();
        }
        if let Some(entry) = self.registry.get(&draft.type_name) {
            return match entry.kind {
                TypeKind::Message(_) => "json",
                TypeKind::Enum => "INT",
            }
            .to_string();
        }
        let is_timestamp_column =
            timestamps.is_some_and(|ts| draft.name == ts.created || draft.name == ts.updated);
        if carbon || is_timestamp_column {
            return "timestamp".to_string();
        }
        sql_type(&draft.type_name).unwrap_or("varchar(255)").to_string()
    }
}

/// One declared field or map field before directives are applied.
#[derive(Debug)]
struct FieldDraft<'a> {
    name: String,
    type_name: String,
    key_type: Option<String>,
    repeated: bool,
    json_option: Option<String>,
    comments: &'a Comments,
    ordinal: usize,
}

/// Import path, package and output file of one declaration.
#[derive(Debug)]
pub(super) struct OutputPaths {
    pub(super) import_path: String,
    pub(super) package: String,
    pub(super) file_path: String,
}

impl OutputPaths {
    pub(super) fn new(base: &str, role_dir: &str, dir: &str, raw_name: &str) -> Self {
        let import_path = join_path(&[base, role_dir, dir]);
        let package = package_base(&join_path(&[role_dir, dir])).to_string();
        let file_path = join_path(&[role_dir, dir, &format!("{raw_name}_gen.go")]);
        Self {
            import_path,
            package,
            file_path,
        }
    }
}

/// Resolves the primary key: the first `@pk` field, else the first
/// declared field.
fn primary_key(message: &str, declared: &[FieldDraft<'_>]) -> String {
    let mut marked = declared
        .iter()
        .filter(|d| DirectiveBlock::from_comments(d.comments).has("pk"));
    if let Some(first) = marked.next() {
        for ignored in marked {
            tracing::warn!(
                "{message}: @pk on '{}' ignored, '{}' is already the primary key",
                ignored.name,
                first.name
            );
        }
        return first.name.clone();
    }
    declared
        .first()
        .map_or_else(|| "id".to_string(), |d| d.name.clone())
}

pub(super) fn raw_enum_name(name: &str) -> &str {
    let raw = trim_suffixes(name, &["Enum"]);
    if raw.is_empty() { name } else { raw }
}

fn raw_message_name(name: &str, kind: MessageKind) -> String {
    let raw = trim_suffixes(name, kind.suffixes());
    if raw.is_empty() { name } else { raw }.to_string()
}

/// Directory from `option go_package`, else the inherited one.
///
/// A `path;name` value keeps only the path part.
fn effective_dir(file: &ProtoFile, inherited: &str) -> String {
    file.option("go_package")
        .and_then(protoforge_idl::Constant::as_str)
        .map(|value| value.split(';').next().unwrap_or(value))
        .map(|value| join_path(&[value]))
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| join_path(&[inherited]))
}

fn json_name_option(options: &[protoforge_idl::OptionDecl]) -> Option<String> {
    options
        .iter()
        .find(|o| o.name == "json_name")
        .and_then(|o| o.value.as_str())
        .map(str::to_string)
}

/// Top-level messages followed by their nested messages, depth first.
fn flatten_messages(file: &ProtoFile) -> Vec<&protoforge_idl::Message> {
    fn walk<'a>(
        message: &'a protoforge_idl::Message,
        out: &mut Vec<&'a protoforge_idl::Message>,
    ) {
        out.push(message);
        for nested in message.nested_messages() {
            walk(nested, out);
        }
    }
    let mut out = Vec::new();
    for message in file.messages() {
        walk(message, &mut out);
    }
    out
}

/// Top-level enums followed by enums nested in messages.
pub(super) fn flatten_enums(file: &ProtoFile) -> Vec<&protoforge_idl::Enum> {
    let mut out: Vec<&protoforge_idl::Enum> = file.enums().collect();
    for message in flatten_messages(file) {
        for element in &message.elements {
            if let MessageElement::Enum(decl) = element {
                out.push(decl);
            }
        }
    }
    out
}

fn sql_type(scalar: &str) -> Option<&'static str> {
    Some(match scalar {
        "double" => "DOUBLE",
        "float" => "FLOAT",
        "int32" | "sint32" | "fixed32" | "sfixed32" => "INT",
        "int64" | "sint64" | "fixed64" | "sfixed64" => "BIGINT",
        "uint32" => "INT UNSIGNED",
        "uint64" => "BIGINT UNSIGNED",
        "bool" => "BOOLEAN",
        "string" => "VARCHAR(255)",
        "bytes" => "BLOB",
        _ => return None,
    })
}

struct ColumnTag<'a> {
    tags: Option<&'a str>,
    json_name: &'a str,
    db_type: &'a str,
    primary: bool,
    with_db: bool,
    timestamps: Option<&'a Timestamps>,
}

/// Struct tag of a column field.
///
/// A `@gotag` value comes first; `json` and `db` keys are only added when
/// it does not already carry them.
fn column_tag(column: &ColumnTag<'_>) -> String {
    let raw = column.tags.unwrap_or_default();
    let mut parts = Vec::new();
    if !raw.is_empty() {
        parts.push(raw.to_string());
    }
    if !raw.contains("json:") {
        parts.push(format!("json:\"{}\"", column.json_name));
    }
    if column.with_db && !raw.contains("db:") {
        let name = column.json_name;
        let db = match column.timestamps {
            Some(ts) if name == ts.created => {
                format!("db:\"{name};type:timestamp;default CURRENT_TIMESTAMP;\"")
            }
            Some(ts) if name == ts.updated => format!(
                "db:\"{name};type:timestamp;DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP;\""
            ),
            _ => format!(
                "db:\"{name};type:{};not null;{}\"",
                column.db_type,
                if column.primary { "primary key" } else { "" }
            ),
        };
        parts.push(db);
    }
    parts.join(" ")
}

fn relation_tag(tags: Option<&str>, json_name: &str) -> String {
    match tags {
        Some(raw) if raw.contains("json:") => raw.to_string(),
        Some(raw) if !raw.is_empty() => format!("{raw} json:\"{json_name}\""),
        _ => format!("json:\"{json_name}\""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamps() -> Timestamps {
        Timestamps {
            created: "created_at".to_string(),
            updated: "updated_at".to_string(),
        }
    }

    #[test]
    fn test_column_tag_primary_key() {
        let tag = column_tag(&ColumnTag {
            tags: None,
            json_name: "id",
            db_type: "BIGINT",
            primary: true,
            with_db: true,
            timestamps: None,
        });
        assert_eq!(tag, r#"json:"id" db:"id;type:BIGINT;not null;primary key""#);
    }

    #[test]
    fn test_column_tag_respects_gotag() {
        let tag = column_tag(&ColumnTag {
            tags: Some(r#"json:"-" db:"secret""#),
            json_name: "password",
            db_type: "VARCHAR(255)",
            primary: false,
            with_db: true,
            timestamps: None,
        });
        assert_eq!(tag, r#"json:"-" db:"secret""#);
    }

    #[test]
    fn test_column_tag_timestamps() {
        let ts = timestamps();
        let created = column_tag(&ColumnTag {
            tags: None,
            json_name: "created_at",
            db_type: "timestamp",
            primary: false,
            with_db: true,
            timestamps: Some(&ts),
        });
        assert_eq!(
            created,
            r#"json:"created_at" db:"created_at;type:timestamp;default CURRENT_TIMESTAMP;""#
        );
        let plain = column_tag(&ColumnTag {
            tags: None,
            json_name: "name",
            db_type: "VARCHAR(255)",
            primary: false,
            with_db: true,
            timestamps: Some(&ts),
        });
        assert_eq!(plain, r#"json:"name" db:"name;type:VARCHAR(255);not null;""#);
    }

    #[test]
    fn test_non_model_tag_is_json_only() {
        let tag = column_tag(&ColumnTag {
            tags: None,
            json_name: "page",
            db_type: "INT",
            primary: false,
            with_db: false,
            timestamps: None,
        });
        assert_eq!(tag, r#"json:"page""#);
    }

    #[test]
    fn test_relation_tag() {
        assert_eq!(relation_tag(None, "author"), r#"json:"author""#);
        assert_eq!(
            relation_tag(Some(r#"gorm:"foreignKey:AuthorId""#), "author"),
            r#"gorm:"foreignKey:AuthorId" json:"author""#
        );
    }

    #[test]
    fn test_sql_type_mapping() {
        assert_eq!(sql_type("uint64"), Some("BIGINT UNSIGNED"));
        assert_eq!(sql_type("sfixed32"), Some("INT"));
        assert_eq!(sql_type("UserModel"), None);
    }

    #[test]
    fn test_effective_dir() {
        let file = protoforge_idl::parse_str(
            "syntax = \"proto3\";\noption go_package = \"./auth/v1;authv1\";",
        )
        .unwrap();
        assert_eq!(effective_dir(&file, "ignored"), "auth/v1");
        let plain = protoforge_idl::parse_str("syntax = \"proto3\";").unwrap();
        assert_eq!(effective_dir(&plain, "./shop"), "shop");
    }

    #[test]
    fn test_raw_message_name() {
        assert_eq!(raw_message_name("UserModel", MessageKind::Model), "User");
        assert_eq!(raw_message_name("Model", MessageKind::Model), "Model");
        assert_eq!(raw_message_name("LoginRequest", MessageKind::Request), "Login");
    }

    #[test]
    fn test_output_file_keeps_raw_name() {
        let paths = OutputPaths::new("example.com/app", "models", "shop", "OrderItem");
        assert_eq!(paths.file_path, "models/shop/OrderItem_gen.go");
        assert_eq!(paths.import_path, "example.com/app/models/shop");
        assert_eq!(paths.package, "shop");
    }
}
