//! Model scaffolding from an existing table.
//!
//! Columns come from a [`ColumnSource`]; when the table cannot be described
//! (or has no columns) a default `id` / `created_at` / `updated_at` schema is
//! used instead of failing.
//!
//! # Examples
//!
//! ```
//! use protoforge_codegen::scaffold::{ColumnInfo, ColumnSource, scaffold_model};
//! use protoforge_core::Result;
//!
//! struct Fixed;
//!
//! impl ColumnSource for Fixed {
//!     fn describe(&self, _table: &str) -> Result<Vec<ColumnInfo>> {
//!         Ok(vec![
//!             ColumnInfo::new("id", "bigint(20) unsigned").with_key("PRI"),
//!             ColumnInfo::new("name", "varchar(255)"),
//!         ])
//!     }
//! }
//!
//! let file = scaffold_model("User", None, "app/models", &Fixed).unwrap();
//! assert_eq!(file.path, "app/models/User.go");
//! assert!(file.content.contains("Id int64 `json:\"id\"`"));
//! assert!(file.content.contains("SetPrimaryKey(\"id\")"));
//! ```

use crate::emitter::RenderedFile;
use crate::naming::{join_path, package_base, table_name, to_pascal_case};
use crate::template_engine::TemplateEngine;
use protoforge_core::Result;
use serde::{Deserialize, Serialize};

const SCAFFOLD_TEMPLATE: &str = include_str!("../templates/go/scaffold.hbs");
const PRIMARY_KEY: &str = "PRI";

/// One row of a table description.
///
/// Deserializes from both `snake_case` keys and the capitalised keys a
/// `DESCRIBE` result uses (`Field`, `Type`, `Null`, `Key`, `Default`,
/// `Extra`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    #[serde(alias = "Field")]
    pub field: String,
    /// SQL type, e.g. `bigint(20) unsigned`
    #[serde(rename = "type", alias = "Type")]
    pub sql_type: String,
    /// `YES` or `NO`
    #[serde(rename = "null", alias = "Null", default)]
    pub nullable: String,
    /// Key role, `PRI` for the primary key
    #[serde(alias = "Key", default)]
    pub key: String,
    /// Column default
    #[serde(alias = "Default", default)]
    pub default: Option<String>,
    /// Extra attributes such as `auto_increment`
    #[serde(alias = "Extra", default)]
    pub extra: String,
}

impl ColumnInfo {
    /// Creates a nullable column without key role.
    #[must_use]
    pub fn new(field: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            sql_type: sql_type.into(),
            nullable: "YES".to_string(),
            key: String::new(),
            default: None,
            extra: String::new(),
        }
    }

    /// Sets the key role.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Returns `true` for the primary-key column.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.key.eq_ignore_ascii_case(PRIMARY_KEY)
    }
}

/// Describes the columns of a table.
pub trait ColumnSource {
    /// Returns the columns of `table` in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be described.
    fn describe(&self, table: &str) -> Result<Vec<ColumnInfo>>;
}

/// Columns used when a table cannot be described.
#[must_use]
pub fn default_columns() -> Vec<ColumnInfo> {
    vec![
        ColumnInfo {
            nullable: "NO".to_string(),
            extra: "auto_increment".to_string(),
            ..ColumnInfo::new("id", "bigint").with_key(PRIMARY_KEY)
        },
        ColumnInfo::new("created_at", "timestamp"),
        ColumnInfo::new("updated_at", "timestamp"),
    ]
}

/// Go type of a SQL column type.
///
/// Length and attributes are ignored: `bigint(20) unsigned` maps like
/// `bigint`.
///
/// # Examples
///
/// ```
/// use protoforge_codegen::scaffold::go_type_for_sql;
///
/// assert_eq!(go_type_for_sql("bigint(20) unsigned"), "int64");
/// assert_eq!(go_type_for_sql("VARCHAR(64)"), "string");
/// assert_eq!(go_type_for_sql("datetime"), "time.Time");
/// assert_eq!(go_type_for_sql("geometry"), "any");
/// ```
#[must_use]
pub fn go_type_for_sql(sql_type: &str) -> &'static str {
    let lowered = sql_type.trim().to_ascii_lowercase();
    let base = lowered
        .split(['(', ' '])
        .next()
        .unwrap_or_default();
    match base {
        "int" | "bigint" => "int64",
        "float" | "double" => "float64",
        "varchar" | "char" | "text" | "json" => "string",
        "binary" => "[]byte",
        "date" | "datetime" | "timestamp" => "time.Time",
        "boolean" => "bool",
        other if ["varchar", "nvarchar", "text"].iter().any(|p| other.starts_with(p)) => "string",
        _ => "any",
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ScaffoldColumn<'a> {
    camel_name: String,
    go_type: &'static str,
    field: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ScaffoldContext<'a> {
    package: &'a str,
    name: &'a str,
    table: &'a str,
    primary_key: &'a str,
    uses_time: bool,
    columns: Vec<ScaffoldColumn<'a>>,
}

/// Renders a model for `name` from the columns of its table.
///
/// `table` defaults to the pluralised `snake_case` name; the file is
/// `<path>/<name>.go` in the package named after the last `path` segment.
///
/// # Errors
///
/// Returns a template error only; a failing [`ColumnSource`] is logged and
/// replaced by [`default_columns`].
pub fn scaffold_model(
    name: &str,
    table: Option<&str>,
    path: &str,
    source: &dyn ColumnSource,
) -> Result<RenderedFile> {
    let table = table.map_or_else(|| table_name(name), str::to_string);
    let columns = match source.describe(&table) {
        Ok(columns) if !columns.is_empty() => columns,
        Ok(_) => {
            tracing::warn!("Table {table} has no columns; using the default schema");
            default_columns()
        }
        Err(err) => {
            tracing::warn!("Could not describe table {table}: {err}; using the default schema");
            default_columns()
        }
    };

    let primary_key = columns
        .iter()
        .find(|c| c.is_primary())
        .or_else(|| columns.first())
        .map_or("id", |c| c.field.as_str());
    let rendered: Vec<ScaffoldColumn<'_>> = columns
        .iter()
        .map(|c| ScaffoldColumn {
            camel_name: to_pascal_case(&c.field),
            go_type: go_type_for_sql(&c.sql_type),
            field: &c.field,
        })
        .collect();
    let path = join_path(&[path]);
    let package = match package_base(&path) {
        "" => "models",
        base => base,
    };
    let context = ScaffoldContext {
        package,
        name,
        table: &table,
        primary_key,
        uses_time: rendered.iter().any(|c| c.go_type == "time.Time"),
        columns: rendered,
    };

    let mut engine = TemplateEngine::empty();
    engine.register_template_string("scaffold", SCAFFOLD_TEMPLATE)?;
    let content = engine.render("scaffold", &context)?;
    Ok(RenderedFile {
        path: join_path(&[&path, &format!("{name}.go")]),
        template: "scaffold".to_string(),
        content,
    })
}
