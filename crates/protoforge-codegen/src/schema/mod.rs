//! Internal representation of extracted IDL files.
//!
//! All node types serialize with `PascalCase` keys because they are handed
//! to templates unchanged (`{{Name}}`, `{{#each Fields}}`, ...).

mod enums;
mod extract;
mod registry;
mod services;

pub use registry::{SchemaContext, TypeEntry, TypeKind, TypeRegistry};

use crate::directive::RelationKind;
use serde::Serialize;
use std::path::PathBuf;
use std::rc::Rc;

/// Message role, derived from the name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessageKind {
    /// `...Model`: persisted entity
    Model,
    /// `...Req` / `...Request`
    Request,
    /// `...Result`
    Result,
    /// Anything else
    Data,
}

impl MessageKind {
    /// Classifies a message by its name suffix.
    ///
    /// # Examples
    ///
    /// ```
    /// use protoforge_codegen::schema::MessageKind;
    ///
    /// assert_eq!(MessageKind::classify("UserModel"), MessageKind::Model);
    /// assert_eq!(MessageKind::classify("LoginReq"), MessageKind::Request);
    /// assert_eq!(MessageKind::classify("LoginResult"), MessageKind::Result);
    /// assert_eq!(MessageKind::classify("Pagination"), MessageKind::Data);
    /// ```
    #[must_use]
    pub fn classify(name: &str) -> Self {
        if name.ends_with("Model") {
            Self::Model
        } else if name.ends_with("Req") || name.ends_with("Request") {
            Self::Request
        } else if name.ends_with("Result") {
            Self::Result
        } else {
            Self::Data
        }
    }

    /// Output directory for this role. Data messages share `models`.
    #[must_use]
    pub const fn role_dir(self) -> &'static str {
        match self {
            Self::Model | Self::Data => "models",
            Self::Request => "requests",
            Self::Result => "results",
        }
    }

    /// Template rendering this role.
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Request => "request",
            Self::Result => "result",
            Self::Data => "data",
        }
    }

    /// Suffixes stripped to form the raw name.
    #[must_use]
    pub const fn suffixes(self) -> &'static [&'static str] {
        match self {
            Self::Model => &["Model"],
            Self::Request => &["Request", "Req"],
            Self::Result => &["Result"],
            Self::Data => &[],
        }
    }
}

/// Column names for `@timestamps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timestamps {
    /// Creation column, default `created_at`
    pub created: String,
    /// Update column, default `updated_at`
    pub updated: String,
}

/// One message field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Field {
    /// Declared name
    pub name: String,
    /// `PascalCase` identifier for the host language
    pub camel_name: String,
    /// Declared type name (map value type for map fields)
    pub type_name: String,
    /// Map key type, for `map<K, V>` fields
    pub key_type: Option<String>,
    /// JSON key (declared name or `json_name` option)
    pub json_name: String,
    /// `repeated` label
    pub repeated: bool,
    /// `@ptr`
    pub pointer: bool,
    /// Relation to another Model
    pub is_relation: bool,
    /// Relation kind, when `is_relation`
    pub relation: Option<RelationKind>,
    /// Raw struct tag from `@gotag`
    pub tags: Option<String>,
    /// Verbatim host type from `@goType`
    pub go_type: Option<String>,
    /// Primary-key column of its message
    pub primary: bool,
    /// `@carbon` timestamp column
    pub carbon: bool,
    /// Documentation comment lines, `//`-prefixed
    pub comments: Vec<String>,
    /// Declaration index among the message's fields
    pub ordinal: usize,
    /// Type as referenced from the output file, e.g. `auth.UserModel`
    pub display_type: String,
    /// Fully rendered target type, e.g. `[]*auth.UserModel` or `UserModel[]`
    pub target_type: String,
    /// Complete struct tag for host output
    pub struct_tag: String,
}

/// Extracted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    /// Declared name
    pub name: String,
    /// Name with the role suffix stripped
    pub raw_name: String,
    /// Role
    pub kind: MessageKind,
    /// `true` for Model messages
    pub is_model: bool,
    /// Column fields in declaration order
    pub fields: Vec<Field>,
    /// Relation fields (Model only)
    pub relations: Vec<Field>,
    /// Storage table
    pub table_name: String,
    /// Primary-key field name
    pub primary_key: String,
    /// Soft-delete column from `@softDelete`
    pub soft_delete: Option<String>,
    /// `@authenticatable`
    pub authenticatable: bool,
    /// `@timestamps` columns
    pub timestamps: Option<Timestamps>,
    /// Package import path, e.g. `example.com/app/models/auth`
    pub import_path: String,
    /// Package name (last import path segment)
    pub package: String,
    /// Qualified name, e.g. `auth.UserModel`
    pub display_name: String,
    /// Output path relative to the output root
    pub file_path: String,
    /// Template name
    pub template: String,
    /// Documentation comment lines, `//`-prefixed
    pub comments: Vec<String>,
}

/// Reference from a method to a request or response type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypeRef {
    /// Declared type name
    pub name: String,
    /// Import path of the declaring package; `None` when unresolved
    pub import_path: Option<String>,
    /// Output path of the declaring file; `None` when unresolved
    pub file_path: Option<String>,
    /// Type as referenced from the output file
    pub display: String,
    /// `stream` modifier
    pub stream: bool,
}

impl TypeRef {
    fn resolve(name: &str, stream: bool, registry: &TypeRegistry) -> Self {
        registry.get(name).map_or_else(
            || {
                tracing::debug!("Type {name} is not declared in any extracted file");
                Self {
                    name: name.to_string(),
                    import_path: None,
                    file_path: None,
                    display: name.to_string(),
                    stream,
                }
            },
            |entry| Self {
                name: entry.name.clone(),
                import_path: Some(entry.import_path.clone()),
                file_path: Some(entry.file_path.clone()),
                display: entry.display_name.clone(),
                stream,
            },
        )
    }
}

/// RPC method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Method {
    /// Method name
    pub name: String,
    /// Request type
    pub input: TypeRef,
    /// Response type
    pub output: TypeRef,
    /// HTTP verbs, default `["Post"]`
    pub http_methods: Vec<String>,
    /// Route, default `/<Name>`
    pub path: String,
    /// Method middlewares in order
    pub middlewares: Vec<String>,
    /// Documentation comment lines, `//`-prefixed
    pub comments: Vec<String>,
}

/// Which group a service belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServiceGroup {
    /// `...Service`
    Services,
    /// `...Controller`
    Controllers,
}

impl ServiceGroup {
    /// Output directory of the group.
    #[must_use]
    pub const fn dir(self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Controllers => "controllers",
        }
    }

    /// Name suffix of the group.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Services => "Service",
            Self::Controllers => "Controller",
        }
    }

    /// Template rendering the group.
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Services => "service",
            Self::Controllers => "controller",
        }
    }
}

/// Extracted service or controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Service {
    /// Declared name
    pub name: String,
    /// Name with the group suffix stripped
    pub raw_name: String,
    /// Group by name suffix
    pub group: ServiceGroup,
    /// Methods in declaration order
    pub methods: Vec<Method>,
    /// Exposed over HTTP (`Controller` suffix or `@controller`)
    pub is_controller: bool,
    /// Route prefix from `@controller:<prefix>`
    pub prefix: String,
    /// Service-wide middlewares
    pub middlewares: Vec<String>,
    /// Package import path
    pub import_path: String,
    /// Package name
    pub package_name: String,
    /// Qualified name, e.g. `auth.AuthService`
    pub display_name: String,
    /// Output path relative to the output root
    pub file_path: String,
    /// Controller output path for `@controller` services
    pub controller_file_path: Option<String>,
    /// Import path of the package holding the HTTP controller
    pub controller_import_path: String,
    /// Template name
    pub template: String,
    /// Documentation comment lines, `//`-prefixed
    pub comments: Vec<String>,
}

impl Service {
    /// Router registration call, qualified with the controller package name.
    ///
    /// # Examples
    ///
    /// A service `AuthService` whose controller lives in package `auth`
    /// yields `auth.AuthServiceRouter(router)`.
    #[must_use]
    pub fn router_call(&self, router_param: &str) -> String {
        format!(
            "{}.{}Router({router_param})",
            crate::naming::package_base(&self.controller_import_path),
            self.name
        )
    }
}

/// Enum value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnumValue {
    /// Value name
    pub name: String,
    /// Integer literal
    pub value: i64,
    /// Display message from `@msg`, default the value name
    pub message: String,
    /// Documentation comment lines
    pub comments: Vec<String>,
}

/// Extracted enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Enum {
    /// Declared name
    pub name: String,
    /// Name with `Enum` stripped
    pub raw_name: String,
    /// Package name: `enums` or the last directory segment
    pub package: String,
    /// Package import path
    pub import_path: String,
    /// Output path relative to the output root
    pub file_path: String,
    /// Documentation comment lines
    pub comments: Vec<String>,
    /// Values in declaration order
    pub values: Vec<EnumValue>,
}

/// Everything extracted from one IDL file.
#[derive(Debug, Clone, Default)]
pub struct ProtoSchema {
    /// Canonical path of the source file
    pub path: PathBuf,
    /// Effective package directory (`go_package` or inherited)
    pub dir: String,
    /// Model messages
    pub models: Vec<Message>,
    /// Plain data messages
    pub data: Vec<Message>,
    /// Request messages
    pub requests: Vec<Message>,
    /// Result messages
    pub results: Vec<Message>,
    /// `...Service` services
    pub services: Vec<Service>,
    /// `...Controller` services
    pub controllers: Vec<Service>,
    /// Enums
    pub enums: Vec<Enum>,
    /// Schemas of imported files
    pub references: Vec<Rc<ProtoSchema>>,
}

impl ProtoSchema {
    /// Iterates over all messages: models, data, requests, results.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.models
            .iter()
            .chain(&self.data)
            .chain(&self.requests)
            .chain(&self.results)
    }

    /// Iterates over services and controllers.
    pub fn all_services(&self) -> impl Iterator<Item = &Service> {
        self.services.iter().chain(&self.controllers)
    }
}
