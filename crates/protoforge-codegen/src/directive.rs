//! Directive comments.
//!
//! A directive is a comment line of the form `@key` or `@key:value`. Keys
//! are matched exactly but case-insensitively, so `@goTag` and `@gotag` are
//! the same directive. Every other comment line is documentation.
//!
//! # Examples
//!
//! ```
//! use protoforge_codegen::directive::{Directive, DirectiveBlock};
//!
//! let block = DirectiveBlock::from_lines([" @method:Get,Post", " @middleware:auth", " Logs in"]);
//! assert_eq!(block.value("method"), Some("Get,Post"));
//! assert_eq!(block.values("middleware"), vec!["auth"]);
//! assert_eq!(block.doc_lines(), vec![" Logs in"]);
//!
//! assert_eq!(
//!     Directive::parse(" @path:/login"),
//!     Directive::Path("/login".to_string())
//! );
//! ```

use protoforge_idl::Comments;

/// Relation kinds declared on Model fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum RelationKind {
    /// `@belongsTo`
    BelongsTo,
    /// `@hasOne`
    HasOne,
    /// `@hasMany`
    HasMany,
}

/// A comment line parsed once into its typed meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `@gotag:<tag>` raw struct tag
    GoTag(String),
    /// `@pk`
    PrimaryKey,
    /// `@ptr`
    Pointer,
    /// `@goType:<type>` verbatim host type
    GoType(String),
    /// `@carbon` timestamp column
    Carbon,
    /// `@belongsTo`, `@hasOne`, `@hasMany`
    Relation(RelationKind),
    /// `@table:<name>`
    Table(String),
    /// `@softDelete[:<column>]`
    SoftDelete(Option<String>),
    /// `@authenticatable`
    Authenticatable,
    /// `@timestamps[:<created>,<updated>]`
    Timestamps(Option<String>),
    /// `@method:<CSV>`
    Method(Vec<String>),
    /// `@path:<route>`
    Path(String),
    /// `@middleware:<name>`
    Middleware(String),
    /// `@controller[:<prefix>]`
    Controller(Option<String>),
    /// `@msg:<text>` enum value message
    Msg(String),
    /// Any other `@key[:value]`
    Unknown {
        /// Key without the `@`
        key: String,
        /// Value after the colon, if any
        value: Option<String>,
    },
    /// Plain documentation line, kept verbatim
    Doc(String),
}

/// Splits `@key[:value]` into key and optional non-empty value.
fn split_directive(line: &str) -> Option<(&str, Option<&str>)> {
    let rest = line.trim_start().strip_prefix('@')?;
    let (key, value) = match rest.split_once(':') {
        Some((key, value)) => (key.trim(), Some(value.trim())),
        None => (rest.trim(), None),
    };
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, value.filter(|v| !v.is_empty())))
}

impl Directive {
    /// Parses a single comment line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let Some((key, value)) = split_directive(line) else {
            return Self::Doc(line.to_string());
        };
        let owned = value.map(str::to_string);
        match key.to_ascii_lowercase().as_str() {
            "gotag" => Self::GoTag(owned.unwrap_or_default()),
            "pk" => Self::PrimaryKey,
            "ptr" => Self::Pointer,
            "gotype" => owned.map_or_else(
                || Self::Unknown {
                    key: key.to_string(),
                    value: None,
                },
                Self::GoType,
            ),
            "carbon" => Self::Carbon,
            "belongsto" => Self::Relation(RelationKind::BelongsTo),
            "hasone" => Self::Relation(RelationKind::HasOne),
            "hasmany" => Self::Relation(RelationKind::HasMany),
            "table" => owned.map_or_else(
                || Self::Unknown {
                    key: key.to_string(),
                    value: None,
                },
                Self::Table,
            ),
            "softdelete" => Self::SoftDelete(owned),
            "authenticatable" => Self::Authenticatable,
            "timestamps" => Self::Timestamps(owned),
            "method" => Self::Method(
                owned
                    .as_deref()
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            "path" => owned.map_or_else(
                || Self::Unknown {
                    key: key.to_string(),
                    value: None,
                },
                Self::Path,
            ),
            "middleware" => owned.map_or_else(
                || Self::Unknown {
                    key: key.to_string(),
                    value: None,
                },
                Self::Middleware,
            ),
            "controller" => Self::Controller(owned),
            "msg" => Self::Msg(owned.unwrap_or_default()),
            _ => Self::Unknown {
                key: key.to_string(),
                value: owned,
            },
        }
    }

    /// Returns `true` for documentation lines.
    #[must_use]
    pub const fn is_doc(&self) -> bool {
        matches!(self, Self::Doc(_))
    }
}

/// The comment block attached to one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveBlock {
    lines: Vec<String>,
}

impl DirectiveBlock {
    /// Builds a block from raw comment lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a block from a declaration's leading and trailing comments.
    #[must_use]
    pub fn from_comments(comments: &Comments) -> Self {
        Self::from_lines(comments.lines())
    }

    fn entries<'a, 'k>(
        &'a self,
        key: &'k str,
    ) -> impl Iterator<Item = Option<&'a str>> + use<'a, 'k> {
        self.lines.iter().filter_map(move |line| {
            split_directive(line)
                .filter(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    /// Returns `true` if `@key` is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.entries(key).next().is_some()
    }

    /// Returns the value of the first `@key:value`.
    ///
    /// A bare `@key` or an empty value yields `None`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries(key).next().flatten()
    }

    /// Returns the value of the first `@key`, or `default` when absent or
    /// empty.
    #[must_use]
    pub fn value_or(&self, key: &str, default: &str) -> String {
        self.value(key).unwrap_or(default).to_string()
    }

    /// Returns every non-empty value of a repeatable directive, in order.
    #[must_use]
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.entries(key).flatten().collect()
    }

    /// Returns the `index`-th comma-separated part of the first `@key`
    /// value, or `default`.
    ///
    /// # Examples
    ///
    /// ```
    /// use protoforge_codegen::directive::DirectiveBlock;
    ///
    /// let block = DirectiveBlock::from_lines(["@timestamps:created,modified"]);
    /// assert_eq!(block.indexed_value("timestamps", 1, "updated_at"), "modified");
    /// assert_eq!(block.indexed_value("timestamps", 2, "x"), "x");
    /// ```
    #[must_use]
    pub fn indexed_value(&self, key: &str, index: usize, default: &str) -> String {
        self.value(key)
            .and_then(|v| v.split(',').map(str::trim).nth(index))
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
            .to_string()
    }

    /// Parses every line into a [`Directive`].
    #[must_use]
    pub fn directives(&self) -> Vec<Directive> {
        self.lines.iter().map(|l| Directive::parse(l)).collect()
    }

    /// Returns the lines that are not directives.
    #[must_use]
    pub fn doc_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| split_directive(l).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Returns `true` if the block has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Formats documentation lines as `//` comments for host templates.
pub(crate) fn as_line_comments<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    lines.into_iter().map(|l| format!("//{l}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_directives() {
        assert_eq!(Directive::parse("@pk"), Directive::PrimaryKey);
        assert_eq!(Directive::parse(" @ptr "), Directive::Pointer);
        assert_eq!(
            Directive::parse("@goTag:gorm:\"index\""),
            Directive::GoTag("gorm:\"index\"".to_string())
        );
        assert_eq!(
            Directive::parse("@gotype:any"),
            Directive::GoType("any".to_string())
        );
        assert_eq!(
            Directive::parse("@hasMany"),
            Directive::Relation(RelationKind::HasMany)
        );
        assert_eq!(Directive::parse("@softDelete"), Directive::SoftDelete(None));
        assert_eq!(
            Directive::parse("@controller:/v1"),
            Directive::Controller(Some("/v1".to_string()))
        );
        assert_eq!(
            Directive::parse("@method: Get , Put"),
            Directive::Method(vec!["Get".to_string(), "Put".to_string()])
        );
    }

    #[test]
    fn test_exact_key_matching() {
        assert!(matches!(
            Directive::parse("@pkey"),
            Directive::Unknown { ref key, .. } if key == "pkey"
        ));
        let block = DirectiveBlock::from_lines(["@pkey"]);
        assert!(!block.has("pk"));
    }

    #[test]
    fn test_doc_lines() {
        assert!(Directive::parse(" plain words").is_doc());
        assert!(Directive::parse(" email@example.com").is_doc());
        assert!(Directive::parse("@ not a key").is_doc());
    }

    #[test]
    fn test_empty_value_falls_back() {
        let block = DirectiveBlock::from_lines(["@table:", "@path"]);
        assert!(block.has("table"));
        assert_eq!(block.value("table"), None);
        assert_eq!(block.value_or("path", "/Index"), "/Index");
        assert!(matches!(
            Directive::parse("@table:"),
            Directive::Unknown { value: None, .. }
        ));
    }

    #[test]
    fn test_repeated_values_keep_order() {
        let block = DirectiveBlock::from_lines(["@middleware:auth", "doc", "@middleware:throttle"]);
        assert_eq!(block.values("middleware"), vec!["auth", "throttle"]);
        assert_eq!(block.directives().len(), 3);
    }

    #[test]
    fn test_values_outlive_lookup_key() {
        let block = DirectiveBlock::from_lines(["@table:accounts", "@middleware:auth"]);
        let table = {
            let key = String::from("TABLE");
            block.value(&key)
        };
        let middlewares = {
            let key = format!("{}ware", "middle");
            block.values(&key)
        };
        assert_eq!(table, Some("accounts"));
        assert_eq!(middlewares, vec!["auth"]);
    }

    #[test]
    fn test_line_comments() {
        assert_eq!(as_line_comments([" a", "b"]), vec!["// a", "//b"]);
    }
}
