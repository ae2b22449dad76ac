//! Syntax tree for `.proto` files.
//!
//! The tree keeps declaration order and every comment attached to a
//! declaration, because directive comments drive code generation.

use std::path::PathBuf;

/// A block of comment lines attached to a declaration.
///
/// Each entry is the comment text with the `//` or `/* */` markers removed.
/// Leading whitespace after the marker is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    /// Comment lines in source order
    pub lines: Vec<String>,
    /// 1-based line of the first comment line
    pub line: usize,
}

impl Comment {
    /// Returns `true` if the comment has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Comments attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    /// Block directly above the declaration
    pub leading: Option<Comment>,
    /// Comment on the same line after the declaration
    pub trailing: Option<Comment>,
}

impl Comments {
    /// Iterates over all lines: leading block first, then the trailing
    /// comment.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.leading
            .iter()
            .chain(self.trailing.iter())
            .flat_map(|c| c.lines.iter().map(String::as_str))
    }

    /// Returns `true` if there are no comment lines at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines().next().is_none()
    }
}

/// A parsed `.proto` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtoFile {
    /// Source path, if parsed from disk
    pub path: Option<PathBuf>,
    /// Top-level declarations in source order
    pub elements: Vec<Element>,
}

impl ProtoFile {
    /// Returns the `syntax` (or `edition`) value, if declared.
    #[must_use]
    pub fn syntax(&self) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            Element::Syntax(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Returns the declared package, if any.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            Element::Package(p) => Some(p.as_str()),
            _ => None,
        })
    }

    /// Returns the value of a file-level option.
    ///
    /// # Examples
    ///
    /// ```
    /// let file = protoforge_idl::parse_str(
    ///     "syntax = \"proto3\";\noption go_package = \"auth\";",
    /// )
    /// .unwrap();
    /// assert_eq!(file.option("go_package").and_then(|v| v.as_str()), Some("auth"));
    /// ```
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&Constant> {
        self.elements.iter().find_map(|e| match e {
            Element::Option(o) if o.name == name => Some(&o.value),
            _ => None,
        })
    }

    /// Iterates over import declarations.
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.elements.iter().filter_map(|e| match e {
            Element::Import(i) => Some(i),
            _ => None,
        })
    }

    /// Iterates over top-level messages.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.elements.iter().filter_map(|e| match e {
            Element::Message(m) => Some(m),
            _ => None,
        })
    }

    /// Iterates over top-level enums.
    pub fn enums(&self) -> impl Iterator<Item = &Enum> {
        self.elements.iter().filter_map(|e| match e {
            Element::Enum(en) => Some(en),
            _ => None,
        })
    }

    /// Iterates over services.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.elements.iter().filter_map(|e| match e {
            Element::Service(s) => Some(s),
            _ => None,
        })
    }
}

/// Top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// `syntax = "proto3";` or `edition = "2023";`
    Syntax(String),
    /// `package a.b.c;`
    Package(String),
    /// `option name = value;`
    Option(OptionDecl),
    /// `import "other.proto";`
    Import(Import),
    /// `message Name { ... }`
    Message(Message),
    /// `enum Name { ... }`
    Enum(Enum),
    /// `service Name { ... }`
    Service(Service),
}

/// Option constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// String literal (adjacent literals are concatenated)
    Str(String),
    /// Integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
    /// `true` or `false`
    Bool(bool),
    /// Bare identifier, e.g. an enum value
    Ident(String),
    /// Text-format aggregate `{ ... }`, kept verbatim
    Aggregate(String),
}

impl Constant {
    /// Returns the value as a string for string and identifier constants.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Ident(s) => Some(s),
            _ => None,
        }
    }
}

/// `option` statement or a bracketed field option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDecl {
    /// Option name, with parentheses for custom options: `(my.opt).field`
    pub name: String,
    /// Option value
    pub value: Constant,
    /// 1-based source line
    pub line: usize,
}

/// Import modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportKind {
    /// Plain import
    #[default]
    Default,
    /// `import public`
    Public,
    /// `import weak`
    Weak,
}

/// `import` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported file name as written
    pub path: String,
    /// Modifier
    pub kind: ImportKind,
    /// 1-based source line
    pub line: usize,
}

/// Field cardinality label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Label {
    /// No label (proto3 singular)
    #[default]
    None,
    /// `optional`
    Optional,
    /// `required` (proto2)
    Required,
    /// `repeated`
    Repeated,
}

/// Message field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Type name as written, leading dot stripped
    pub type_name: String,
    /// Field number
    pub number: i64,
    /// Cardinality label
    pub label: Label,
    /// Bracketed field options
    pub options: Vec<OptionDecl>,
    /// Attached comments
    pub comments: Comments,
    /// Name of the enclosing `oneof`, if any
    pub oneof: Option<String>,
    /// 1-based source line
    pub line: usize,
}

impl Field {
    /// Returns `true` for `repeated` fields.
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }
}

/// `map<K, V>` field.
#[derive(Debug, Clone, PartialEq)]
pub struct MapField {
    /// Field name
    pub name: String,
    /// Key type
    pub key_type: String,
    /// Value type
    pub value_type: String,
    /// Field number
    pub number: i64,
    /// Bracketed field options
    pub options: Vec<OptionDecl>,
    /// Attached comments
    pub comments: Comments,
    /// 1-based source line
    pub line: usize,
}

/// Reserved ranges and names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reserved {
    /// Inclusive ranges; `max` is stored as `i64::MAX`
    pub ranges: Vec<(i64, i64)>,
    /// Reserved field names
    pub names: Vec<String>,
}

/// Declaration inside a message body.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageElement {
    /// Regular field (fields of a `oneof` are flattened here)
    Field(Field),
    /// Map field
    Map(MapField),
    /// Nested message
    Message(Message),
    /// Nested enum
    Enum(Enum),
    /// `option` statement
    Option(OptionDecl),
    /// `reserved` statement
    Reserved(Reserved),
}

/// `message` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Message name
    pub name: String,
    /// Body declarations in source order
    pub elements: Vec<MessageElement>,
    /// Attached comments
    pub comments: Comments,
    /// 1-based source line
    pub line: usize,
}

impl Message {
    /// Iterates over regular fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.elements.iter().filter_map(|e| match e {
            MessageElement::Field(f) => Some(f),
            _ => None,
        })
    }

    /// Iterates over nested messages.
    pub fn nested_messages(&self) -> impl Iterator<Item = &Self> {
        self.elements.iter().filter_map(|e| match e {
            MessageElement::Message(m) => Some(m),
            _ => None,
        })
    }
}

/// Enum value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// Value name
    pub name: String,
    /// Integer literal
    pub number: i64,
    /// Bracketed value options
    pub options: Vec<OptionDecl>,
    /// Attached comments
    pub comments: Comments,
    /// 1-based source line
    pub line: usize,
}

/// `enum` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    /// Enum name
    pub name: String,
    /// Values in declaration order
    pub values: Vec<EnumValue>,
    /// `option` statements
    pub options: Vec<OptionDecl>,
    /// Reserved ranges and names
    pub reserved: Vec<Reserved>,
    /// Attached comments
    pub comments: Comments,
    /// 1-based source line
    pub line: usize,
}

/// `rpc` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Rpc {
    /// Method name
    pub name: String,
    /// Request message type
    pub request_type: String,
    /// `stream` on the request
    pub request_stream: bool,
    /// Response message type
    pub returns_type: String,
    /// `stream` on the response
    pub returns_stream: bool,
    /// Options from the optional `{ ... }` body
    pub options: Vec<OptionDecl>,
    /// Attached comments
    pub comments: Comments,
    /// 1-based source line
    pub line: usize,
}

/// `service` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// Service name
    pub name: String,
    /// Methods in declaration order
    pub rpcs: Vec<Rpc>,
    /// `option` statements
    pub options: Vec<OptionDecl>,
    /// Attached comments
    pub comments: Comments,
    /// 1-based source line
    pub line: usize,
}
