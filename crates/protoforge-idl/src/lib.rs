//! Comment-preserving parser for Protocol Buffers IDL files.
//!
//! Code generation in protoforge is steered by `@key[:value]` directives in
//! comments, so unlike a wire-level protobuf compiler this parser keeps every
//! comment block attached to the declaration it documents.
//!
//! Supported: `syntax`/`edition`, `package`, `option`, `import`
//! (`public`/`weak`), `message` (labels, `map<K, V>`, `oneof`, nested
//! declarations, `reserved`, field options), `enum`, and `service`/`rpc`
//! (including `stream` and option bodies). `extend` blocks are skipped and
//! proto2 groups are rejected.
//!
//! # Examples
//!
//! ```
//! let file = protoforge_idl::parse_str(
//!     r#"
//!     syntax = "proto3";
//!
//!     // @table:users
//!     message UserModel {
//!       int64 id = 1; // @pk
//!       string name = 2;
//!     }
//!     "#,
//! )
//! .unwrap();
//!
//! let user = file.messages().next().unwrap();
//! assert_eq!(user.name, "UserModel");
//! assert_eq!(user.comments.lines().collect::<Vec<_>>(), vec![" @table:users"]);
//! let id = user.fields().next().unwrap();
//! assert_eq!(id.comments.lines().collect::<Vec<_>>(), vec![" @pk"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{
    Comment, Comments, Constant, Element, Enum, EnumValue, Field, Import, ImportKind, Label,
    MapField, Message, MessageElement, OptionDecl, ProtoFile, Reserved, Rpc, Service,
};
pub use error::{ParseError, Result};

use std::path::Path;

/// Parses `.proto` source text.
///
/// # Errors
///
/// Returns [`ParseError`] with the offending line if the text is not valid
/// IDL.
pub fn parse_str(source: &str) -> Result<ProtoFile> {
    let tokens = lexer::tokenize(source)?;
    parser::parse(tokens)
}

/// Reads and parses a `.proto` file.
///
/// The returned [`ProtoFile::path`] is set to `path`.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if the file cannot be read, or a syntax error
/// otherwise.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ProtoFile> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut file = parse_str(&source)?;
    file.path = Some(path.to_path_buf());
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
syntax = "proto3";

package auth.v1;

option go_package = "auth";

import "models/user.proto";
import public "common.proto";

// UserModel stores accounts.
// @table:accounts
// @softDelete
message UserModel {
  // @pk
  int64 id = 1;
  string name = 2 [json_name = "userName", deprecated = true];
  repeated string tags = 3;
  optional string nickname = 4;
  map<string, int64> scores = 5;

  oneof contact {
    string email = 6;
    string phone = 7; // @ptr
  }

  reserved 8, 10 to 12, 100 to max;
  reserved "legacy";

  message Nested {
    bool ok = 1;
  }

  // @belongsTo
  .auth.v1.ProfileModel profile = 9;
}

enum StatusEnum {
  option allow_alias = true;
  // @msg:Active user
  ACTIVE = 0;
  BANNED = 1; // @msg:Banned
  NEGATIVE = -2;
}

// @controller:/auth
// @middleware:auth
service AuthService {
  // @method:Get,Post
  rpc Login (LoginReq) returns (LoginResult);
  rpc Watch (stream WatchReq) returns (stream WatchResult) {
    option deprecated = true;
  }
}
"#;

    fn sample() -> ProtoFile {
        parse_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_header_declarations() {
        let file = sample();
        assert_eq!(file.syntax(), Some("proto3"));
        assert_eq!(file.package(), Some("auth.v1"));
        assert_eq!(
            file.option("go_package"),
            Some(&Constant::Str("auth".to_string()))
        );
        let imports: Vec<_> = file.imports().collect();
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].path, "models/user.proto");
        assert_eq!(imports[1].kind, ImportKind::Public);
    }

    #[test]
    fn test_message_comment_block() {
        let file = sample();
        let user = file.messages().next().unwrap();
        let lines: Vec<_> = user.comments.lines().collect();
        assert_eq!(
            lines,
            vec![" UserModel stores accounts.", " @table:accounts", " @softDelete"]
        );
    }

    #[test]
    fn test_fields_in_declaration_order() {
        let file = sample();
        let user = file.messages().next().unwrap();
        let names: Vec<_> = user.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "name", "tags", "nickname", "email", "phone", "profile"]
        );

        let fields: Vec<_> = user.fields().collect();
        assert_eq!(fields[0].comments.lines().collect::<Vec<_>>(), vec![" @pk"]);
        assert_eq!(fields[1].options.len(), 2);
        assert!(fields[2].is_repeated());
        assert_eq!(fields[3].label, Label::Optional);
        assert_eq!(fields[5].oneof.as_deref(), Some("contact"));
        assert_eq!(
            fields[5].comments.trailing.as_ref().unwrap().lines,
            vec![" @ptr"]
        );
        assert_eq!(fields[6].type_name, "auth.v1.ProfileModel");
    }

    #[test]
    fn test_map_reserved_and_nested() {
        let file = sample();
        let user = file.messages().next().unwrap();
        let map = user
            .elements
            .iter()
            .find_map(|e| match e {
                MessageElement::Map(m) => Some(m),
                _ => None,
            })
            .unwrap();
        assert_eq!(map.key_type, "string");
        assert_eq!(map.value_type, "int64");

        let reserved: Vec<_> = user
            .elements
            .iter()
            .filter_map(|e| match e {
                MessageElement::Reserved(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(reserved[0].ranges, vec![(8, 8), (10, 12), (100, i64::MAX)]);
        assert_eq!(reserved[1].names, vec!["legacy"]);

        assert_eq!(user.nested_messages().next().unwrap().name, "Nested");
    }

    #[test]
    fn test_enum_values() {
        let file = sample();
        let status = file.enums().next().unwrap();
        assert_eq!(status.options.len(), 1);
        let values: Vec<_> = status.values.iter().map(|v| (v.name.as_str(), v.number)).collect();
        assert_eq!(values, vec![("ACTIVE", 0), ("BANNED", 1), ("NEGATIVE", -2)]);
        assert_eq!(
            status.values[0].comments.lines().collect::<Vec<_>>(),
            vec![" @msg:Active user"]
        );
        assert_eq!(
            status.values[1].comments.lines().collect::<Vec<_>>(),
            vec![" @msg:Banned"]
        );
    }

    #[test]
    fn test_service_rpcs() {
        let file = sample();
        let service = file.services().next().unwrap();
        assert_eq!(service.name, "AuthService");
        assert_eq!(
            service.comments.lines().collect::<Vec<_>>(),
            vec![" @controller:/auth", " @middleware:auth"]
        );
        assert_eq!(service.rpcs.len(), 2);
        assert_eq!(service.rpcs[0].request_type, "LoginReq");
        assert_eq!(service.rpcs[0].returns_type, "LoginResult");
        assert_eq!(
            service.rpcs[0].comments.lines().collect::<Vec<_>>(),
            vec![" @method:Get,Post"]
        );
        assert!(service.rpcs[1].request_stream);
        assert!(service.rpcs[1].returns_stream);
        assert_eq!(service.rpcs[1].options.len(), 1);
    }

    #[test]
    fn test_comments_after_closing_brace() {
        let source = "message PostReq { int32 a = 1; }\n\
                      // @controller:/post\n\
                      // @middleware:auth\n\
                      service PostService { rpc Get(PostReq) returns (PostReq); }\n\n\
                      // @msg:kinds\n\
                      enum Kind { A = 0; }\n";
        let file = parse_str(source).unwrap();
        let service = file.services().next().unwrap();
        assert_eq!(
            service.comments.lines().collect::<Vec<_>>(),
            vec![" @controller:/post", " @middleware:auth"]
        );
        let kind = file.enums().next().unwrap();
        assert_eq!(kind.comments.lines().collect::<Vec<_>>(), vec![" @msg:kinds"]);
    }

    #[test]
    fn test_field_comment_after_nested_message() {
        let source = "// @softDelete\nmessage PostModel {\n  message Meta { string k = 1; }\n  \
                      // @pk\n  int64 post_id = 2;\n}\n";
        let file = parse_str(source).unwrap();
        let post = file.messages().next().unwrap();
        assert_eq!(post.comments.lines().collect::<Vec<_>>(), vec![" @softDelete"]);
        let post_id = post.fields().next().unwrap();
        assert_eq!(post_id.name, "post_id");
        assert_eq!(post_id.comments.lines().collect::<Vec<_>>(), vec![" @pk"]);
    }

    #[test]
    fn test_rpc_comment_after_bodyless_rpc() {
        let source = "service S {\n  rpc A(X) returns (Y);\n  // @path:/b\n  rpc B(X) returns (Y);\n}\n";
        let file = parse_str(source).unwrap();
        let service = file.services().next().unwrap();
        assert!(service.rpcs[0].comments.is_empty());
        assert_eq!(
            service.rpcs[1].comments.lines().collect::<Vec<_>>(),
            vec![" @path:/b"]
        );
    }

    #[test]
    fn test_detached_comment_is_dropped() {
        let file = parse_str("// licence text\n\nmessage A {}\n").unwrap();
        assert!(file.messages().next().unwrap().comments.is_empty());
    }

    #[test]
    fn test_block_comment_lines() {
        let file = parse_str("/**\n * @table:people\n * Person row\n */\nmessage PersonModel {}\n")
            .unwrap();
        let person = file.messages().next().unwrap();
        assert_eq!(
            person.comments.lines().collect::<Vec<_>>(),
            vec![" @table:people", " Person row"]
        );
    }

    #[test]
    fn test_brace_line_comment_is_trailing() {
        let file = parse_str("message UserModel { // @authenticatable\n  int64 id = 1;\n}\n").unwrap();
        let user = file.messages().next().unwrap();
        assert_eq!(
            user.comments.trailing.as_ref().unwrap().lines,
            vec![" @authenticatable"]
        );
        assert!(user.fields().next().unwrap().comments.is_empty());
    }

    #[test]
    fn test_aggregate_option() {
        let file = parse_str("option (my.opt) = { a: 1 b: \"x\" };").unwrap();
        assert!(matches!(
            file.option("(my.opt)"),
            Some(Constant::Aggregate(text)) if text.contains('a')
        ));
    }

    #[test]
    fn test_error_reports_line() {
        let err = parse_str("syntax = \"proto3\";\nmessage A {\n  int64 id = ;\n}\n").unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_unexpected_eof() {
        let err = parse_str("message A {").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_group_is_unsupported() {
        let err = parse_str("message A { optional group G = 1 { } }").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }
}
