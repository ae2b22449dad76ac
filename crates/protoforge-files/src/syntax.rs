//! Thin layer over the tree-sitter Go grammar.

use protoforge_core::{Error, Result};
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

/// Parses Go source, rejecting any syntax error.
pub(crate) fn parse_go(path: &Path, source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| Error::SourceParse {
            path: path.to_path_buf(),
            message: format!("Go grammar unavailable: {e}"),
        })?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::SourceParse {
            path: path.to_path_buf(),
            message: "parser produced no tree".to_string(),
        })?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error(root).map_or(0, |n| n.start_position().row + 1);
        return Err(Error::SourceParse {
            path: path.to_path_buf(),
            message: format!("syntax error near line {line}"),
        });
    }
    Ok(tree)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(Node::has_error)
        .find_map(first_error)
}

/// Source text covered by `node`.
pub(crate) fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// Every descendant of `node` (itself included) with the given kind, in
/// document order.
pub(crate) fn descendants_of_kind<'t>(node: Node<'t>, kind: &str, out: &mut Vec<Node<'t>>) {
    if node.kind() == kind {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        descendants_of_kind(child, kind, out);
    }
}

/// Strips `//` or `/* */` markers and surrounding whitespace.
pub(crate) fn comment_body(comment: &str) -> &str {
    let trimmed = comment.trim();
    trimmed
        .strip_prefix("//")
        .or_else(|| {
            trimmed
                .strip_prefix("/*")
                .map(|inner| inner.strip_suffix("*/").unwrap_or(inner))
        })
        .unwrap_or(trimmed)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_source() {
        let tree = parse_go(Path::new("a.go"), "package a\n\nfunc A() {}\n").unwrap();
        assert_eq!(tree.root_node().kind(), "source_file");
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let err = parse_go(Path::new("bad.go"), "package a\n\nfunc A( {\n").unwrap_err();
        match err {
            Error::SourceParse { path, message } => {
                assert_eq!(path, Path::new("bad.go"));
                assert!(message.starts_with("syntax error near line"));
            }
            other => panic!("expected SourceParse, got {other:?}"),
        }
    }

    #[test]
    fn test_comment_body() {
        assert_eq!(comment_body("// Code generated. DO NOT EDIT."), "Code generated. DO NOT EDIT.");
        assert_eq!(comment_body("/* block */"), "block");
        assert_eq!(comment_body("  //x  "), "x");
    }
}
