//! Parser capability consumed by the scan manager.
//!
//! `PythonParser` lowers a `tree-sitter` parse into the crate's own
//! `SyntaxTree`. Any error or missing node in the native tree turns the
//! whole file into a `ParseError`; checks only ever see clean trees.

use crate::tree::{NodeId, Point, Scope, ScopeKind, Span, SyntaxTree, TreeBuilder};
use thiserror::Error;
use tree_sitter::{Language, Node, Parser};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Turns source text into a `SyntaxTree`. Must be deterministic.
pub trait SourceParser: Send + Sync {
    /// Short language name used in logs.
    fn language(&self) -> &str;

    fn parse(&self, text: &str) -> Result<SyntaxTree, ParseError>;
}

pub struct PythonParser {
    language: Language,
}

impl PythonParser {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for PythonParser {
    fn language(&self) -> &str {
        "python"
    }

    fn parse(&self, text: &str) -> Result<SyntaxTree, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::new(format!("failed to load grammar: {}", e), 0, 0))?;
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| ParseError::new("parser returned no tree", 0, 0))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(first_error(root));
        }
        Ok(lower(root, text))
    }
}

fn point(p: tree_sitter::Point) -> Point {
    Point::new(p.row + 1, p.column)
}

fn span_of(node: &Node) -> Span {
    Span {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start: point(node.start_position()),
        end: point(node.end_position()),
    }
}

fn scope_of(node: &Node, source: &str) -> Option<Scope> {
    let kind = match node.kind() {
        "function_definition" => ScopeKind::Function,
        "class_definition" => ScopeKind::Class,
        _ => return None,
    };
    let name = node
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
        .unwrap_or("<anonymous>")
        .to_string();
    Some(Scope { kind, name })
}

/// Locate the first error or missing node in pre-order.
fn first_error(root: Node) -> ParseError {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_missing() {
            let p = point(node.start_position());
            return ParseError::new(format!("missing '{}'", node.kind()), p.line, p.column);
        }
        if node.is_error() {
            let p = point(node.start_position());
            return ParseError::new("invalid syntax", p.line, p.column);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                let p = point(root.start_position());
                return ParseError::new("invalid syntax", p.line, p.column);
            }
        }
    }
}

/// Copy named nodes into the arena without recursion.
fn lower(root: Node, source: &str) -> SyntaxTree {
    let mut builder = TreeBuilder::new(source, root.kind());
    builder.set_root_span(span_of(&root));
    let mut cursor = root.walk();
    let mut parents: Vec<NodeId> = vec![0];
    if !cursor.goto_first_child() {
        return builder.build();
    }
    loop {
        let node = cursor.node();
        if node.is_named() {
            let parent = parents.last().copied().unwrap_or(0);
            let id = builder.add_node(parent, node.kind(), cursor.field_name(), span_of(&node));
            if let Some(scope) = scope_of(&node, source) {
                builder.set_scope(id, scope);
            }
            if cursor.goto_first_child() {
                parents.push(id);
                continue;
            }
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return builder.build();
            }
            parents.pop();
            if parents.is_empty() {
                return builder.build();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_valid_python_into_named_nodes() {
        let src = "def f(x):\n    return x\n";
        let tree = PythonParser::new().parse(src).expect("valid source");
        assert_eq!(tree.root().kind(), "module");
        let func = tree.root().children().next().unwrap();
        assert_eq!(func.kind(), "function_definition");
        let scope = func.scope().expect("function marks a scope");
        assert_eq!(scope.kind, ScopeKind::Function);
        assert_eq!(scope.name, "f");
        assert_eq!(func.child_by_field("name").unwrap().text(), "f");
        assert_eq!(tree.line_count(), 2);
    }

    #[test]
    fn test_syntax_error_is_reported_with_position() {
        let src = "x = 1\ndef broken(:\n    pass\n";
        let err = PythonParser::new().parse(src).unwrap_err();
        assert!(err.line >= 1);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_empty_source_parses() {
        let tree = PythonParser::new().parse("").expect("empty module");
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_class_scope_and_nested_function() {
        let src = "class A:\n    def m(self):\n        pass\n";
        let tree = PythonParser::new().parse(src).unwrap();
        let class = tree.root().children().next().unwrap();
        assert_eq!(class.scope().unwrap().kind, ScopeKind::Class);
        assert_eq!(class.scope().unwrap().name, "A");
    }
}
