//! Owned syntax tree handed from a parser to the walker.
//!
//! Parsers lower their native tree into this arena so that checks and the
//! walker never depend on a particular parsing library. Only named nodes
//! are kept; node 0 is always the root.

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
/// Position in the source: 1-based line, 0-based byte column.
pub struct Point {
    pub line: usize,
    pub column: usize,
}

impl Point {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Function,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Marks a node that introduces a naming scope (function or class body).
pub struct Scope {
    pub kind: ScopeKind,
    pub name: String,
}

#[derive(Debug, Clone)]
struct Node {
    kind: &'static str,
    field: Option<&'static str>,
    span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    scope: Option<Scope>,
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<Node>,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeRef<'_> {
        self.node(0)
    }

    /// Panics when `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id < self.nodes.len(), "node id {} out of range", id);
        NodeRef { tree: self, id }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn children_of(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }
}

/// Incremental constructor used by parser adapters and test fixtures.
pub struct TreeBuilder {
    tree: SyntaxTree,
}

impl TreeBuilder {
    /// Start a tree whose root spans the whole source.
    pub fn new(source: impl Into<String>, root_kind: &'static str) -> Self {
        let source = source.into();
        let lines = source.lines().count().max(1);
        let last_col = source.lines().last().map(|l| l.len()).unwrap_or(0);
        let span = Span {
            start_byte: 0,
            end_byte: source.len(),
            start: Point::new(1, 0),
            end: Point::new(lines, last_col),
        };
        Self {
            tree: SyntaxTree {
                source,
                nodes: vec![Node {
                    kind: root_kind,
                    field: None,
                    span,
                    parent: None,
                    children: Vec::new(),
                    scope: None,
                }],
            },
        }
    }

    /// Append a child under `parent`; children keep insertion order.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        kind: &'static str,
        field: Option<&'static str>,
        span: Span,
    ) -> NodeId {
        let id = self.tree.nodes.len();
        self.tree.nodes.push(Node {
            kind,
            field,
            span,
            parent: Some(parent),
            children: Vec::new(),
            scope: None,
        });
        self.tree.nodes[parent].children.push(id);
        id
    }

    pub fn set_root_span(&mut self, span: Span) {
        self.tree.nodes[0].span = span;
    }

    pub fn set_scope(&mut self, id: NodeId, scope: Scope) {
        self.tree.nodes[id].scope = Some(scope);
    }

    pub fn source(&self) -> &str {
        &self.tree.source
    }

    pub fn build(self) -> SyntaxTree {
        self.tree
    }
}

/// Borrowed view of one node; cheap to copy.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    fn raw(&self) -> &'t Node {
        &self.tree.nodes[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.raw().kind
    }

    /// Grammar field this node occupies in its parent, if any.
    pub fn field(&self) -> Option<&'static str> {
        self.raw().field
    }

    pub fn span(&self) -> Span {
        self.raw().span
    }

    pub fn start(&self) -> Point {
        self.raw().span.start
    }

    pub fn scope(&self) -> Option<&'t Scope> {
        self.raw().scope.as_ref()
    }

    pub fn text(&self) -> &'t str {
        let span = self.raw().span;
        self.tree
            .source
            .get(span.start_byte..span.end_byte)
            .unwrap_or("")
    }

    /// Whole source lines covered by the node, at most `max_lines` of them.
    pub fn source_lines(&self, max_lines: usize) -> String {
        let span = self.raw().span;
        let first = span.start.line.max(1);
        let last = span.end.line.max(first).min(first + max_lines.saturating_sub(1));
        self.tree
            .source
            .lines()
            .skip(first - 1)
            .take(last - first + 1)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.raw().parent.map(|id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let tree = self.tree;
        self.raw()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    pub fn child_by_field(&self, field: &str) -> Option<NodeRef<'t>> {
        self.children().find(|c| c.field() == Some(field))
    }

    pub fn children_by_kind(&self, kind: &'t str) -> impl Iterator<Item = NodeRef<'t>> + 't {
        self.children().filter(move |c| c.kind() == kind)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("start", &self.start())
            .finish()
    }
}
