//! Ancestry visible to checks during a walk.

use crate::tree::{NodeId, ScopeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFrame {
    pub kind: ScopeKind,
    pub name: String,
    /// Node that opened the frame.
    pub node: NodeId,
}

/// Stack of enclosing function/class frames, owned by one walk.
#[derive(Debug, Default)]
pub struct NodeContext {
    frames: Vec<ContextFrame>,
}

impl NodeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, frame: ContextFrame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<ContextFrame> {
        self.frames.pop()
    }

    /// Outermost frame first.
    pub fn frames(&self) -> &[ContextFrame] {
        &self.frames
    }

    pub fn current(&self) -> Option<&ContextFrame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn enclosing_function(&self) -> Option<&ContextFrame> {
        self.frames
            .iter()
            .rev()
            .find(|f| f.kind == ScopeKind::Function)
    }

    pub fn enclosing_class(&self) -> Option<&ContextFrame> {
        self.frames.iter().rev().find(|f| f.kind == ScopeKind::Class)
    }

    /// Dotted path of frame names, e.g. `Outer.method`. Empty at module level.
    pub fn qualified_name(&self) -> String {
        self.frames
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(kind: ScopeKind, name: &str, node: NodeId) -> ContextFrame {
        ContextFrame {
            kind,
            name: name.into(),
            node,
        }
    }

    #[test]
    fn test_push_pop_and_lookup() {
        let mut ctx = NodeContext::new();
        assert_eq!(ctx.qualified_name(), "");
        ctx.push(frame(ScopeKind::Class, "Outer", 1));
        ctx.push(frame(ScopeKind::Function, "method", 4));
        assert_eq!(ctx.qualified_name(), "Outer.method");
        assert_eq!(ctx.enclosing_class().unwrap().name, "Outer");
        assert_eq!(ctx.enclosing_function().unwrap().node, 4);
        assert_eq!(ctx.pop().unwrap().name, "method");
        assert!(ctx.enclosing_function().is_none());
        assert_eq!(ctx.depth(), 1);
    }
}
