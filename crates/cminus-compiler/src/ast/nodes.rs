use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::Type;

/// Number of fixed child slots on every node.
pub const MAX_CHILDREN: usize = 3;

// ============================================================================
// Node kinds
// ============================================================================

/// Whether a variable, parameter or identifier denotes an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Scalar,
    Array,
}

/// The kind of a syntax-tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Declaration(DeclKind),
    Parameter(Shape),
    Statement(StmtKind),
    Expression(ExprKind),
    TypeSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclKind {
    /// Children: `[return type, parameter list, body]`.
    Function,
    /// Children: `[type]`.
    Variable(Shape),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StmtKind {
    /// Children: `[local declarations, statements]`.
    Compound,
    /// Children: `[condition, then, else]`.
    If,
    /// Children: `[condition, body]`.
    Iteration,
    /// Children: `[value]`, value optional.
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprKind {
    /// `x` or `a[i]`; an array identifier carries its index in child 0.
    Identifier(Shape),
    /// Children: `[arguments]`.
    Call,
    /// Children: `[target, value]`.
    Assign,
    /// Children: `[left, right]`.
    BinaryOp(BinOp),
    Constant(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::Lte => "<=",
            BinOp::Gt => ">",
            BinOp::Gte => ">=",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
        }
    }
}

// ============================================================================
// Node
// ============================================================================

/// A syntax-tree node as produced by the parser.
///
/// Children occupy fixed slots whose meaning depends on `kind`; statements,
/// declarations, parameters and arguments at the same level are linked
/// through `sibling`.
///
/// `Drop`, `Clone`, `PartialEq` and `Debug` walk sibling lists in a loop, so
/// their stack use grows with nesting depth only, never with list length.
#[derive(Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(with = "super::json::slots", default)]
    pub children: [Option<Box<Node>>; MAX_CHILDREN],
    #[serde(skip)]
    pub sibling: Option<Box<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub ty: Type,
    pub line: u32,
}

impl Node {
    pub fn new(kind: NodeKind, line: u32) -> Self {
        Self {
            kind,
            children: Default::default(),
            sibling: None,
            name: None,
            ty: Type::default(),
            line,
        }
    }

    /// Copy of this node and its subtrees, detached from its siblings.
    fn clone_detached(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            children: self.children.clone(),
            sibling: None,
            name: self.name.clone(),
            ty: self.ty,
            line: self.line,
        }
    }

    fn same_fields(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.ty == other.ty
            && self.line == other.line
            && self.children == other.children
    }

    pub fn child(&self, slot: usize) -> Option<&Node> {
        self.children.get(slot).and_then(|c| c.as_deref())
    }

    /// This node followed by every node reachable through `sibling`.
    pub fn siblings(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(Some(self), |n| n.sibling.as_deref())
    }

    /// Whether this node is a constant or an operator expression, both of
    /// which are integer-valued without any name lookup.
    pub fn is_literal_value(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Expression(ExprKind::Constant(_) | ExprKind::BinaryOp(_))
        )
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut next = self.sibling.take();
        while let Some(mut node) = next {
            next = node.sibling.take();
        }
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        let mut head = self.clone_detached();
        head.sibling = chain(self.siblings().skip(1).map(Node::clone_detached).collect());
        head
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut ours = self.siblings();
        let mut theirs = other.siblings();
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.same_fields(b) => {}
                _ => return false,
            }
        }
    }
}

struct Detached<'n>(&'n Node);

impl fmt::Debug for Detached<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0;
        f.debug_struct("Node")
            .field("kind", &node.kind)
            .field("name", &node.name)
            .field("ty", &node.ty)
            .field("line", &node.line)
            .field("children", &node.children)
            .finish()
    }
}

struct Followers<'n>(&'n Node);

impl fmt::Debug for Followers<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.siblings().skip(1).map(Detached))
            .finish()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sibling.is_none() {
            return Detached(self).fmt(f);
        }
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("line", &self.line)
            .field("children", &self.children)
            .field("siblings", &Followers(self))
            .finish()
    }
}

/// Iterate a sibling list starting at `head`.
pub fn sibling_list(head: Option<&Node>) -> impl Iterator<Item = &Node> {
    std::iter::successors(head, |n| n.sibling.as_deref())
}

/// Link `nodes` into a sibling list, returning its head.
pub fn chain(nodes: Vec<Node>) -> Option<Box<Node>> {
    nodes.into_iter().rev().fold(None, |next, mut node| {
        node.sibling = next;
        Some(Box::new(node))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_preserves_order() {
        let head = chain(vec![
            Node::new(NodeKind::TypeSpec, 1),
            Node::new(NodeKind::TypeSpec, 2),
            Node::new(NodeKind::TypeSpec, 3),
        ]);
        let lines: Vec<u32> = sibling_list(head.as_deref()).map(|n| n.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn chain_of_nothing_is_empty() {
        assert!(chain(Vec::new()).is_none());
    }

    fn long_declarations(len: usize) -> Vec<Node> {
        (0..len)
            .map(|i| {
                let mut node = Node::new(NodeKind::Declaration(DeclKind::Variable(Shape::Scalar)), 1);
                node.name = Some(format!("v{}", i));
                node
            })
            .collect()
    }

    #[test]
    fn long_sibling_lists_drop_without_recursion() {
        let program = chain(long_declarations(200_000));
        assert_eq!(sibling_list(program.as_deref()).count(), 200_000);
        drop(program);
    }

    #[test]
    fn long_sibling_lists_clone_and_compare() {
        let program = chain(long_declarations(100_000));
        let copy = program.clone();
        assert!(copy == program);

        let mut decls = long_declarations(100_000);
        decls[99_999].line = 2;
        let changed = chain(decls);
        assert!(changed != program);
    }

    #[test]
    fn debug_lists_followers() {
        let head = chain(vec![
            Node::new(NodeKind::TypeSpec, 1),
            Node::new(NodeKind::TypeSpec, 2),
        ]);
        let text = format!("{:?}", head);
        assert!(text.contains("siblings"));
        assert!(text.contains("line: 2"));
    }

    #[test]
    fn literal_values() {
        let c = Node::new(NodeKind::Expression(ExprKind::Constant(4)), 1);
        let op = Node::new(NodeKind::Expression(ExprKind::BinaryOp(BinOp::Add)), 1);
        let id = Node::new(NodeKind::Expression(ExprKind::Identifier(Shape::Scalar)), 1);
        assert!(c.is_literal_value());
        assert!(op.is_literal_value());
        assert!(!id.is_literal_value());
    }
}
