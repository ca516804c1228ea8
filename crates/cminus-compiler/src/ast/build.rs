//! Node construction helpers.
//!
//! Lists (parameters, declarations, statements, arguments) are taken as
//! vectors and linked through `sibling`.

use super::nodes::*;
use super::types::Type;

fn named(kind: NodeKind, name: &str, line: u32) -> Node {
    let mut node = Node::new(kind, line);
    node.name = Some(name.to_string());
    node
}

pub fn type_spec(ty: Type, line: u32) -> Node {
    let mut node = Node::new(NodeKind::TypeSpec, line);
    node.ty = ty;
    node
}

pub fn func(ty: Type, name: &str, params: Vec<Node>, body: Node, line: u32) -> Node {
    let mut node = named(NodeKind::Declaration(DeclKind::Function), name, line);
    node.ty = ty;
    node.children = [
        Some(Box::new(type_spec(ty, line))),
        chain(params),
        Some(Box::new(body)),
    ];
    node
}

fn variable(shape: Shape, ty: Type, name: &str, line: u32) -> Node {
    let mut node = named(NodeKind::Declaration(DeclKind::Variable(shape)), name, line);
    node.ty = ty;
    node.children[0] = Some(Box::new(type_spec(ty, line)));
    node
}

pub fn var(ty: Type, name: &str, line: u32) -> Node {
    variable(Shape::Scalar, ty, name, line)
}

pub fn array_var(ty: Type, name: &str, line: u32) -> Node {
    variable(Shape::Array, ty, name, line)
}

fn parameter(shape: Shape, ty: Type, name: &str, line: u32) -> Node {
    let mut node = named(NodeKind::Parameter(shape), name, line);
    node.ty = ty;
    node.children[0] = Some(Box::new(type_spec(ty, line)));
    node
}

pub fn param(ty: Type, name: &str, line: u32) -> Node {
    parameter(Shape::Scalar, ty, name, line)
}

pub fn array_param(ty: Type, name: &str, line: u32) -> Node {
    parameter(Shape::Array, ty, name, line)
}

/// The `(void)` parameter list: a single unnamed Void parameter.
pub fn void_params(line: u32) -> Vec<Node> {
    let mut node = Node::new(NodeKind::Parameter(Shape::Scalar), line);
    node.ty = Type::Void;
    vec![node]
}

pub fn compound(decls: Vec<Node>, stmts: Vec<Node>, line: u32) -> Node {
    let mut node = Node::new(NodeKind::Statement(StmtKind::Compound), line);
    node.children[0] = chain(decls);
    node.children[1] = chain(stmts);
    node
}

pub fn if_stmt(cond: Node, then: Node, otherwise: Option<Node>, line: u32) -> Node {
    let mut node = Node::new(NodeKind::Statement(StmtKind::If), line);
    node.children = [
        Some(Box::new(cond)),
        Some(Box::new(then)),
        otherwise.map(Box::new),
    ];
    node
}

pub fn while_stmt(cond: Node, body: Node, line: u32) -> Node {
    let mut node = Node::new(NodeKind::Statement(StmtKind::Iteration), line);
    node.children[0] = Some(Box::new(cond));
    node.children[1] = Some(Box::new(body));
    node
}

pub fn ret(value: Option<Node>, line: u32) -> Node {
    let mut node = Node::new(NodeKind::Statement(StmtKind::Return), line);
    node.children[0] = value.map(Box::new);
    node
}

pub fn id(name: &str, line: u32) -> Node {
    named(NodeKind::Expression(ExprKind::Identifier(Shape::Scalar)), name, line)
}

/// `name[index]`
pub fn index(name: &str, index: Node, line: u32) -> Node {
    let mut node = named(NodeKind::Expression(ExprKind::Identifier(Shape::Array)), name, line);
    node.children[0] = Some(Box::new(index));
    node
}

pub fn call(name: &str, args: Vec<Node>, line: u32) -> Node {
    let mut node = named(NodeKind::Expression(ExprKind::Call), name, line);
    node.children[0] = chain(args);
    node
}

pub fn assign(target: Node, value: Node, line: u32) -> Node {
    let mut node = Node::new(NodeKind::Expression(ExprKind::Assign), line);
    node.children[0] = Some(Box::new(target));
    node.children[1] = Some(Box::new(value));
    node
}

pub fn op(op: BinOp, left: Node, right: Node, line: u32) -> Node {
    let mut node = Node::new(NodeKind::Expression(ExprKind::BinaryOp(op)), line);
    node.children[0] = Some(Box::new(left));
    node.children[1] = Some(Box::new(right));
    node
}

pub fn num(value: i64, line: u32) -> Node {
    Node::new(NodeKind::Expression(ExprKind::Constant(value)), line)
}
