//! Library functions bound in the global scope before traversal.

use lazy_static::lazy_static;

use crate::ast::build::{compound, func, param, void_params};
use crate::ast::{Node, Type};

lazy_static! {
    /// `int input(void)`
    static ref INPUT: Node = func(
        Type::Int,
        "input",
        void_params(0),
        compound(vec![], vec![], 0),
        0,
    );

    /// `void output(int value)`
    static ref OUTPUT: Node = func(
        Type::Void,
        "output",
        vec![param(Type::Int, "value", 0)],
        compound(vec![], vec![], 0),
        0,
    );
}

/// Declaration nodes of the builtin functions, in registration order.
pub fn declarations() -> [&'static Node; 2] {
    [&*INPUT, &*OUTPUT]
}
