//! Use-site checks: identifiers, calls, assignments, operators and returns.

use crate::ast::{sibling_list, ExprKind, Node, NodeKind, Shape, Type};

use super::analyzer::{Analyzer, Check, Fault};
use super::errors::SemanticError;
use super::scope::{SymbolClass, SymbolId};

fn describe(shape: Shape) -> &'static str {
    match shape {
        Shape::Scalar => "a scalar",
        Shape::Array => "an array",
    }
}

/// Name of an expression for messages.
fn subject(node: &Node) -> &str {
    node.name.as_deref().unwrap_or("expression")
}

fn internal<'a>(node: &'a Node, what: &str) -> Fault<'a> {
    Fault::new(
        node,
        SemanticError::FatalInternal(format!("{} at line {}", what, node.line)),
    )
}

impl<'a, 's> Analyzer<'a, 's> {
    /// Resolve the name carried by `node` through the current scope chain.
    pub(crate) fn resolve(&self, node: &'a Node) -> Check<'a, SymbolId> {
        let name = Self::name_of(node)?;
        self.table
            .lookup(self.scopes.current(), name)
            .ok_or_else(|| Fault::new(node, SemanticError::UndeclaredSymbol(name.to_string())))
    }

    fn class_of(&self, node: &'a Node, id: SymbolId) -> Check<'a, SymbolClass> {
        self.table
            .symbol(id)
            .class()
            .map_err(|error| Fault::new(node, error))
    }

    /// An identifier use, `x` or `a[i]`: it must be bound, and indexing
    /// requires an array.
    pub(crate) fn check_identifier(&mut self, node: &'a Node, shape: Shape) -> Check<'a> {
        let id = self.resolve(node)?;
        self.table.record_use(id, node.line);

        let name = subject(node);
        match (shape, self.class_of(node, id)?.shape()) {
            (_, None) => {
                return Err(Fault::new(
                    node,
                    SemanticError::incompatible(name, "function used as a variable"),
                ))
            }
            (Shape::Array, Some(Shape::Scalar)) => {
                return Err(Fault::new(
                    node,
                    SemanticError::incompatible(name, "indexed but not declared as an array"),
                ))
            }
            _ => {}
        }

        if let Some(index) = node.child(0) {
            self.require_value(index)?;
        }
        Ok(())
    }

    /// Type of an operand, checking that its name is bound and that its
    /// syntactic shape matches the declaration.
    pub(crate) fn check_operand_type(&self, operand: &'a Node) -> Check<'a, Type> {
        match &operand.kind {
            NodeKind::Expression(ExprKind::Constant(_) | ExprKind::BinaryOp(_) | ExprKind::Assign) => {
                Ok(Type::Int)
            }
            NodeKind::Expression(ExprKind::Identifier(shape)) => {
                let id = self.resolve(operand)?;
                let name = subject(operand);
                match self.class_of(operand, id)?.shape() {
                    None => Err(Fault::new(
                        operand,
                        SemanticError::incompatible(name, "function used as a value"),
                    )),
                    Some(declared) if declared != *shape => Err(Fault::new(
                        operand,
                        SemanticError::incompatible(
                            name,
                            format!("used as {} but declared as {}", describe(*shape), describe(declared)),
                        ),
                    )),
                    Some(_) => Ok(self.table.symbol(id).ty),
                }
            }
            NodeKind::Expression(ExprKind::Call) => {
                let id = self.resolve(operand)?;
                if self.class_of(operand, id)? != SymbolClass::Function {
                    return Err(Fault::new(
                        operand,
                        SemanticError::incompatible(subject(operand), "called but not declared as a function"),
                    ));
                }
                Ok(self.table.symbol(id).ty)
            }
            other => Err(internal(operand, &format!("{:?} used as an operand", other))),
        }
    }

    /// Like [`Self::check_operand_type`], additionally rejecting void values.
    pub(crate) fn require_value(&self, operand: &'a Node) -> Check<'a> {
        if self.check_operand_type(operand)? == Type::Void {
            return Err(Fault::new(
                operand,
                SemanticError::incompatible(subject(operand), "void value used where a value is required"),
            ));
        }
        Ok(())
    }

    pub(crate) fn check_operator(&mut self, node: &'a Node) -> Check<'a> {
        for side in [node.child(0), node.child(1)].into_iter().flatten() {
            if !side.is_literal_value() {
                self.require_value(side)?;
            }
        }
        Ok(())
    }

    pub(crate) fn check_assign(&mut self, node: &'a Node) -> Check<'a> {
        let target = node
            .child(0)
            .ok_or_else(|| internal(node, "assignment without a target"))?;
        if !matches!(target.kind, NodeKind::Expression(ExprKind::Identifier(_))) {
            return Err(Fault::new(
                target,
                SemanticError::incompatible(subject(target), "assignment target is not a variable"),
            ));
        }
        self.require_value(target)?;

        if let Some(value) = node.child(1) {
            if !value.is_literal_value() {
                self.require_value(value)?;
            }
        }
        Ok(())
    }

    /// `if` and `while` conditions must produce a value.
    pub(crate) fn check_condition(&mut self, node: &'a Node) -> Check<'a> {
        match node.child(0) {
            Some(cond) if !cond.is_literal_value() => self.require_value(cond),
            _ => Ok(()),
        }
    }

    pub(crate) fn check_call(&mut self, node: &'a Node) -> Check<'a> {
        let name = Self::name_of(node)?;
        let id = self.resolve(node)?;
        self.table.record_use(id, node.line);

        if self.class_of(node, id)? != SymbolClass::Function {
            return Err(Fault::new(
                node,
                SemanticError::incompatible(name, "called but not declared as a function"),
            ));
        }

        let params: Vec<&'a Node> = self.table.symbol(id).parameters().collect();
        let args: Vec<&'a Node> = sibling_list(node.child(0)).collect();
        if params.len() != args.len() {
            return Err(Fault::new(
                node,
                SemanticError::DifferentParameterCount {
                    name: name.to_string(),
                    expected: params.len(),
                    found: args.len(),
                },
            ));
        }

        for (position, (arg, param)) in args.into_iter().zip(params).enumerate() {
            self.check_argument(node, name, position + 1, arg, param)?;
        }
        Ok(())
    }

    /// Match one argument against its declared parameter. Arguments are
    /// compared by shape: a bare array name passes an array, everything
    /// else (including a call result) passes a scalar.
    fn check_argument(
        &self,
        call: &'a Node,
        name: &str,
        position: usize,
        arg: &'a Node,
        param: &'a Node,
    ) -> Check<'a> {
        let NodeKind::Parameter(expected) = param.kind else {
            return Err(internal(param, "parameter list holds a non-parameter"));
        };

        let found = match &arg.kind {
            NodeKind::Expression(ExprKind::Constant(_) | ExprKind::BinaryOp(_) | ExprKind::Assign) => {
                Shape::Scalar
            }
            NodeKind::Expression(ExprKind::Identifier(Shape::Array)) => {
                self.resolve(arg)?;
                Shape::Scalar
            }
            NodeKind::Expression(ExprKind::Identifier(Shape::Scalar)) => {
                let id = self.resolve(arg)?;
                match self.class_of(arg, id)?.shape() {
                    Some(shape) => shape,
                    None => {
                        return Err(Fault::new(
                            call,
                            SemanticError::wrong_parameter(
                                name,
                                position,
                                format!("function '{}' passed as a value", subject(arg)),
                            ),
                        ))
                    }
                }
            }
            NodeKind::Expression(ExprKind::Call) => {
                let id = self.resolve(arg)?;
                let callee = self.table.symbol(id);
                if self.class_of(arg, id)? != SymbolClass::Function {
                    return Err(Fault::new(
                        call,
                        SemanticError::wrong_parameter(
                            name,
                            position,
                            format!("'{}' is not a function", callee.name),
                        ),
                    ));
                }
                if callee.ty == Type::Void {
                    return Err(Fault::new(
                        call,
                        SemanticError::wrong_parameter(
                            name,
                            position,
                            format!("'{}' returns void", callee.name),
                        ),
                    ));
                }
                Shape::Scalar
            }
            other => return Err(internal(arg, &format!("{:?} used as an argument", other))),
        };

        if found != expected {
            return Err(Fault::new(
                call,
                SemanticError::wrong_parameter(
                    name,
                    position,
                    format!("expected {} but found {}", describe(expected), describe(found)),
                ),
            ));
        }
        Ok(())
    }

    pub(crate) fn check_return(&mut self, node: &'a Node) -> Check<'a> {
        let Some(frame) = &self.function else {
            return Err(internal(node, "return outside of a function"));
        };
        let mismatch = || {
            Fault::new(
                node,
                SemanticError::ReturnTypeMismatch {
                    function: frame.name.clone(),
                    expected: frame.return_type,
                },
            )
        };

        let value = match (frame.return_type, node.child(0)) {
            (Type::Void, None) => return Ok(()),
            (Type::Void, Some(_)) | (Type::Int, None) => return Err(mismatch()),
            (Type::Int, Some(value)) => value,
        };

        match &value.kind {
            NodeKind::Expression(ExprKind::Constant(_) | ExprKind::BinaryOp(_)) => Ok(()),
            NodeKind::Expression(ExprKind::Identifier(Shape::Array)) => {
                self.resolve(value)?;
                Ok(())
            }
            NodeKind::Expression(ExprKind::Identifier(Shape::Scalar)) => {
                let id = self.resolve(value)?;
                let symbol = self.table.symbol(id);
                let scalar = self.class_of(value, id)?.shape() == Some(Shape::Scalar);
                if scalar && symbol.ty == Type::Int {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            NodeKind::Expression(ExprKind::Call) => {
                let id = self.resolve(value)?;
                if self.table.symbol(id).ty == Type::Void {
                    return Err(mismatch());
                }
                Ok(())
            }
            _ => Err(mismatch()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::build::*;
    use crate::ast::{chain, BinOp, Node, Type};
    use crate::semantic::testing::{analyze_program, errors};

    fn main_with(decls: Vec<Node>, stmts: Vec<Node>) -> Node {
        func(Type::Void, "main", void_params(10), compound(decls, stmts, 10), 10)
    }

    fn int_fn(name: &str, params: Vec<Node>, stmts: Vec<Node>, line: u32) -> Node {
        func(Type::Int, name, params, compound(vec![], stmts, line), line)
    }

    fn void_fn(name: &str, params: Vec<Node>, line: u32) -> Node {
        func(Type::Void, name, params, compound(vec![], vec![], line), line)
    }

    // -- Identifiers --

    #[test]
    fn undeclared_symbol() {
        let errs = errors(vec![main_with(vec![], vec![assign(id("x", 11), num(1, 11), 11)])]);
        assert_eq!(errs, vec!["undeclared symbol 'x'".to_string()]);
    }

    #[test]
    fn undeclared_operand_reported_once() {
        let errs = errors(vec![main_with(
            vec![var(Type::Int, "x", 11)],
            vec![assign(id("x", 12), op(BinOp::Mul, id("y", 12), num(2, 12), 12), 12)],
        )]);
        assert_eq!(errs, vec!["undeclared symbol 'y'".to_string()]);
    }

    #[test]
    fn block_scoping() {
        let errs = errors(vec![main_with(
            vec![],
            vec![
                while_stmt(num(1, 11), compound(vec![var(Type::Int, "inner", 12)], vec![], 11), 11),
                assign(id("inner", 14), num(5, 14), 14),
            ],
        )]);
        assert_eq!(errs, vec!["undeclared symbol 'inner'".to_string()]);
    }

    #[test]
    fn indexing_a_scalar() {
        let errs = errors(vec![main_with(
            vec![var(Type::Int, "x", 11)],
            vec![assign(index("x", num(0, 12), 12), num(1, 12), 12)],
        )]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("incompatible use of 'x'"), "{:?}", errs);
    }

    #[test]
    fn array_used_as_scalar_operand() {
        let errs = errors(vec![main_with(
            vec![array_var(Type::Int, "a", 11), var(Type::Int, "x", 11)],
            vec![assign(id("x", 12), op(BinOp::Add, id("a", 12), num(1, 12), 12), 12)],
        )]);
        assert_eq!(
            errs,
            vec!["incompatible use of 'a': used as a scalar but declared as an array".to_string()]
        );
    }

    #[test]
    fn void_call_as_operand() {
        let errs = errors(vec![
            void_fn("v", void_params(1), 1),
            main_with(
                vec![var(Type::Int, "x", 11)],
                vec![assign(id("x", 12), op(BinOp::Add, call("v", vec![], 12), num(1, 12), 12), 12)],
            ),
        ]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("void value"), "{:?}", errs);
    }

    #[test]
    fn void_operand_hides_arity_on_same_call() {
        let errs = errors(vec![
            void_fn("v", void_params(1), 1),
            main_with(
                vec![var(Type::Int, "x", 11)],
                vec![assign(
                    id("x", 12),
                    op(BinOp::Add, call("v", vec![num(3, 12)], 12), num(1, 12), 12),
                    12,
                )],
            ),
        ]);
        assert_eq!(errs.len(), 1, "{:?}", errs);
        assert!(errs[0].contains("void value"), "{:?}", errs);
    }

    #[test]
    fn void_call_assigned() {
        let errs = errors(vec![
            void_fn("v", void_params(1), 1),
            main_with(
                vec![var(Type::Int, "x", 11)],
                vec![assign(id("x", 12), call("v", vec![], 12), 12)],
            ),
        ]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("void value"), "{:?}", errs);
    }

    #[test]
    fn void_condition() {
        let errs = errors(vec![
            void_fn("v", void_params(1), 1),
            main_with(vec![], vec![if_stmt(call("v", vec![], 11), compound(vec![], vec![], 11), None, 11)]),
        ]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("void value"), "{:?}", errs);
    }

    #[test]
    fn calling_a_variable() {
        let errs = errors(vec![main_with(
            vec![var(Type::Int, "x", 11)],
            vec![call("x", vec![], 12)],
        )]);
        assert_eq!(
            errs,
            vec!["incompatible use of 'x': called but not declared as a function".to_string()]
        );
    }

    // -- Calls --

    #[test]
    fn builtins_type_check() {
        let program = chain(vec![main_with(
            vec![var(Type::Int, "x", 11)],
            vec![
                assign(id("x", 12), call("input", vec![], 12), 12),
                call("output", vec![num(1, 13)], 13),
                call("output", vec![id("x", 14)], 14),
            ],
        )]);
        let (analysis, diags) = analyze_program(program.as_deref());
        assert!(diags.is_empty(), "unexpected errors: {:?}", diags);
        assert_eq!(analysis.error_count, 0);

        let global = analysis.symbols.global().unwrap();
        let output = analysis.symbols.lookup(global, "output").unwrap();
        assert_eq!(analysis.symbols.symbol(output).lines, vec![0, 13, 14]);
        assert!(analysis.symbols.lookup(global, "input").is_some());
    }

    #[test]
    fn arguments_to_zero_parameter_function() {
        let errs = errors(vec![main_with(vec![], vec![call("input", vec![num(3, 11)], 11)])]);
        assert_eq!(
            errs,
            vec!["call to 'input' expects 0 argument(s), found 1".to_string()]
        );
    }

    #[test]
    fn too_few_and_too_many_arguments() {
        let errs = errors(vec![
            void_fn("pair", vec![param(Type::Int, "a", 1), param(Type::Int, "b", 1)], 1),
            main_with(
                vec![],
                vec![
                    call("pair", vec![num(1, 11)], 11),
                    call("pair", vec![num(1, 12), num(2, 12), num(3, 12)], 12),
                    call("output", vec![], 13),
                ],
            ),
        ]);
        assert_eq!(errs.len(), 3);
        assert!(errs.iter().all(|e| e.starts_with("call to")), "{:?}", errs);
    }

    #[test]
    fn scalar_passed_for_array_parameter() {
        let errs = errors(vec![
            void_fn("sort", vec![array_param(Type::Int, "a", 1)], 1),
            main_with(vec![var(Type::Int, "x", 11)], vec![call("sort", vec![id("x", 12)], 12)]),
        ]);
        assert_eq!(
            errs,
            vec!["wrong parameter type for argument 1 of 'sort': expected an array but found a scalar"
                .to_string()]
        );
    }

    #[test]
    fn array_passed_for_scalar_parameter() {
        let errs = errors(vec![main_with(
            vec![array_var(Type::Int, "a", 11)],
            vec![call("output", vec![id("a", 12)], 12)],
        )]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].starts_with("wrong parameter type"), "{:?}", errs);
    }

    #[test]
    fn constant_for_array_parameter() {
        let errs = errors(vec![
            void_fn("sort", vec![array_param(Type::Int, "a", 1)], 1),
            main_with(vec![], vec![call("sort", vec![op(BinOp::Add, num(1, 11), num(2, 11), 11)], 11)]),
        ]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].starts_with("wrong parameter type"), "{:?}", errs);
    }

    #[test]
    fn array_parameter_passed_along() {
        let errs = errors(vec![
            void_fn("sort", vec![array_param(Type::Int, "a", 1), param(Type::Int, "n", 1)], 1),
            func(
                Type::Void,
                "wrap",
                vec![array_param(Type::Int, "b", 2)],
                compound(
                    vec![],
                    vec![call("sort", vec![id("b", 3), index("b", num(0, 3), 3)], 3)],
                    2,
                ),
                2,
            ),
        ]);
        assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    }

    #[test]
    fn nested_call_arguments() {
        let errs = errors(vec![
            void_fn("v", void_params(1), 1),
            void_fn("sort", vec![array_param(Type::Int, "a", 2)], 2),
            main_with(
                vec![],
                vec![
                    call("output", vec![call("input", vec![], 11)], 11),
                    call("output", vec![call("v", vec![], 12)], 12),
                    call("sort", vec![call("input", vec![], 13)], 13),
                ],
            ),
        ]);
        assert_eq!(errs.len(), 2, "{:?}", errs);
        assert!(errs[0].contains("'v' returns void"), "{:?}", errs);
        assert!(errs[1].contains("expected an array"), "{:?}", errs);
    }

    #[test]
    fn undeclared_argument() {
        let errs = errors(vec![main_with(vec![], vec![call("output", vec![id("nope", 11)], 11)])]);
        assert_eq!(errs, vec!["undeclared symbol 'nope'".to_string()]);
    }

    #[test]
    fn recursion_sees_own_declaration() {
        let errs = errors(vec![int_fn(
            "fact",
            vec![param(Type::Int, "n", 1)],
            vec![ret(
                Some(op(
                    BinOp::Mul,
                    id("n", 2),
                    call("fact", vec![op(BinOp::Sub, id("n", 2), num(1, 2), 2)], 2),
                    2,
                )),
                2,
            )],
            1,
        )]);
        assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    }

    #[test]
    fn calls_are_not_forward_visible() {
        let errs = errors(vec![
            main_with(vec![], vec![call("later", vec![], 11)]),
            void_fn("later", void_params(20), 20),
        ]);
        assert_eq!(errs, vec!["undeclared symbol 'later'".to_string()]);
    }

    // -- Returns --

    #[test]
    fn void_function_returning_value() {
        let errs = errors(vec![func(
            Type::Void,
            "f",
            void_params(1),
            compound(vec![], vec![ret(Some(num(1, 2)), 2)], 1),
            1,
        )]);
        assert_eq!(
            errs,
            vec!["return type mismatch in 'f': VOID should be returned".to_string()]
        );
    }

    #[test]
    fn int_function_bare_return() {
        let errs = errors(vec![int_fn("f", void_params(1), vec![ret(None, 2)], 1)]);
        assert_eq!(
            errs,
            vec!["return type mismatch in 'f': INT should be returned".to_string()]
        );
    }

    #[test]
    fn int_function_returns_constant_or_arithmetic() {
        let errs = errors(vec![
            int_fn("one", void_params(1), vec![ret(Some(num(1, 2)), 2)], 1),
            int_fn(
                "sum",
                vec![param(Type::Int, "a", 3), param(Type::Int, "b", 3)],
                vec![ret(Some(op(BinOp::Add, id("a", 4), id("b", 4), 4)), 4)],
                3,
            ),
            int_fn("ask", void_params(5), vec![ret(Some(call("input", vec![], 6)), 6)], 5),
        ]);
        assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    }

    #[test]
    fn int_function_returning_void_call() {
        let errs = errors(vec![
            void_fn("v", void_params(1), 1),
            int_fn("f", void_params(2), vec![ret(Some(call("v", vec![], 3)), 3)], 2),
        ]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].starts_with("return type mismatch"), "{:?}", errs);
    }

    #[test]
    fn returning_an_array_name() {
        let errs = errors(vec![int_fn(
            "f",
            vec![array_param(Type::Int, "a", 1)],
            vec![ret(Some(id("a", 2)), 2), ret(Some(index("a", num(0, 3), 3)), 3)],
            1,
        )]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].starts_with("return type mismatch"), "{:?}", errs);
    }

    #[test]
    fn returning_undeclared() {
        let errs = errors(vec![int_fn("f", void_params(1), vec![ret(Some(id("ghost", 2)), 2)], 1)]);
        assert_eq!(errs, vec!["undeclared symbol 'ghost'".to_string()]);
    }

    #[test]
    fn returning_assignment() {
        let errs = errors(vec![int_fn(
            "f",
            vec![param(Type::Int, "a", 1)],
            vec![ret(Some(assign(id("a", 2), num(1, 2), 2)), 2)],
            1,
        )]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].starts_with("return type mismatch"), "{:?}", errs);
    }

    #[test]
    fn return_inside_nested_block_uses_enclosing_function() {
        let errs = errors(vec![int_fn(
            "f",
            vec![param(Type::Int, "a", 1)],
            vec![
                if_stmt(
                    op(BinOp::Lt, id("a", 2), num(0, 2), 2),
                    compound(vec![], vec![ret(Some(num(0, 3)), 3)], 2),
                    Some(compound(vec![], vec![ret(None, 5)], 4)),
                    2,
                ),
                ret(Some(id("a", 7)), 7),
            ],
            1,
        )]);
        assert_eq!(
            errs,
            vec!["return type mismatch in 'f': INT should be returned".to_string()]
        );
    }

    #[test]
    fn errors_do_not_stop_the_pass() {
        let program = chain(vec![
            var(Type::Void, "bad", 1),
            main_with(
                vec![var(Type::Int, "x", 11), var(Type::Int, "x", 12)],
                vec![
                    assign(id("y", 13), num(1, 13), 13),
                    call("output", vec![], 14),
                    ret(Some(num(1, 15)), 15),
                ],
            ),
        ]);
        let (analysis, diags) = analyze_program(program.as_deref());
        let lines: Vec<u32> = diags.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 12, 13, 14, 15]);
        assert_eq!(analysis.error_count, 5);
        assert_eq!(analysis.open_scopes, 1);
    }
}
