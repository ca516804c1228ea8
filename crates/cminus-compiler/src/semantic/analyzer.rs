use std::collections::HashSet;

use cminus_common::{Diagnostic, DiagnosticSink};
use log::{debug, error};

use crate::ast::{traverse, DeclKind, ExprKind, Node, NodeKind, StmtKind, Type, Walker};

use super::builtins;
use super::errors::SemanticError;
use super::scope::{ScopeStack, SymbolTable};
use super::Analysis;

/// A semantic error anchored at the node where it was observed.
#[derive(Debug)]
pub(crate) struct Fault<'a> {
    pub node: &'a Node,
    pub error: SemanticError,
    /// Line of an earlier declaration the error refers to.
    pub previous: Option<u32>,
}

impl<'a> Fault<'a> {
    pub fn new(node: &'a Node, error: SemanticError) -> Self {
        Self {
            node,
            error,
            previous: None,
        }
    }

    pub fn previously_at(mut self, line: u32) -> Self {
        self.previous = Some(line);
        self
    }
}

pub(crate) type Check<'a, T = ()> = Result<T, Fault<'a>>;

/// The function whose body is being analyzed.
#[derive(Debug)]
pub(crate) struct FunctionFrame {
    pub name: String,
    pub return_type: Type,
}

/// Single-pass binder and type checker.
///
/// Declarations are bound on entry to their node, so a name is visible
/// from its declaration onwards and a function can call itself. Use sites
/// are checked against whatever is bound at the time they are entered.
pub struct Analyzer<'a, 's> {
    pub(crate) table: SymbolTable<'a>,
    pub(crate) scopes: ScopeStack,
    pub(crate) function: Option<FunctionFrame>,
    /// Set by a function declaration; its body compound consumes it and
    /// reuses the function scope instead of opening another.
    pub(crate) entering_function_body: bool,
    /// For each open function or compound node, whether it pushed a scope.
    pub(crate) opened: Vec<bool>,
    /// Nodes that already carry a diagnostic. A node gets at most one, so a
    /// second independent fault on it (an arity mismatch on a call whose
    /// void result an operator already rejected) goes unreported.
    reported: HashSet<*const Node>,
    error_count: usize,
    sink: &'s mut dyn DiagnosticSink,
}

impl<'a, 's> Analyzer<'a, 's> {
    pub fn new(sink: &'s mut dyn DiagnosticSink) -> Self {
        let mut table = SymbolTable::new();
        let global = table.create_scope("global", None, 0);
        let mut analyzer = Self {
            table,
            scopes: ScopeStack::new(global),
            function: None,
            entering_function_body: false,
            opened: Vec::new(),
            reported: HashSet::new(),
            error_count: 0,
            sink,
        };
        analyzer.register_builtins();
        analyzer
    }

    fn register_builtins(&mut self) {
        let global = self.scopes.current();
        for decl in builtins::declarations() {
            if let Some(name) = decl.name.as_deref() {
                self.table.insert(global, name, decl.ty, decl.line, decl);
                debug!("registered builtin '{}'", name);
            }
        }
    }

    /// Analyze the program rooted at `root` (a list of top-level
    /// declarations).
    pub fn run(mut self, root: Option<&'a Node>) -> Analysis<'a> {
        traverse(root, &mut self);

        if self.scopes.depth() != 1 {
            error!("scope stack left at depth {}", self.scopes.depth());
            self.error_count += 1;
            self.sink.report(Diagnostic::error(
                SemanticError::FatalInternal("unbalanced scope stack".into()).to_string(),
                0,
            ));
        }

        debug!(
            "semantic analysis finished: {} error(s), {} scope(s)",
            self.error_count,
            self.table.scopes().count()
        );

        Analysis {
            open_scopes: self.scopes.depth(),
            error_count: self.error_count,
            symbols: self.table,
            listing: None,
        }
    }

    /// Report `fault` unless its node already produced a diagnostic.
    pub(crate) fn report(&mut self, fault: Fault<'a>) {
        if !self.reported.insert(fault.node as *const Node) {
            return;
        }
        self.error_count += 1;
        debug!("line {}: {}", fault.node.line, fault.error);
        let mut diagnostic = Diagnostic::error(fault.error.to_string(), fault.node.line);
        if let Some(line) = fault.previous {
            diagnostic = diagnostic.with_related(line, "first declared here");
        }
        self.sink.report(diagnostic);
    }

    pub(crate) fn name_of(node: &'a Node) -> Check<'a, &'a str> {
        node.name.as_deref().ok_or_else(|| {
            Fault::new(
                node,
                SemanticError::FatalInternal(format!(
                    "{:?} node without a name at line {}",
                    node.kind, node.line
                )),
            )
        })
    }

    /// Open a scope nested in the current one and make it current.
    pub(crate) fn open_scope(&mut self, name: String) {
        let depth = self.scopes.depth();
        let parent = self.scopes.current();
        debug!("open scope '{}' at depth {}", name, depth);
        let scope = self.table.create_scope(name, Some(parent), depth);
        self.scopes.push(scope);
    }

    /// Close the scope opened by `node`, if it opened one.
    fn close_scope(&mut self, node: &'a Node) {
        if !self.opened.pop().unwrap_or(false) {
            return;
        }
        match self.scopes.pop() {
            Some(scope) => debug!("close scope '{}'", self.table.scope(scope).name),
            None => self.report(Fault::new(
                node,
                SemanticError::FatalInternal("scope stack underflow".into()),
            )),
        }
    }
}

impl<'a, 's> Walker<'a> for Analyzer<'a, 's> {
    fn enter(&mut self, node: &'a Node) {
        let result = match &node.kind {
            NodeKind::Declaration(DeclKind::Function) => self.declare_function(node),
            NodeKind::Declaration(DeclKind::Variable(_)) => self.declare_variable(node),
            NodeKind::Parameter(_) => self.declare_parameter(node),
            NodeKind::Statement(StmtKind::Compound) => {
                self.enter_compound();
                Ok(())
            }
            NodeKind::Statement(StmtKind::If | StmtKind::Iteration) => self.check_condition(node),
            NodeKind::Statement(StmtKind::Return) => self.check_return(node),
            NodeKind::Expression(ExprKind::Identifier(shape)) => {
                self.check_identifier(node, *shape)
            }
            NodeKind::Expression(ExprKind::Call) => self.check_call(node),
            NodeKind::Expression(ExprKind::Assign) => self.check_assign(node),
            NodeKind::Expression(ExprKind::BinaryOp(_)) => self.check_operator(node),
            NodeKind::Expression(ExprKind::Constant(_)) | NodeKind::TypeSpec => Ok(()),
        };
        if let Err(fault) = result {
            self.report(fault);
        }
    }

    fn leave(&mut self, node: &'a Node) {
        match node.kind {
            NodeKind::Statement(StmtKind::Compound) => self.close_scope(node),
            NodeKind::Declaration(DeclKind::Function) => {
                self.close_scope(node);
                self.function = None;
                self.entering_function_body = false;
            }
            _ => {}
        }
    }
}
