//! Declaration binding and scope lifecycle.

use crate::ast::{Node, Type};

use super::analyzer::{Analyzer, Check, Fault, FunctionFrame};
use super::errors::SemanticError;

impl<'a, 's> Analyzer<'a, 's> {
    /// Bind a function in the enclosing scope and open its scope.
    ///
    /// The scope is opened even when the name is already taken, so the
    /// parameters of a rejected redefinition stay out of the enclosing scope.
    /// Returns inside a rejected function are still checked against its own
    /// declared type.
    pub(crate) fn declare_function(&mut self, node: &'a Node) -> Check<'a> {
        let bound = self.bind_function(node);

        let name = node.name.clone().unwrap_or_default();
        self.open_scope(name.clone());
        self.opened.push(true);
        self.function = Some(FunctionFrame {
            name,
            return_type: node.ty,
        });
        self.entering_function_body = true;

        bound
    }

    fn bind_function(&mut self, node: &'a Node) -> Check<'a> {
        let name = Self::name_of(node)?;
        let scope = self.scopes.current();
        if let Some(existing) = self.table.lookup_local(scope, name) {
            let previous = self.table.symbol(existing).declared_at();
            return Err(
                Fault::new(node, SemanticError::RedefinedFunction(name.to_string()))
                    .previously_at(previous),
            );
        }
        self.table.insert(scope, name, node.ty, node.line, node);
        Ok(())
    }

    pub(crate) fn declare_variable(&mut self, node: &'a Node) -> Check<'a> {
        let name = Self::name_of(node)?;
        if node.ty == Type::Void {
            return Err(Fault::new(
                node,
                SemanticError::VoidVariable(name.to_string()),
            ));
        }
        let scope = self.scopes.current();
        if let Some(existing) = self.table.lookup_local(scope, name) {
            let previous = self.table.symbol(existing).declared_at();
            return Err(
                Fault::new(node, SemanticError::RedefinedVariable(name.to_string()))
                    .previously_at(previous),
            );
        }
        self.table.insert(scope, name, node.ty, node.line, node);
        Ok(())
    }

    /// Bind a parameter in the function scope. A `void` parameter marks an
    /// empty list and binds nothing.
    pub(crate) fn declare_parameter(&mut self, node: &'a Node) -> Check<'a> {
        if node.ty == Type::Void {
            return Ok(());
        }
        let name = Self::name_of(node)?;
        let scope = self.scopes.current();
        if let Some(existing) = self.table.lookup_local(scope, name) {
            let previous = self.table.symbol(existing).declared_at();
            return Err(
                Fault::new(node, SemanticError::RedefinedParameter(name.to_string()))
                    .previously_at(previous),
            );
        }
        self.table.insert(scope, name, node.ty, node.line, node);
        Ok(())
    }

    /// A function's own body shares the function scope; any other compound
    /// statement opens a block scope named after its enclosing scope.
    pub(crate) fn enter_compound(&mut self) {
        if std::mem::take(&mut self.entering_function_body) {
            self.opened.push(false);
            return;
        }
        let name = self.table.scope(self.scopes.current()).name.clone();
        self.open_scope(name);
        self.opened.push(true);
    }
}
