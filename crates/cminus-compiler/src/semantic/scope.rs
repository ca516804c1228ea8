use std::collections::HashMap;

use log::trace;

use crate::ast::{sibling_list, DeclKind, Node, NodeKind, Shape, Type};

use super::errors::SemanticError;

/// Handle to a scope in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a symbol entry within one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId {
    pub scope: ScopeId,
    slot: usize,
}

/// How a symbol was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolClass {
    Function,
    Var,
    ArrVar,
    VarPar,
    ArrVarPar,
}

impl SymbolClass {
    /// Classify a declaring node. Anything other than a declaration or a
    /// parameter cannot declare a symbol.
    pub fn of(node: &Node) -> Result<Self, SemanticError> {
        match node.kind {
            NodeKind::Declaration(DeclKind::Function) => Ok(SymbolClass::Function),
            NodeKind::Declaration(DeclKind::Variable(Shape::Scalar)) => Ok(SymbolClass::Var),
            NodeKind::Declaration(DeclKind::Variable(Shape::Array)) => Ok(SymbolClass::ArrVar),
            NodeKind::Parameter(Shape::Scalar) => Ok(SymbolClass::VarPar),
            NodeKind::Parameter(Shape::Array) => Ok(SymbolClass::ArrVarPar),
            ref other => Err(SemanticError::FatalInternal(format!(
                "symbol declared by a {:?} node at line {}",
                other, node.line
            ))),
        }
    }

    /// Shape of a value-carrying symbol; functions have none.
    pub fn shape(self) -> Option<Shape> {
        match self {
            SymbolClass::Function => None,
            SymbolClass::Var | SymbolClass::VarPar => Some(Shape::Scalar),
            SymbolClass::ArrVar | SymbolClass::ArrVarPar => Some(Shape::Array),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SymbolClass::Function => "Function",
            SymbolClass::Var => "Var",
            SymbolClass::ArrVar => "ArrVar",
            SymbolClass::VarPar => "VarPar",
            SymbolClass::ArrVarPar => "ArrVarPar",
        }
    }
}

/// One name bound in one scope.
#[derive(Debug, Clone)]
pub struct Symbol<'a> {
    pub name: String,
    pub ty: Type,
    /// The declaration or parameter node that introduced the name.
    pub decl: &'a Node,
    /// Declaration line followed by every use site, in visit order.
    pub lines: Vec<u32>,
}

impl<'a> Symbol<'a> {
    pub fn class(&self) -> Result<SymbolClass, SemanticError> {
        SymbolClass::of(self.decl)
    }

    pub fn declared_at(&self) -> u32 {
        self.lines.first().copied().unwrap_or(self.decl.line)
    }

    /// Declared parameters of a function symbol, excluding the `void`
    /// marker of an empty list.
    pub fn parameters(&self) -> impl Iterator<Item = &'a Node> {
        sibling_list(self.decl.child(1)).filter(|p| p.ty != Type::Void)
    }
}

/// A lexical scope.
#[derive(Debug)]
pub struct Scope<'a> {
    pub name: String,
    pub parent: Option<ScopeId>,
    /// Height of the scope stack when this scope was created.
    pub depth: usize,
    index: HashMap<String, usize>,
    symbols: Vec<Symbol<'a>>,
}

impl<'a> Scope<'a> {
    /// Symbols in declaration order.
    pub fn symbols(&self) -> &[Symbol<'a>] {
        &self.symbols
    }

    pub fn get(&self, name: &str) -> Option<&Symbol<'a>> {
        self.index.get(name).map(|&slot| &self.symbols[slot])
    }
}

/// Every scope created during analysis, linked by parent handles.
///
/// Scopes are never removed: leaving a block only pops its handle from the
/// [`ScopeStack`], so the table can still be listed after the pass.
#[derive(Debug, Default)]
pub struct SymbolTable<'a> {
    scopes: Vec<Scope<'a>>,
}

impl<'a> SymbolTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_scope(
        &mut self,
        name: impl Into<String>,
        parent: Option<ScopeId>,
        depth: usize,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.into(),
            parent,
            depth,
            index: HashMap::new(),
            symbols: Vec::new(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope<'a> {
        &self.scopes[id.0]
    }

    /// All scopes in creation order.
    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope<'a>)> {
        self.scopes.iter().enumerate().map(|(i, s)| (ScopeId(i), s))
    }

    /// The first scope created, if any.
    pub fn global(&self) -> Option<ScopeId> {
        (!self.scopes.is_empty()).then_some(ScopeId(0))
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol<'a> {
        &self.scopes[id.scope.0].symbols[id.slot]
    }

    /// Look up `name` in `scope` only.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.0]
            .index
            .get(name)
            .map(|&slot| SymbolId { scope, slot })
    }

    /// Look up `name` in `scope`, then outward through its parents. The
    /// innermost binding wins.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(found) = self.lookup_local(id, name) {
                return Some(found);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    /// Bind `name` in `scope`. If the scope already binds it, `line` is
    /// recorded as another occurrence instead.
    pub fn insert(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: Type,
        line: u32,
        decl: &'a Node,
    ) -> SymbolId {
        if let Some(existing) = self.lookup_local(scope, name) {
            self.record_use(existing, line);
            return existing;
        }
        let target = &mut self.scopes[scope.0];
        let slot = target.symbols.len();
        target.symbols.push(Symbol {
            name: name.to_string(),
            ty,
            decl,
            lines: vec![line],
        });
        target.index.insert(name.to_string(), slot);
        trace!("bound '{}' in scope '{}' (depth {})", name, target.name, target.depth);
        SymbolId { scope, slot }
    }

    pub fn record_use(&mut self, id: SymbolId, line: u32) {
        self.scopes[id.scope.0].symbols[id.slot].lines.push(line);
    }
}

/// The currently open scopes, innermost last.
///
/// The outermost scope is never popped.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<ScopeId>,
}

impl ScopeStack {
    pub fn new(root: ScopeId) -> Self {
        Self { frames: vec![root] }
    }

    pub fn push(&mut self, scope: ScopeId) {
        self.frames.push(scope);
    }

    /// Pop the innermost scope, returning it. Returns `None` instead of
    /// popping the outermost scope.
    pub fn pop(&mut self) -> Option<ScopeId> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    pub fn current(&self) -> ScopeId {
        self.frames[self.frames.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
