pub mod analyzer;
pub mod binder;
pub mod builtins;
pub mod errors;
pub mod listing;
pub mod scope;
pub mod type_checker;

use cminus_common::DiagnosticSink;

use crate::ast::Node;

pub use analyzer::Analyzer;
pub use errors::SemanticError;
pub use listing::{ScopeSnapshot, SymbolSnapshot};
pub use scope::{ScopeId, ScopeStack, Symbol, SymbolClass, SymbolId, SymbolTable};

/// Options for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    /// Render the final symbol table into [`Analysis::listing`].
    pub trace: bool,
}

/// Result of analyzing one program.
#[derive(Debug)]
pub struct Analysis<'a> {
    /// Every scope created during the pass, including the builtins in the
    /// global scope.
    pub symbols: SymbolTable<'a>,
    /// Number of diagnostics reported.
    pub error_count: usize,
    /// Height of the scope stack after the pass; 1 when balanced.
    pub open_scopes: usize,
    pub listing: Option<String>,
}

impl Analysis<'_> {
    /// Whether the program may proceed to code generation.
    pub fn is_accepted(&self) -> bool {
        self.error_count == 0
    }
}

/// Bind and type-check the program rooted at `root`, reporting every
/// semantic error to `sink`.
///
/// The pass never stops early: a faulty construct is reported once and
/// analysis continues with the next node.
pub fn analyze<'a>(
    root: Option<&'a Node>,
    sink: &mut dyn DiagnosticSink,
    config: &AnalyzerConfig,
) -> Analysis<'a> {
    let mut analysis = Analyzer::new(sink).run(root);
    if config.trace {
        analysis.listing = Some(analysis.symbols.listing());
    }
    analysis
}
