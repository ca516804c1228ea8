//! Symbol-table listing and serialisable snapshots.

use std::fmt;

use serde::Serialize;

use crate::ast::Type;

use super::scope::{SymbolClass, SymbolTable};

/// One scope of a finished analysis, detached from the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeSnapshot {
    pub name: String,
    pub depth: usize,
    pub parent: Option<usize>,
    pub symbols: Vec<SymbolSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolSnapshot {
    pub name: String,
    pub class: String,
    pub ty: Type,
    pub lines: Vec<u32>,
}

struct Listing<'t, 'a>(&'t SymbolTable<'a>);

impl fmt::Display for Listing<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-----Symbol Table-----")?;
        writeln!(f, "Symbol Name  Symbol Type   Data Type    Line Numbers")?;
        writeln!(f, "-----------  -----------  -----------  --------------")?;

        for (id, scope) in self.0.scopes() {
            if id.index() == 0 {
                writeln!(f, "global  depth: {}", scope.depth)?;
            } else {
                writeln!(f, "{}  depth: {}", scope.name, scope.depth)?;
            }
            for symbol in scope.symbols() {
                let class = symbol.class().map(SymbolClass::label).unwrap_or("?");
                write!(f, "{:<13}{:<13}{:<13}", symbol.name, class, symbol.ty)?;
                for line in &symbol.lines {
                    write!(f, "{:>3} ", line)?;
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl SymbolTable<'_> {
    /// Render every scope, in creation order, as a fixed-width table.
    pub fn listing(&self) -> String {
        Listing(self).to_string()
    }

    pub fn snapshot(&self) -> Vec<ScopeSnapshot> {
        self.scopes()
            .map(|(_, scope)| ScopeSnapshot {
                name: scope.name.clone(),
                depth: scope.depth,
                parent: scope.parent.map(|p| p.index()),
                symbols: scope
                    .symbols()
                    .iter()
                    .map(|symbol| SymbolSnapshot {
                        name: symbol.name.clone(),
                        class: symbol
                            .class()
                            .map(SymbolClass::label)
                            .unwrap_or("?")
                            .to_string(),
                        ty: symbol.ty,
                        lines: symbol.lines.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}
