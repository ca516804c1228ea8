use thiserror::Error;

use crate::ast::Type;

/// Semantic errors reported while binding and checking a program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("redefined function '{0}'")]
    RedefinedFunction(String),

    #[error("redefined variable '{0}'")]
    RedefinedVariable(String),

    #[error("redefined parameter '{0}'")]
    RedefinedParameter(String),

    #[error("variable '{0}' cannot be void")]
    VoidVariable(String),

    #[error("undeclared symbol '{0}'")]
    UndeclaredSymbol(String),

    #[error("call to '{name}' expects {expected} argument(s), found {found}")]
    DifferentParameterCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("wrong parameter type for argument {position} of '{name}': {detail}")]
    WrongParameterType {
        name: String,
        position: usize,
        detail: String,
    },

    #[error("return type mismatch in '{function}': {expected} should be returned")]
    ReturnTypeMismatch { function: String, expected: Type },

    #[error("incompatible use of '{name}': {detail}")]
    IncompatibleUse { name: String, detail: String },

    #[error("internal error: {0}")]
    FatalInternal(String),
}

impl SemanticError {
    pub(crate) fn wrong_parameter(name: &str, position: usize, detail: impl Into<String>) -> Self {
        SemanticError::WrongParameterType {
            name: name.to_string(),
            position,
            detail: detail.into(),
        }
    }

    pub(crate) fn incompatible(name: &str, detail: impl Into<String>) -> Self {
        SemanticError::IncompatibleUse {
            name: name.to_string(),
            detail: detail.into(),
        }
    }
}
