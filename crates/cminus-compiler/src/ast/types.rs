use serde::{Deserialize, Serialize};

/// The two data types of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Type {
    #[default]
    Int,
    Void,
}

impl Type {
    /// Name used in symbol-table listings.
    pub fn display_name(self) -> &'static str {
        match self {
            Type::Int => "INT",
            Type::Void => "VOID",
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.display_name())
    }
}
