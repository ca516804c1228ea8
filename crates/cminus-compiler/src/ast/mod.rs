pub mod build;
pub mod json;
pub mod nodes;
pub mod traverse;
pub mod types;

pub use nodes::*;
pub use traverse::{traverse, Walker};
pub use types::Type;
