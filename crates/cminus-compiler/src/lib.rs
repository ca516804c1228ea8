pub mod ast;
pub mod semantic;
