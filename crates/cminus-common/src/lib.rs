pub mod errors;

pub use errors::{Diagnostic, DiagnosticBag, DiagnosticSink, RelatedLine};
