pub mod diagnostics;
pub mod id;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use id::{Location, LocationMap, NodeId, NodeIdGen};
