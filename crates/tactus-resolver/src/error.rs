//! Resolution errors.

use tactus_core::NodeId;
use thiserror::Error;

/// The error taxonomy of the resolution pipeline.
///
/// Every variant carries the id of the offending node; the driver hands the
/// id and the rendered message to the caller's report callback and stops.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("no possible interpretations")]
    NoInterpretations { node: NodeId },

    #[error("{count} possible interpretations:{details}")]
    AmbiguousInterpretations {
        node: NodeId,
        count: usize,
        details: String,
    },

    #[error("unterminated anacrusis")]
    UnterminatedAnacrusis { node: NodeId },

    #[error("missing octave mark")]
    MissingOctaveMark { node: NodeId },

    #[error("too many staves in part")]
    TooManyStaves { node: NodeId },
}

impl CompileError {
    pub fn node(&self) -> NodeId {
        match self {
            CompileError::NoInterpretations { node } => *node,
            CompileError::AmbiguousInterpretations { node, .. } => *node,
            CompileError::UnterminatedAnacrusis { node } => *node,
            CompileError::MissingOctaveMark { node } => *node,
            CompileError::TooManyStaves { node } => *node,
        }
    }
}
