use thiserror::Error;

/// Failure taxonomy for catalog construction and engine queries.
///
/// All variants are deterministic for a given input; none are
/// retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed catalog: unknown id reference, threshold out of range,
    /// or a prerequisite cycle. Fatal for that catalog.
    #[error("invalid catalog: {reason}")]
    Validation { reason: String },

    #[error("concept not found: {0}")]
    ConceptNotFound(String),

    #[error("learning path not found: {0}")]
    PathNotFound(String),

    /// A path whose sequence is empty has no meaningful progress.
    #[error("learning path {0} has an empty sequence")]
    EmptyPath(String),
}

impl EngineError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}
