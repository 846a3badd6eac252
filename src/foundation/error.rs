/// Convenience result type used across Cadenza.
pub type CadenzaResult<T> = Result<T, CadenzaError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Job-level failures (generation, render, retry exhaustion) never surface
/// here; they settle as fallbacks inside a batch. This enum covers the
/// batch-fatal cases only.
#[derive(thiserror::Error, Debug)]
pub enum CadenzaError {
    /// Invalid user-provided parameters or batch configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors in session bookkeeping or scratch resource management.
    #[error("session error: {0}")]
    Session(String),

    /// Errors in the shared-document preserve/restore discipline.
    #[error("document error: {0}")]
    Document(String),

    /// Errors writing rendered previews to disk.
    #[error("render output error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CadenzaError {
    /// Build a [`CadenzaError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CadenzaError::Session`] value.
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Build a [`CadenzaError::Document`] value.
    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document(msg.into())
    }

    /// Build a [`CadenzaError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
