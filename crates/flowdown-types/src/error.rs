//! Error hierarchy for flowdown.

use thiserror::Error;

/// Errors surfaced by the render pipeline.
///
/// The parser itself never fails on content; malformed Markdown degrades
/// to literal text. Only I/O and construction problems surface here.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("read: {0}")]
    Read(#[source] std::io::Error),

    #[error("write: {0}")]
    Write(#[source] std::io::Error),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Errors from the optional input validator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("invalid utf-8 input")]
    InvalidUtf8,

    #[error("binary input detected")]
    BinaryInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_error_messages() {
        let err = RenderError::InvalidChunkSize;
        assert_eq!(err.to_string(), "chunk size must be greater than zero");

        let err = RenderError::Read(std::io::Error::other("boom"));
        assert!(err.to_string().starts_with("read:"));
    }

    #[test]
    fn validate_error_messages() {
        assert_eq!(ValidateError::InvalidUtf8.to_string(), "invalid utf-8 input");
        assert_eq!(
            ValidateError::BinaryInput.to_string(),
            "binary input detected"
        );
    }
}
