//! Error types shared across Reelcut crates.

use std::path::PathBuf;

/// Top-level error type for Reelcut operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelcutError {
    /// A source could not be decoded at the requested instant.
    ///
    /// Recovered locally by the compositor and the audio mixer.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The encoder rejected a frame or audio submission.
    #[error("Encoder rejected submission at {timestamp_secs:.4}s: {message}")]
    EncodeSubmission { timestamp_secs: f64, message: String },

    /// No encodable container/codec pair was found.
    #[error("Unsupported output format: {message}")]
    UnsupportedFormat { message: String },

    /// Timeline data or a derived value broke a model invariant.
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("Export cancelled")]
    Cancelled,

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelcutError.
pub type ReelcutResult<T> = Result<T, ReelcutError>;

impl ReelcutError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn encode_submission(timestamp_secs: f64, msg: impl Into<String>) -> Self {
        Self::EncodeSubmission {
            timestamp_secs,
            message: msg.into(),
        }
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: msg.into(),
        }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether a per-source failure can be replaced by a blank picture or
    /// silence. Broken invariants and cancellation always propagate.
    pub fn is_recoverable_source_error(&self) -> bool {
        !matches!(self, Self::InvariantViolation { .. } | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_submission_message_includes_timestamp() {
        let err = ReelcutError::encode_submission(1.0 / 30.0, "queue closed");
        let text = err.to_string();
        assert!(text.contains("0.0333s"));
        assert!(text.contains("queue closed"));
    }

    #[test]
    fn test_recoverable_source_errors() {
        assert!(ReelcutError::decode("bad frame").is_recoverable_source_error());
        assert!(ReelcutError::FileNotFound {
            path: PathBuf::from("/gone.wav")
        }
        .is_recoverable_source_error());
        assert!(
            ReelcutError::Io(std::io::Error::other("spawn failed")).is_recoverable_source_error()
        );
        assert!(!ReelcutError::invariant("out <= in").is_recoverable_source_error());
        assert!(!ReelcutError::Cancelled.is_recoverable_source_error());
    }
}
