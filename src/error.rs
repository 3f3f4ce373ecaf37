//! Error types for relayout library.

use std::io;
use thiserror::Error;

/// Result type alias for relayout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout reconstruction and serialization.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// There is no text to convert and no metadata could be extracted.
    #[error("Nothing to convert: input has no text items and no metadata")]
    InputEmpty,

    /// The input records could not be read.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A page carries geometry that cannot be laid out.
    ///
    /// Raised inside page analysis only; the pipeline absorbs it and emits an
    /// empty page instead.
    #[error("Malformed page {page}: {reason}")]
    MalformedPage {
        /// Page number (1-indexed)
        page: u32,
        /// What was wrong with it
        reason: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing WordprocessingML failed.
    #[error("XML writer error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Writing the DOCX container failed.
    #[error("ZIP container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Error during rendering.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Whether the pipeline recovers from this error by degrading output.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::MalformedPage { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InputEmpty;
        assert_eq!(
            err.to_string(),
            "Nothing to convert: input has no text items and no metadata"
        );

        let err = Error::MalformedPage {
            page: 3,
            reason: "non-finite x".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed page 3: non-finite x");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::MalformedPage {
            page: 1,
            reason: String::new()
        }
        .is_recoverable());
        assert!(!Error::InputEmpty.is_recoverable());
    }
}
