use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for matching operations.
pub type MatchResult<T> = Result<T, MatchError>;

/// Errors from the template matcher and its inputs.
///
/// "Not detected" is not an error: searches return an empty match list.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid input raster '{name}': {reason}")]
    InvalidInput { name: String, reason: String },

    #[error("Invalid match configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read match configuration {path:?}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    #[error("Failed to write overlay image {path:?}: {source}")]
    OverlayWrite {
        path: PathBuf,
        source: image::ImageError,
    },
}

impl MatchError {
    pub fn invalid_input(name: impl Into<String>, reason: impl Into<String>) -> Self {
        MatchError::InvalidInput {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True when the caller supplied an unusable raster or resource, as opposed
    /// to a well-formed search that simply found nothing
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, MatchError::InvalidInput { .. })
    }
}
