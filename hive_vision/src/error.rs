use thiserror::Error;

/// Errors produced by the vision stages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VisionError {
    /// The input frame cannot be analysed (zero width or height).
    #[error("invalid image: {0}")]
    InvalidImage(String),
}
