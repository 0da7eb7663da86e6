//! Error types for lumask-mask

use thiserror::Error;

/// Errors that can occur during mask generation
#[derive(Debug, Error)]
pub enum MaskError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] lumask_core::Error),

    /// Filter library error
    #[error("filter error: {0}")]
    Filter(#[from] lumask_filter::FilterError),

    /// Image too small for the gradient stencil
    #[error("image {width}x{height} too small, need at least 5x5")]
    ImageTooSmall { width: u32, height: u32 },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for mask operations
pub type MaskResult<T> = Result<T, MaskError>;
