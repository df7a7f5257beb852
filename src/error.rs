//! Library error types.

use thiserror::Error;

/// Errors surfaced by the watermark component.
#[derive(Debug, Error)]
pub enum WatermarkError {
    /// The host surface could not produce a 2-D drawing context.  Fatal at
    /// construction; the caller never receives a partial instance.
    #[error("surface cannot provide a 2-D drawing context")]
    ContextUnavailable,

    /// Decoding or encoding failed; file-system errors arrive wrapped here
    /// as `ImageError::IoError`.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T, E = WatermarkError> = std::result::Result<T, E>;
