//! Error types for loading, compositing and exporting sequences.

/// Top-level error type for animpal operations.
#[derive(Debug, thiserror::Error)]
pub enum AnimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Encoder error: {message}")]
    Encoder { message: String },

    #[error("Video encoder not available: {message}")]
    EncoderUnavailable { message: String },

    #[error("Export cancelled")]
    Cancelled,

    #[error("The image sequence is empty")]
    EmptySequence,

    #[error("Invalid setting: {message}")]
    InvalidSetting { message: String },

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Result type alias using AnimError.
pub type AnimResult<T> = Result<T, AnimError>;

impl AnimError {
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder {
            message: msg.into(),
        }
    }

    pub fn invalid_setting(msg: impl Into<String>) -> Self {
        Self::InvalidSetting {
            message: msg.into(),
        }
    }
}
