// Error handling for the player facade

use thiserror::Error;

/// Failure raised by the data-source layer while loading media.
///
/// Delivered on the internal error channel, never to `Error` listeners, since
/// it can arrive before the session has reached any playback state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("load error: {message}")]
pub struct LoadError {
    pub message: String,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Player error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// Fatal engine fault during playback
    #[error("playback error: {message}")]
    Playback { message: String },

    /// Media could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The selected backend cannot play this content type
    #[error("{backend} backend does not support {content_type} content")]
    UnsupportedContentType {
        content_type: String,
        backend: String,
    },

    /// Content type string could not be parsed
    #[error("invalid content type: {0}")]
    InvalidContentType(String),

    /// Engine rejected the data source
    #[error("data source error: {0}")]
    DataSource(String),

    /// No engine factory is available for any backend
    #[error("no engine factory configured")]
    NoEngineFactory,

    /// Player configuration could not be read
    #[error("configuration error: {0}")]
    Config(String),
}

impl PlayerError {
    pub fn playback(message: impl Into<String>) -> Self {
        PlayerError::Playback {
            message: message.into(),
        }
    }
}

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
