//! Error types for the kiosk voice check-in

use thiserror::Error;

/// Result type alias for check-in operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// No recognition engine in this runtime
    #[error("voice input is not available")]
    VoiceUnavailable,

    /// Another consumer holds the voice engines
    #[error("voice engines are held by {0}")]
    VoiceBusy(String),

    /// Speech engine failure (spawn, device, process)
    #[error("engine error: {0}")]
    Engine(String),

    /// Appointment search failure
    #[error("search error: {0}")]
    Search(String),

    /// Search endpoint throttled us
    #[error("search rate limited")]
    RateLimited,

    /// Language tag outside the supported set
    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    /// The driver has shut down
    #[error("check-in driver is not running")]
    ChannelClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
