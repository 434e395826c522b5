//! Error types for duet-mixer
//!
//! Every failure of a generate or transcribe operation is reported as one of
//! four tagged categories, plus configuration errors raised before any
//! operation starts.

use thiserror::Error;

/// Main error type for duet-mixer
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unreadable caption file, zero captions, or bad caption timing
    #[error("{0}")]
    Input(String),

    /// Original recording required but absent or undecodable
    #[error("{0}")]
    MissingSource(String),

    /// Synthesis or transcription provider failure (provider message verbatim)
    #[error("{0}")]
    ExternalService(String),

    /// Output container serialization or file write failure
    #[error("{0}")]
    Encode(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Taxonomy tag reported alongside the message
    pub fn tag(&self) -> &'static str {
        match self {
            Error::Input(_) => "InputError",
            Error::MissingSource(_) => "MissingSourceError",
            Error::ExternalService(_) => "ExternalServiceError",
            Error::Encode(_) => "EncodeError",
            Error::Config(_) => "ConfigError",
        }
    }

    /// Structured form for user-visible reporting
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "tag": self.tag(),
                "message": self.to_string(),
            }
        })
    }
}

impl From<duet_common::Error> for Error {
    fn from(err: duet_common::Error) -> Self {
        match err {
            duet_common::Error::Config(msg) => Error::Config(msg),
            other => Error::Input(other.to_string()),
        }
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        Error::Encode(format!("WAV encode failed: {}", err))
    }
}

impl From<symphonia::core::errors::Error> for Error {
    fn from(err: symphonia::core::errors::Error) -> Self {
        Error::MissingSource(format!("Original recording undecodable: {}", err))
    }
}

/// Bare I/O failures only arise while writing artifacts; reads map explicitly
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Encode(format!("Failed to write output: {}", err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::ExternalService(err.to_string())
    }
}

/// Convenience Result type using duet-mixer Error
pub type Result<T> = std::result::Result<T, Error>;
