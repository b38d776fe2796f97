//! Error types for the agent

use thiserror::Error;

/// A previous-round payload that could not be turned into a [`crate::round::Round`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoundError {
    #[error("malformed round payload: {reason} in '{payload}'")]
    Malformed { reason: String, payload: String },
}

/// A strategy could not produce a move this round.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("needs {needed} completed rounds, have {have}")]
    InsufficientHistory { needed: usize, have: usize },

    #[error("{signal} has no prediction")]
    NoPrediction { signal: String },

    #[error("non-finite value {value} in table row '{state}'")]
    NonFinite { state: String, value: f64 },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection closed by the server")]
    Disconnected,

    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid configuration: {message}")]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        ConfigError {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
