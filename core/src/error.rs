//! Error types for the Bento client.
//!
//! # Design
//! Transport-level failures (`Transport`, `InvalidResponse`) are kept apart
//! from `Business`, which means the service answered with a well-formed
//! error envelope. `UnexpectedState` covers updates the service accepted but
//! did not apply, so callers can branch on it without parsing messages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::CardStatus;

/// Shorthand for results produced by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by `Session` and card operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection, TLS or timeout failure while talking to the service.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The response body was not syntactically valid JSON.
    #[error("server returned non-json value: [{body}]")]
    InvalidResponse { body: String },

    /// `POST /sessions` answered without an `Authorization` header.
    #[error("server did not return an authorization token")]
    MissingAuthToken,

    /// The service answered with an error envelope.
    #[error(transparent)]
    Business(#[from] BusinessError),

    /// The service accepted a status change but echoed a different status.
    #[error("bento returned success for {requested}, but card's status is: {}", display_status(.actual))]
    UnexpectedState {
        requested: CardStatus,
        actual: Option<CardStatus>,
    },

    /// A card operation was attempted on a record without `cardId`.
    #[error("card record has no cardId")]
    MissingCardId,

    /// A request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A response body did not match the expected resource shape.
    #[error("deserialization failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// A credential environment variable was unset or not unicode.
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

impl Error {
    /// Wraps any error as a transport failure.
    pub fn transport(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Transport(err.into())
    }

    /// Returns the business error payload, if this is one.
    pub fn as_business(&self) -> Option<&BusinessError> {
        match self {
            Error::Business(err) => Some(err),
            _ => None,
        }
    }
}

fn display_status(status: &Option<CardStatus>) -> String {
    match status {
        Some(status) => status.to_string(),
        None => String::new(),
    }
}

/// Error envelope embedded in a response body.
///
/// Both fields are optional on the wire; an envelope only counts as an error
/// when at least one of them is non-empty (see [`crate::classify`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, rename = "error", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl BusinessError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            code: Some(code.into()),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or_default()
    }

    /// True when neither field carries any text.
    pub fn is_empty(&self) -> bool {
        self.message().is_empty() && self.code().is_empty()
    }
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bento Error: [{}], [{}]", self.message(), self.code())
    }
}

impl std::error::Error for BusinessError {}
