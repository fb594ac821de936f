use reqwest::StatusCode;
use thiserror::Error;

use crate::{session::Phase, snapshot::DecodeError};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{endpoint} request failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },
    #[error("{endpoint} returned an unreadable body: {detail}")]
    Body {
        endpoint: &'static str,
        detail: String,
    },
    #[error("could not build the {endpoint} url: {detail}")]
    Url {
        endpoint: &'static str,
        detail: String,
    },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("transport fault: {0}")]
    Transport(#[from] TransportError),
    #[error("the server refused to let this client join")]
    JoinRefused,
    #[error("rejected by server: {0}")]
    Rejected(String),
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("{command} is not allowed while {phase:?}")]
    InvalidPhase { command: &'static str, phase: Phase },
    #[error("session was shut down")]
    Cancelled,
    #[error("session has halted after a fatal error")]
    Halted,
}

impl SessionError {
    /// Fatal errors end the session; the rest leave it usable.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SessionError::Rejected(_) | SessionError::InvalidPhase { .. }
        )
    }
}

impl From<DecodeError> for SessionError {
    fn from(error: DecodeError) -> Self {
        match error {
            DecodeError::Malformed(detail) => SessionError::MalformedSnapshot(detail),
            DecodeError::ProtocolViolation(detail) => SessionError::ProtocolViolation(detail),
        }
    }
}
