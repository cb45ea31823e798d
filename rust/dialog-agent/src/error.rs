//! Error types for the user agent.

use thiserror::Error;

use crate::transport::TransportError;

/// A span range that does not fit the tokenized sentence.
///
/// This points at an analyzer defect, so it is propagated to the caller
/// instead of being treated like a per-candidate specialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error("span {id} range [{start}, {end}) is outside the {len} tokens of the sentence")]
    OutOfRangeSpan {
        id: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Why an inbound message could not be routed.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("malformed message on {channel}: {reason}")]
    MalformedMessage { channel: String, reason: String },

    #[error(transparent)]
    Align(#[from] AlignError),
}

impl RouterError {
    pub(crate) fn malformed(channel: &str, reason: impl Into<String>) -> Self {
        RouterError::MalformedMessage {
            channel: channel.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors that stop the agent itself.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("analyzer at {endpoint} failed during startup: {reason}")]
    Startup { endpoint: String, reason: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}
