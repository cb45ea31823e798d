//! Message envelopes exchanged between agents.
//!
//! On the wire every message is a JSON object
//! `{type, tag, message?, ntuple?, original?, text?}`. In memory it is an
//! [`Envelope`], one variant per `type`, with [`Envelope::Unrecognized`] for
//! types this agent does not know about.

use dialog_ntuple::Ntuple;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope is not a valid message object: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("envelope has no type")]
    MissingType,

    #[error("{kind} envelope is missing '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

/// The raw wire form of an envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireEnvelope {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ntuple: Option<Ntuple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Ntuple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

pub const STANDARD: &str = "standard";
pub const CLARIFICATION: &str = "clarification";
pub const ID_FAILURE: &str = "id_failure";
pub const RESPONSE: &str = "response";
pub const ERROR_DESCRIPTOR: &str = "error_descriptor";

/// A decoded message.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// A plain utterance from a text or speech agent.
    Standard {
        tag: Option<String>,
        text: Option<String>,
    },
    /// Either direction of a clarification sub-dialogue: the solver's
    /// request (`ntuple`), the prompt to the user (`message`, `original`),
    /// or the user's answer (`text`, `original`).
    Clarification {
        tag: Option<String>,
        message: Option<String>,
        ntuple: Option<Ntuple>,
        original: Option<Ntuple>,
        text: Option<String>,
    },
    /// The solver could not identify a referent.
    IdFailure { tag: String, message: String },
    /// The solver's answer to a request.
    Response { tag: String, message: String },
    /// The solver reports an error in the request.
    ErrorDescriptor { tag: String, message: String },
    /// A `type` this agent does not handle.
    Unrecognized { kind: String },
}

impl Envelope {
    /// Decode a wire message.
    pub fn decode(value: Value) -> Result<Self, EnvelopeError> {
        let wire: WireEnvelope = serde_json::from_value(value)?;
        Envelope::try_from(wire)
    }

    /// The wire `type` of this envelope.
    pub fn kind(&self) -> &str {
        match self {
            Envelope::Standard { .. } => STANDARD,
            Envelope::Clarification { .. } => CLARIFICATION,
            Envelope::IdFailure { .. } => ID_FAILURE,
            Envelope::Response { .. } => RESPONSE,
            Envelope::ErrorDescriptor { .. } => ERROR_DESCRIPTOR,
            Envelope::Unrecognized { kind } => kind,
        }
    }

    /// The clarification prompt sent to the text channel.
    pub fn clarification_prompt(tag: String, message: String, original: Ntuple) -> Self {
        Envelope::Clarification {
            tag: Some(tag),
            message: Some(message),
            ntuple: None,
            original: Some(original),
            text: None,
        }
    }

    pub fn into_wire(self) -> WireEnvelope {
        let kind = Some(self.kind().to_string());
        match self {
            Envelope::Standard { tag, text } => WireEnvelope {
                kind,
                tag,
                text,
                ..Default::default()
            },
            Envelope::Clarification {
                tag,
                message,
                ntuple,
                original,
                text,
            } => WireEnvelope {
                kind,
                tag,
                message,
                ntuple,
                original,
                text,
            },
            Envelope::IdFailure { tag, message }
            | Envelope::Response { tag, message }
            | Envelope::ErrorDescriptor { tag, message } => WireEnvelope {
                kind,
                tag: Some(tag),
                message: Some(message),
                ..Default::default()
            },
            Envelope::Unrecognized { .. } => WireEnvelope {
                kind,
                ..Default::default()
            },
        }
    }

    pub fn into_value(self) -> Result<Value, EnvelopeError> {
        Ok(serde_json::to_value(self.into_wire())?)
    }
}

fn required(
    value: Option<String>,
    kind: &'static str,
    field: &'static str,
) -> Result<String, EnvelopeError> {
    value.ok_or(EnvelopeError::MissingField { kind, field })
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        let kind = wire.kind.ok_or(EnvelopeError::MissingType)?;

        Ok(match kind.as_str() {
            STANDARD => Envelope::Standard {
                tag: wire.tag,
                text: wire.text,
            },
            CLARIFICATION => Envelope::Clarification {
                tag: wire.tag,
                message: wire.message,
                ntuple: wire.ntuple,
                original: wire.original,
                text: wire.text,
            },
            ID_FAILURE => Envelope::IdFailure {
                tag: required(wire.tag, ID_FAILURE, "tag")?,
                message: required(wire.message, ID_FAILURE, "message")?,
            },
            RESPONSE => Envelope::Response {
                tag: required(wire.tag, RESPONSE, "tag")?,
                message: required(wire.message, RESPONSE, "message")?,
            },
            ERROR_DESCRIPTOR => Envelope::ErrorDescriptor {
                tag: required(wire.tag, ERROR_DESCRIPTOR, "tag")?,
                message: required(wire.message, ERROR_DESCRIPTOR, "message")?,
            },
            _ => Envelope::Unrecognized { kind },
        })
    }
}
