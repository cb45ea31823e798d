//! The channel router: one session's turn controller.
//!
//! Every delivery is classified by the channel it arrived on and, for the
//! text and solver channels, by its envelope type:
//!
//! | channel | type                                   | outcome                                   |
//! |---------|----------------------------------------|-------------------------------------------|
//! | speech  | (ignored, always an utterance)         | parse → forward to solver                 |
//! | text    | `standard`                             | parse → forward to solver                 |
//! | text    | any, while a clarification is parked   | parse descriptor → merge → forward        |
//! | text    | `clarification` carrying `original`    | parse descriptor → merge → forward        |
//! | solver  | `id_failure`, `response`, `error_descriptor` | output sink                         |
//! | solver  | `clarification`                        | park original → prompt on text channel    |
//!
//! Anything else is malformed. Malformed messages and turns that yield no
//! n-tuple are reported to the [`Diagnostics`] hook and the router carries
//! on; only a misaligned span is returned to the caller.

use std::sync::Arc;

use dialog_ntuple::Ntuple;
use serde_json::Value;

use crate::analyzer::Analyzer;
use crate::channel::{ChannelKind, Channels};
use crate::clarification::{ClarificationRequest, ClarificationSlot, Resolution, Resolved};
use crate::diagnostic::{Diagnostics, DropReason, DroppedTurn};
use crate::envelope::{Envelope, EnvelopeError, WireEnvelope};
use crate::error::RouterError;
use crate::select::{Selection, Selector};
use crate::sink::OutputSink;
use crate::specializer::Specializer;

/// The field every n-tuple of a standard turn must carry to reach the solver.
pub const PREDICATE_TYPE: &str = "predicate_type";

/// Text that toggles the specializer's debug output instead of being parsed.
pub const DEBUG_TOGGLE: &str = "d";

/// A message the router wants published.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// An n-tuple for the solver, sent as the bare n-tuple.
    Ntuple { channel: String, ntuple: Ntuple },
    /// An envelope, such as a clarification prompt.
    Envelope { channel: String, envelope: Envelope },
}

impl Outbound {
    pub fn channel(&self) -> &str {
        match self {
            Outbound::Ntuple { channel, .. } | Outbound::Envelope { channel, .. } => channel,
        }
    }

    /// The JSON payload to publish.
    pub fn into_payload(self) -> Result<Value, EnvelopeError> {
        match self {
            Outbound::Ntuple { ntuple, .. } => Ok(Value::from(ntuple)),
            Outbound::Envelope { envelope, .. } => envelope.into_value(),
        }
    }
}

/// Routes deliveries for one session.
pub struct Router<A, S, O> {
    channels: Channels,
    selector: Selector<A, S>,
    slot: ClarificationSlot,
    sink: O,
    diagnostics: Arc<dyn Diagnostics>,
}

impl<A, S, O> Router<A, S, O>
where
    A: Analyzer,
    S: Specializer,
    O: OutputSink,
{
    pub fn new(
        channels: Channels,
        selector: Selector<A, S>,
        sink: O,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Router {
            channels,
            selector,
            slot: ClarificationSlot::default(),
            sink,
            diagnostics,
        }
    }

    pub fn slot(&self) -> &ClarificationSlot {
        &self.slot
    }

    /// Route one delivery and return what should be published.
    ///
    /// Malformed input is reported and yields nothing. A misaligned span is
    /// returned as [`RouterError::Align`].
    pub async fn route(
        &mut self,
        channel: &str,
        payload: Value,
    ) -> Result<Vec<Outbound>, RouterError> {
        let result = match self.channels.classify(channel) {
            Some(ChannelKind::Solver) => self.on_solver(channel, payload),
            Some(ChannelKind::Speech) => self.on_speech(channel, payload).await,
            Some(ChannelKind::Text) => self.on_text(channel, payload).await,
            None => Err(RouterError::malformed(channel, "not a channel of this agent")),
        };

        match result {
            Err(error @ RouterError::MalformedMessage { .. }) => {
                self.drop_turn(channel, None, DropReason::Malformed(error.to_string()));
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn on_solver(&mut self, channel: &str, payload: Value) -> Result<Vec<Outbound>, RouterError> {
        let envelope = decode(channel, payload)?;
        tracing::debug!(kind = envelope.kind(), "solver message");

        match envelope {
            Envelope::IdFailure { tag, message }
            | Envelope::Response { tag, message }
            | Envelope::ErrorDescriptor { tag, message } => {
                self.sink.output(&tag, &message);
                Ok(Vec::new())
            }
            Envelope::Clarification {
                tag,
                message,
                ntuple,
                ..
            } => {
                let missing = |field: &str| {
                    RouterError::malformed(channel, format!("clarification request without {field}"))
                };
                let request = ClarificationRequest {
                    tag: tag.ok_or_else(|| missing("tag"))?,
                    prompt: message.ok_or_else(|| missing("message"))?,
                    original: ntuple.ok_or_else(|| missing("ntuple"))?,
                };
                Ok(vec![self.park(channel, request)])
            }
            Envelope::Standard { .. } => Err(RouterError::malformed(
                channel,
                "standard messages are not accepted from the solver",
            )),
            Envelope::Unrecognized { kind } => Err(RouterError::malformed(
                channel,
                format!("unrecognized message type '{kind}'"),
            )),
        }
    }

    async fn on_speech(
        &mut self,
        channel: &str,
        payload: Value,
    ) -> Result<Vec<Outbound>, RouterError> {
        let wire: WireEnvelope = serde_json::from_value(payload)
            .map_err(|error| RouterError::malformed(channel, error.to_string()))?;
        let text = wire
            .text
            .ok_or_else(|| RouterError::malformed(channel, "speech message without text"))?
            .to_lowercase();

        tracing::info!(%text, "speech utterance");
        self.standard_turn(channel, &text).await
    }

    async fn on_text(
        &mut self,
        channel: &str,
        payload: Value,
    ) -> Result<Vec<Outbound>, RouterError> {
        let envelope = decode(channel, payload)?;

        match envelope {
            Envelope::Standard { text, .. } | Envelope::Clarification { text, .. }
                if self.slot.is_awaiting_descriptor() =>
            {
                let text = text.ok_or_else(|| {
                    RouterError::malformed(channel, "clarification answer without text")
                })?;
                self.parked_descriptor_turn(channel, &text).await
            }
            Envelope::Standard { text, .. } => match text.as_deref() {
                None | Some("") => Ok(Vec::new()),
                Some(text) if text.eq_ignore_ascii_case(DEBUG_TOGGLE) => {
                    let enabled = self.selector.specializer_mut().toggle_debug();
                    tracing::info!(enabled, "specializer debug toggled");
                    Ok(Vec::new())
                }
                Some(text) => self.standard_turn(channel, text).await,
            },
            Envelope::Clarification {
                text,
                original: Some(original),
                ..
            } => {
                let text = text.ok_or_else(|| {
                    RouterError::malformed(channel, "clarification answer without text")
                })?;
                self.carried_descriptor_turn(channel, &text, original).await
            }
            Envelope::Clarification { .. } => Err(RouterError::malformed(
                channel,
                "clarification answer with no parked or carried original",
            )),
            Envelope::IdFailure { .. }
            | Envelope::Response { .. }
            | Envelope::ErrorDescriptor { .. } => Err(RouterError::malformed(
                channel,
                "solver messages are not accepted on the text channel",
            )),
            Envelope::Unrecognized { kind } => Err(RouterError::malformed(
                channel,
                format!("unrecognized message type '{kind}'"),
            )),
        }
    }

    /// Parse an utterance and forward the n-tuple if the solver can take it.
    async fn standard_turn(
        &mut self,
        channel: &str,
        text: &str,
    ) -> Result<Vec<Outbound>, RouterError> {
        let Some(ntuple) = self.select(channel, text).await? else {
            return Ok(Vec::new());
        };

        if ntuple.get(PREDICATE_TYPE).is_none() {
            self.drop_turn(channel, Some(text), DropReason::NotForwardable(ntuple));
            return Ok(Vec::new());
        }

        Ok(self.forward(channel, text, ntuple))
    }

    /// Parse the answer to the parked clarification and merge it in.
    ///
    /// If the answer yields no descriptor, or one that leaves slots pending,
    /// the original stays parked.
    async fn parked_descriptor_turn(
        &mut self,
        channel: &str,
        text: &str,
    ) -> Result<Vec<Outbound>, RouterError> {
        let Some(descriptor) = self.select(channel, text).await? else {
            return Ok(Vec::new());
        };

        let Resolved { slot, resolution } = std::mem::take(&mut self.slot).resolve(&descriptor);
        self.slot = slot;

        match resolution {
            Resolution::Merged(merged) => Ok(self.forward(channel, text, merged)),
            Resolution::StillPending(paths) => {
                self.drop_turn(channel, Some(text), DropReason::PendingSlots(paths));
                Ok(Vec::new())
            }
            Resolution::NothingParked => Ok(Vec::new()),
        }
    }

    /// Merge the answer into the original the reply itself carries.
    async fn carried_descriptor_turn(
        &mut self,
        channel: &str,
        text: &str,
        original: Ntuple,
    ) -> Result<Vec<Outbound>, RouterError> {
        let Some(descriptor) = self.select(channel, text).await? else {
            return Ok(Vec::new());
        };

        Ok(self.forward(channel, text, original.clarify(&descriptor)))
    }

    async fn select(&mut self, channel: &str, text: &str) -> Result<Option<Ntuple>, RouterError> {
        match self.selector.select(text).await? {
            Selection::Selected(ntuple) => Ok(Some(ntuple)),
            Selection::Dropped(reason) => {
                self.drop_turn(channel, Some(text), reason);
                Ok(None)
            }
        }
    }

    fn park(&mut self, channel: &str, request: ClarificationRequest) -> Outbound {
        let parked = std::mem::take(&mut self.slot).park(request);
        self.slot = parked.slot;

        if let Some(displaced) = parked.displaced {
            self.drop_turn(channel, None, DropReason::ClarificationDisplaced(displaced));
        }

        tracing::info!("clarification parked, prompting user");
        Outbound::Envelope {
            channel: self.channels.text.clone(),
            envelope: parked.prompt,
        }
    }

    fn forward(&mut self, channel: &str, text: &str, ntuple: Ntuple) -> Vec<Outbound> {
        if ntuple.has_pending() {
            self.drop_turn(
                channel,
                Some(text),
                DropReason::PendingSlots(ntuple.pending_paths()),
            );
            return Vec::new();
        }

        tracing::info!(%ntuple, "forwarding n-tuple to solver");
        vec![Outbound::Ntuple {
            channel: self.channels.solver.clone(),
            ntuple,
        }]
    }

    fn drop_turn(&self, channel: &str, utterance: Option<&str>, reason: DropReason) {
        self.diagnostics.turn_dropped(&DroppedTurn {
            channel: channel.to_string(),
            utterance: utterance.map(str::to_string),
            reason,
        });
    }
}

fn decode(channel: &str, payload: Value) -> Result<Envelope, RouterError> {
    Envelope::decode(payload).map_err(|error| RouterError::malformed(channel, error.to_string()))
}
