//! Dropped-turn diagnostics.
//!
//! A turn that produces nothing (the analyzer failed, no candidate
//! specialized, the message was malformed, ...) is not an error for the
//! agent: the session carries on with the next message. Each such drop is
//! still handed to a [`Diagnostics`] hook so it can be logged, counted or
//! asserted on.

use std::fmt;
use std::sync::Arc;

use dialog_ntuple::Ntuple;
use parking_lot::Mutex;

/// Why a turn ended without an outbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// The analyzer call itself failed.
    AnalyzerFailed(String),
    /// Every candidate failed to specialize (or the analyzer returned none).
    NoCandidateSpecialized {
        attempted: usize,
        failures: Vec<String>,
    },
    /// A span range did not fit the sentence.
    MisalignedSpans(String),
    /// The inbound envelope could not be routed.
    Malformed(String),
    /// A standard turn produced an n-tuple the solver does not accept.
    NotForwardable(Ntuple),
    /// The n-tuple still had pending slots when it was about to be forwarded.
    PendingSlots(Vec<String>),
    /// A second clarification request replaced a parked one.
    ClarificationDisplaced(Ntuple),
    /// Publishing the outbound message failed.
    PublishFailed(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::AnalyzerFailed(error) => write!(f, "analyzer failed: {error}"),
            DropReason::NoCandidateSpecialized {
                attempted,
                failures,
            } => write!(
                f,
                "none of {attempted} candidates specialized [{}]",
                failures.join("; ")
            ),
            DropReason::MisalignedSpans(error) => write!(f, "{error}"),
            DropReason::Malformed(error) => write!(f, "{error}"),
            DropReason::NotForwardable(ntuple) => {
                write!(f, "n-tuple has no predicate_type: {ntuple}")
            }
            DropReason::PendingSlots(paths) => {
                write!(f, "n-tuple still has pending slots: {}", paths.join(", "))
            }
            DropReason::ClarificationDisplaced(original) => {
                write!(f, "parked clarification replaced, dropped original {original}")
            }
            DropReason::PublishFailed(error) => write!(f, "publish failed: {error}"),
        }
    }
}

/// A dropped turn: where it came from and why it went nowhere.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedTurn {
    /// The channel the triggering message arrived on.
    pub channel: String,
    /// The utterance being processed, when there was one.
    pub utterance: Option<String>,
    pub reason: DropReason,
}

/// Receives every dropped turn.
pub trait Diagnostics: Send + Sync {
    fn turn_dropped(&self, turn: &DroppedTurn);
}

/// Logs dropped turns as warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn turn_dropped(&self, turn: &DroppedTurn) {
        tracing::warn!(
            channel = %turn.channel,
            utterance = turn.utterance.as_deref().unwrap_or(""),
            "turn dropped: {}",
            turn.reason
        );
    }
}

/// Keeps dropped turns in memory, for tests and embedding applications.
#[derive(Debug, Default, Clone)]
pub struct RecordingDiagnostics {
    drops: Arc<Mutex<Vec<DroppedTurn>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every drop recorded so far, oldest first.
    pub fn drops(&self) -> Vec<DroppedTurn> {
        self.drops.lock().clone()
    }

    pub fn reasons(&self) -> Vec<DropReason> {
        self.drops().into_iter().map(|turn| turn.reason).collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn turn_dropped(&self, turn: &DroppedTurn) {
        TracingDiagnostics.turn_dropped(turn);
        self.drops.lock().push(turn.clone());
    }
}
