//! The clarification slot: one outstanding clarification per session.
//!
//! ```text
//!                 park(request)
//!  AwaitingTurn ─────────────────▶ AwaitingDescriptor { original }
//!       ▲                              │        │
//!       │  resolve(complete descriptor)│        │ park(request): last write wins,
//!       └──────────────────────────────┘        ▼ the earlier original is displaced
//! ```
//!
//! The slot is a plain value. Transitions consume it and hand back the next
//! state together with whatever the transition emits, so the session that
//! owns it always sees exactly which original is parked.

use dialog_ntuple::Ntuple;

use crate::envelope::Envelope;

/// A solver's request for more information about an n-tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct ClarificationRequest {
    pub tag: String,
    pub prompt: String,
    pub original: Ntuple,
}

/// Session clarification state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ClarificationSlot {
    /// No clarification outstanding.
    #[default]
    AwaitingTurn,
    /// A partial n-tuple is parked until the user describes the missing part.
    AwaitingDescriptor { tag: String, original: Ntuple },
}

/// The result of parking a clarification request.
#[derive(Debug, Clone, PartialEq)]
pub struct Parked {
    pub slot: ClarificationSlot,
    /// The prompt to send to the text channel.
    pub prompt: Envelope,
    /// The original that was parked before, if this request replaced one.
    pub displaced: Option<Ntuple>,
}

/// The result of offering a descriptor to the slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub slot: ClarificationSlot,
    pub resolution: Resolution,
}

/// What a descriptor did to the parked original.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Nothing was parked.
    NothingParked,
    /// The original is complete and ready to forward.
    Merged(Ntuple),
    /// The merge still has pending slots at these paths; the original stays
    /// parked.
    StillPending(Vec<String>),
}

impl ClarificationSlot {
    pub fn is_awaiting_descriptor(&self) -> bool {
        matches!(self, ClarificationSlot::AwaitingDescriptor { .. })
    }

    /// The parked original, if any.
    pub fn original(&self) -> Option<&Ntuple> {
        match self {
            ClarificationSlot::AwaitingTurn => None,
            ClarificationSlot::AwaitingDescriptor { original, .. } => Some(original),
        }
    }

    /// Park a request's original and build the prompt for the user.
    pub fn park(self, request: ClarificationRequest) -> Parked {
        let displaced = match self {
            ClarificationSlot::AwaitingTurn => None,
            ClarificationSlot::AwaitingDescriptor { original, .. } => Some(original),
        };

        let prompt = Envelope::clarification_prompt(
            request.tag.clone(),
            request.prompt,
            request.original.clone(),
        );

        Parked {
            slot: ClarificationSlot::AwaitingDescriptor {
                tag: request.tag,
                original: request.original,
            },
            prompt,
            displaced,
        }
    }

    /// Merge a descriptor into the parked original.
    ///
    /// Only a merge without pending slots returns the slot to
    /// [`ClarificationSlot::AwaitingTurn`].
    pub fn resolve(self, descriptor: &Ntuple) -> Resolved {
        match self {
            ClarificationSlot::AwaitingTurn => Resolved {
                slot: ClarificationSlot::AwaitingTurn,
                resolution: Resolution::NothingParked,
            },
            ClarificationSlot::AwaitingDescriptor { tag, original } => {
                let merged = original.clarify(descriptor);
                if merged.has_pending() {
                    Resolved {
                        resolution: Resolution::StillPending(merged.pending_paths()),
                        slot: ClarificationSlot::AwaitingDescriptor { tag, original },
                    }
                } else {
                    Resolved {
                        slot: ClarificationSlot::AwaitingTurn,
                        resolution: Resolution::Merged(merged),
                    }
                }
            }
        }
    }
}
