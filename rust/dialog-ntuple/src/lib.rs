//! # Dialog N-tuple: structured records exchanged between agents
//!
//! An n-tuple is the semantic request a user agent produces from an
//! utterance and hands to a solver. It is either a leaf value or a named
//! mapping of fields to further n-tuples.
//!
//! A field may be a **pending slot**: a field the solver could not resolve
//! and for which it asks the user for a descriptor. On the wire a pending
//! field carries a `*` in its key (`"agent*"`); in memory it is an
//! [`Entry::Pending`] so code never has to inspect key strings.
//!
//! ```text
//! {"agent*": "?", "action": {"type": "move"}}
//!   + descriptor {"predicate_type": "entity", "name": "box"}
//!   = {"agent": {"predicate_type": "entity", "name": "box"}, "action": {"type": "move"}}
//! ```

pub mod error;
pub mod merge;
pub mod ntuple;

pub use error::NtupleError;
pub use ntuple::{Entry, Fields, Ntuple, PENDING_MARKER};
