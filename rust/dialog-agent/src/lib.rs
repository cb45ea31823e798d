//! # Dialog Agent
//!
//! The user agent receives utterances from a text or speech agent, runs them
//! through an external analyzer and specializer to produce an n-tuple, and
//! sends the n-tuple to the problem solver. When the solver needs more
//! information it asks for a clarification; the agent parks the partial
//! n-tuple, prompts the user, and merges the answer back in.
//!
//! ## Architecture
//!
//! ```text
//! Transport (channels) → Router (envelope type)
//!   → Selector: Analyzer::full_parse → align spans → Specializer (first success wins)
//!     → forward n-tuple to <federation>_ProblemSolver
//!
//! Solver clarification → ClarificationSlot parks original → prompt on <federation>_TextAgent
//!   → next text message → Selector → Ntuple::clarify → forward merged n-tuple
//! ```
//!
//! Every turn that ends without an outbound message is reported to a
//! [`diagnostic::Diagnostics`] hook rather than vanishing silently.

pub mod agent;
pub mod analyzer;
pub mod channel;
pub mod clarification;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod envelope;
pub mod error;
pub mod router;
pub mod select;
pub mod sink;
pub mod span;
pub mod specializer;
pub mod token;
pub mod transport;

pub use dialog_ntuple::{Entry, Ntuple};
