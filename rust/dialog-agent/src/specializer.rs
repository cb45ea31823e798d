//! The specializer boundary: turning a semantic spec into an n-tuple.
//!
//! A specializer is stateful across one candidate: the aligned spans of the
//! candidate are installed with [`Specializer::set_spans`] before
//! [`Specializer::specialize`] is called on that candidate's semantic spec.
//! Specialization is expected to fail for some candidates; the selector
//! simply moves on to the next one.

use dialog_ntuple::Ntuple;
use thiserror::Error;

use crate::analyzer::SemSpec;
use crate::span::AlignedSpan;

#[derive(Debug, Error)]
pub enum SpecializeError {
    #[error("no template matches the semantic spec: {0}")]
    NoTemplate(String),

    #[error("semantic spec is not an n-tuple mapping")]
    NotAMapping,
}

/// Turns a semantic spec plus its aligned spans into an n-tuple.
pub trait Specializer: Send {
    /// Install the aligned spans of the candidate about to be specialized.
    fn set_spans(&mut self, spans: Vec<AlignedSpan>);

    /// Specialize one candidate.
    fn specialize(&mut self, spec: &SemSpec) -> Result<Ntuple, SpecializeError>;

    /// Flip debug output on or off, returning the new setting.
    fn toggle_debug(&mut self) -> bool;
}

/// A specializer for analyzers that already emit n-tuple shaped specs.
///
/// The semantic spec must be a JSON mapping; it is decoded as an n-tuple
/// unchanged, pending markers included.
#[derive(Debug, Default)]
pub struct JsonSpecializer {
    spans: Vec<AlignedSpan>,
    debug: bool,
}

impl JsonSpecializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> &[AlignedSpan] {
        &self.spans
    }
}

impl Specializer for JsonSpecializer {
    fn set_spans(&mut self, spans: Vec<AlignedSpan>) {
        self.spans = spans;
    }

    fn specialize(&mut self, spec: &SemSpec) -> Result<Ntuple, SpecializeError> {
        if !spec.0.is_object() {
            return Err(SpecializeError::NotAMapping);
        }

        if self.debug {
            for span in &self.spans {
                tracing::info!(
                    semantic_type = %span.semantic_type,
                    tokens = ?span.tokens,
                    "span"
                );
            }
        }

        Ok(Ntuple::from(spec.0.clone()))
    }

    fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }
}
