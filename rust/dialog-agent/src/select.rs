//! Parse candidate selection: from an utterance to one n-tuple.
//!
//! The analyzer returns candidates best first. Each candidate's spans are
//! aligned against the utterance and installed in the specializer, then the
//! candidate is specialized. The first candidate that specializes wins and
//! the rest are never touched:
//!
//! ```text
//! full_parse(utterance)
//!   candidate 0: align → set_spans → specialize ✗  (swallowed)
//!   candidate 1: align → set_spans → specialize ✓  → n-tuple
//!   candidate 2: not attempted
//! ```
//!
//! No re-ranking happens here; the analyzer's order is final.

use dialog_ntuple::Ntuple;

use crate::analyzer::Analyzer;
use crate::diagnostic::DropReason;
use crate::error::AlignError;
use crate::span::align_spans;
use crate::specializer::Specializer;

/// The outcome of selecting among an utterance's candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The n-tuple of the first candidate that specialized.
    Selected(Ntuple),
    /// No n-tuple came out of this utterance.
    Dropped(DropReason),
}

/// Runs utterances through the analyzer and specializer.
pub struct Selector<A, S> {
    analyzer: A,
    specializer: S,
}

impl<A, S> Selector<A, S>
where
    A: Analyzer,
    S: Specializer,
{
    pub fn new(analyzer: A, specializer: S) -> Self {
        Selector {
            analyzer,
            specializer,
        }
    }

    pub fn specializer_mut(&mut self) -> &mut S {
        &mut self.specializer
    }

    /// Produce the n-tuple for an utterance.
    ///
    /// Analyzer and specialization failures become [`Selection::Dropped`];
    /// only a misaligned span is returned as an error.
    pub async fn select(&mut self, utterance: &str) -> Result<Selection, AlignError> {
        let full_parse = match self.analyzer.full_parse(utterance).await {
            Ok(full_parse) => full_parse,
            Err(error) => {
                return Ok(Selection::Dropped(DropReason::AnalyzerFailed(
                    error.to_string(),
                )));
            }
        };

        let mut failures = Vec::new();
        for (index, (spec, spans)) in full_parse.candidates().enumerate() {
            let Some(spans) = spans else {
                failures.push(format!("candidate {index} has no span list"));
                continue;
            };

            let aligned = align_spans(spans, utterance)?;
            self.specializer.set_spans(aligned);

            match self.specializer.specialize(spec) {
                Ok(ntuple) => {
                    tracing::debug!(candidate = index, "candidate specialized");
                    return Ok(Selection::Selected(ntuple));
                }
                Err(error) => {
                    tracing::debug!(candidate = index, %error, "candidate rejected");
                    failures.push(format!("candidate {index}: {error}"));
                }
            }
        }

        Ok(Selection::Dropped(DropReason::NoCandidateSpecialized {
            attempted: full_parse.parse.len(),
            failures,
        }))
    }
}
