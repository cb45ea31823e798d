//! Span alignment: mapping analyzer token ranges back to surface tokens.
//!
//! Each parse candidate comes with a list of spans linking a semantic role to
//! a `[start, end)` range of tokens. The specializer needs the tokens
//! themselves, so each span is resolved against [`tokenize`] of the original
//! sentence.
//!
//! Alignment is pure: the same spans and sentence always give the same
//! result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AlignError;
use crate::token::tokenize;

/// A span as the analyzer reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanDescriptor {
    /// The semantic type (construction or schema name) the span belongs to.
    #[serde(rename = "type")]
    pub semantic_type: String,
    /// Token range `[start, end)`.
    pub span: [usize; 2],
    /// Analyzer-assigned span identifier.
    #[serde(default)]
    pub id: Value,
}

/// A span resolved to the tokens it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSpan {
    pub semantic_type: String,
    pub tokens: Vec<String>,
    pub range: [usize; 2],
    pub span_id: Value,
}

/// Resolve every span against the tokenized sentence.
///
/// Fails with [`AlignError::OutOfRangeSpan`] on the first range that does
/// not fit; nothing is truncated or wrapped.
pub fn align_spans(
    spans: &[SpanDescriptor],
    sentence: &str,
) -> Result<Vec<AlignedSpan>, AlignError> {
    let tokens = tokenize(sentence);

    spans
        .iter()
        .map(|descriptor| {
            let [start, end] = descriptor.span;
            if start > end || end > tokens.len() {
                return Err(AlignError::OutOfRangeSpan {
                    id: descriptor.id.to_string(),
                    start,
                    end,
                    len: tokens.len(),
                });
            }

            Ok(AlignedSpan {
                semantic_type: descriptor.semantic_type.clone(),
                tokens: tokens[start..end].iter().map(|t| t.text.clone()).collect(),
                range: descriptor.span,
                span_id: descriptor.id.clone(),
            })
        })
        .collect()
}
