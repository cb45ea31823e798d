//! Error types for n-tuple decoding.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NtupleError {
    #[error("n-tuple is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("expected an n-tuple mapping, found a leaf value")]
    NotAMapping,
}
