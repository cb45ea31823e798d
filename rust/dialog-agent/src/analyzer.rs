//! The analyzer boundary: the external grammar engine.
//!
//! The analyzer turns an utterance into an ordered list of semantic specs,
//! each with a positionally aligned list of spans. The agent never looks
//! inside a semantic spec; it only passes it on to the specializer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::span::SpanDescriptor;

/// Errors from talking to the analyzer.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Nothing is listening at the endpoint (yet).
    #[error("analyzer unreachable: {0}")]
    Unreachable(String),

    #[error("analyzer request failed: {0}")]
    RequestFailed(String),

    #[error("analyzer returned an unreadable parse: {0}")]
    Decode(String),

    /// The analyzer understood the request but could not parse the utterance.
    #[error("analyzer rejected utterance: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            AnalyzerError::Unreachable(error.to_string())
        } else if error.is_decode() {
            AnalyzerError::Decode(error.to_string())
        } else {
            AnalyzerError::RequestFailed(error.to_string())
        }
    }
}

/// An opaque semantic specification produced by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SemSpec(pub Value);

/// The analyzer's answer for one utterance.
///
/// `parse[i]` and `spans[i]` describe the same candidate. Candidates are in
/// the analyzer's preference order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullParse {
    #[serde(default)]
    pub parse: Vec<SemSpec>,
    #[serde(default)]
    pub spans: Vec<Vec<SpanDescriptor>>,
}

impl FullParse {
    /// Candidates in analyzer order, each with its span list if the
    /// analyzer supplied one at the same position.
    pub fn candidates(&self) -> impl Iterator<Item = (&SemSpec, Option<&[SpanDescriptor]>)> {
        self.parse
            .iter()
            .enumerate()
            .map(|(index, spec)| (spec, self.spans.get(index).map(Vec::as_slice)))
    }
}

/// The grammar engine the agent consults for every utterance.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Parse an utterance into ordered candidates.
    async fn full_parse(&self, utterance: &str) -> Result<FullParse, AnalyzerError>;

    /// Check that the analyzer is reachable.
    async fn ping(&self) -> Result<(), AnalyzerError>;

    /// Where the analyzer lives, for log and user-facing messages.
    fn endpoint(&self) -> &str;
}

/// An analyzer served over HTTP with a JSON body.
#[derive(Clone, Debug)]
pub struct HttpAnalyzer {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpAnalyzer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AnalyzerError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AnalyzerError::RequestFailed(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct FullParseRequest<'a> {
    sentence: &'a str,
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    async fn full_parse(&self, utterance: &str) -> Result<FullParse, AnalyzerError> {
        let response = self
            .client
            .post(self.url("full_parse"))
            .json(&FullParseRequest {
                sentence: utterance,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Rejected(format!("{status}: {body}")));
        }

        Ok(response.json::<FullParse>().await?)
    }

    async fn ping(&self) -> Result<(), AnalyzerError> {
        // Any HTTP answer means the service is up.
        self.client.get(self.url("")).send().await?;
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
