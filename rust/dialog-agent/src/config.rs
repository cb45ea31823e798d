//! Agent configuration.

use std::time::Duration;

use crate::channel::Channels;

pub const DEFAULT_FEDERATION: &str = "FED1";
pub const DEFAULT_NAME: &str = "AgentUI";
pub const DEFAULT_ANALYZER_ENDPOINT: &str = "http://localhost:8090";
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Configuration for a user agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentConfig {
    /// Federation whose channels the agent joins.
    pub federation: String,

    /// The agent's name, used as the tag of its own messages.
    pub name: String,

    /// Base URL of the analyzer service.
    pub analyzer_endpoint: String,

    /// Delay between analyzer connection attempts during startup.
    pub retry_delay: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            federation: DEFAULT_FEDERATION.to_string(),
            name: DEFAULT_NAME.to_string(),
            analyzer_endpoint: DEFAULT_ANALYZER_ENDPOINT.to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl AgentConfig {
    pub fn channels(&self) -> Channels {
        Channels::for_federation(&self.federation)
    }
}
