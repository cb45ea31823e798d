use std::time::Duration;

use clap::Parser;

use crate::config::{AgentConfig, DEFAULT_ANALYZER_ENDPOINT, DEFAULT_FEDERATION, DEFAULT_NAME};

#[derive(Debug, Parser)]
#[command(name = "user-agent")]
#[command(bin_name = "user-agent")]
#[command(about = "Turns typed utterances into n-tuples for a problem solver", long_about = None)]
pub struct UserAgentCli {
    /// Name of this agent within the federation.
    #[arg(default_value = DEFAULT_NAME)]
    pub name: String,

    /// Analyzer endpoint to connect to.
    #[arg(short, long, env = "ANALYZER_ENDPOINT", default_value = DEFAULT_ANALYZER_ENDPOINT)]
    pub analyzer: String,

    #[arg(short, long, env = "ECG_FED", default_value = DEFAULT_FEDERATION)]
    pub federation: String,

    /// Milliseconds between analyzer connection attempts at startup.
    #[arg(long, default_value_t = 1000)]
    pub retry_delay_ms: u64,
}

impl From<UserAgentCli> for AgentConfig {
    fn from(cli: UserAgentCli) -> Self {
        AgentConfig {
            federation: cli.federation,
            name: cli.name,
            analyzer_endpoint: cli.analyzer,
            retry_delay: Duration::from_millis(cli.retry_delay_ms),
        }
    }
}
