use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dialog_agent::{
    Ntuple,
    agent::UserAgent,
    analyzer::HttpAnalyzer,
    channel::{Channels, TEXT_SUFFIX},
    cli::UserAgentCli,
    config::AgentConfig,
    diagnostic::TracingDiagnostics,
    envelope::Envelope,
    sink::{ConsoleSink, format_output},
    specializer::JsonSpecializer,
    transport::{Delivery, LocalBus, LocalPeer, Transport},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

const QUIT: &str = "q";

#[tokio::main]
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AgentConfig::from(UserAgentCli::parse());
    let channels = config.channels();

    let bus = LocalBus::new();
    let peer = bus.join(config.name.clone()).await;
    let mut console = Console::join(&bus, channels).await?;

    let agent = UserAgent::start(
        config.clone(),
        HttpAnalyzer::new(config.analyzer_endpoint.clone())?,
        JsonSpecializer::new(),
        ConsoleSink,
        peer,
        Arc::new(TracingDiagnostics),
    )
    .await?;

    let (quit, quit_signal) = oneshot::channel::<()>();
    let agent = tokio::spawn(agent.run_until(async move {
        let _ = quit_signal.await;
    }));

    console.run().await?;

    let _ = quit.send(());
    agent.await??;
    Ok(())
}

/// The text agent end of the federation: reads lines from stdin and shows
/// clarification prompts.
pub struct Console {
    peer: LocalPeer,
    channels: Channels,
    /// The original of the prompt currently showing, sent back with the answer.
    prompt: Option<Ntuple>,
    exit: bool,
}

impl Console {
    async fn join(bus: &LocalBus, channels: Channels) -> Result<Self> {
        let mut peer = bus.join(TEXT_SUFFIX).await;
        peer.subscribe(&channels.text).await?;
        // Nothing else listens on the solver channel in-process, so show what
        // would have been sent.
        peer.subscribe(&channels.solver).await?;

        Ok(Console {
            peer,
            channels,
            prompt: None,
            exit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            if self.exit {
                break;
            }

            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => self.handle_line(line.trim()).await?,
                    None => self.exit = true,
                },
                delivery = self.peer.next_delivery() => match delivery {
                    Some(delivery) => self.handle_delivery(delivery),
                    None => self.exit = true,
                },
            }
        }

        self.peer.quit_federation().await?;
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<()> {
        if line == QUIT {
            self.exit = true;
            return Ok(());
        }

        let tag = Some(self.peer.name().to_string());
        let text = Some(line.to_string());
        let envelope = match self.prompt.take() {
            Some(original) => Envelope::Clarification {
                tag,
                message: None,
                ntuple: None,
                original: Some(original),
                text,
            },
            None => Envelope::Standard { tag, text },
        };

        self.peer
            .publish(&self.channels.text, envelope.into_value()?)
            .await?;
        Ok(())
    }

    fn handle_delivery(&mut self, delivery: Delivery) {
        let Delivery { channel, payload } = delivery;

        if channel == self.channels.solver {
            println!("=> {payload}");
            return;
        }

        match Envelope::decode(payload) {
            Ok(Envelope::Clarification {
                tag,
                message,
                original,
                ..
            }) => {
                println!(
                    "{}",
                    format_output(
                        tag.as_deref().unwrap_or_default(),
                        message.as_deref().unwrap_or_default()
                    )
                );
                self.prompt = original;
            }
            Ok(other) => tracing::debug!(kind = other.kind(), "ignoring text channel message"),
            Err(error) => tracing::warn!(%error, "unreadable text channel message"),
        }
    }
}
