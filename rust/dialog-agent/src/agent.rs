//! The agent runtime: startup gate and dispatch loop.
//!
//! Startup blocks until the analyzer answers, retrying forever with a fixed
//! delay and telling the user once. After that the agent subscribes to its
//! three channels and handles deliveries one at a time: each delivery is
//! routed to completion, its outbound messages are published, and only
//! then is the next delivery taken from the inbox.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::analyzer::{Analyzer, AnalyzerError};
use crate::config::AgentConfig;
use crate::diagnostic::{Diagnostics, DropReason, DroppedTurn};
use crate::error::{AgentError, RouterError};
use crate::router::Router;
use crate::select::Selector;
use crate::sink::OutputSink;
use crate::specializer::Specializer;
use crate::transport::{Delivery, Transport};

/// Wait until the analyzer answers a ping.
///
/// Unreachable analyzers are retried indefinitely, `delay` apart; the user
/// is told once, not on every attempt. Any other analyzer error aborts
/// startup. Returns the number of attempts made.
pub async fn wait_for_analyzer<A, O>(
    analyzer: &A,
    delay: Duration,
    tag: &str,
    sink: &mut O,
) -> Result<usize, AgentError>
where
    A: Analyzer + ?Sized,
    O: OutputSink,
{
    let mut attempts = 0;
    let mut announced = false;

    loop {
        attempts += 1;
        match analyzer.ping().await {
            Ok(()) => {
                tracing::info!(endpoint = analyzer.endpoint(), attempts, "analyzer reachable");
                return Ok(attempts);
            }
            Err(AnalyzerError::Unreachable(reason)) => {
                if !announced {
                    tracing::warn!(endpoint = analyzer.endpoint(), %reason, "analyzer refused connection, retrying");
                    sink.output(
                        tag,
                        &format!(
                            "The analyzer address provided refused a connection: {}",
                            analyzer.endpoint()
                        ),
                    );
                    announced = true;
                }
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                return Err(AgentError::Startup {
                    endpoint: analyzer.endpoint().to_string(),
                    reason: error.to_string(),
                });
            }
        }
    }
}

/// A running user agent.
pub struct UserAgent<A, S, O, T> {
    config: AgentConfig,
    router: Router<A, S, O>,
    transport: T,
    diagnostics: Arc<dyn Diagnostics>,
}

impl<A, S, O, T> UserAgent<A, S, O, T>
where
    A: Analyzer,
    S: Specializer,
    O: OutputSink,
    T: Transport,
{
    /// Wait for the analyzer, then subscribe to the agent's channels.
    pub async fn start(
        config: AgentConfig,
        analyzer: A,
        specializer: S,
        mut sink: O,
        mut transport: T,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, AgentError> {
        wait_for_analyzer(&analyzer, config.retry_delay, &config.name, &mut sink).await?;

        let channels = config.channels();
        for channel in channels.all() {
            transport.subscribe(channel).await?;
        }
        tracing::info!(agent = %config.name, federation = %config.federation, "user agent ready");

        let router = Router::new(
            channels,
            Selector::new(analyzer, specializer),
            sink,
            diagnostics.clone(),
        );

        Ok(UserAgent {
            config,
            router,
            transport,
            diagnostics,
        })
    }

    /// Route one delivery and publish the result.
    ///
    /// Nothing that happens while handling a delivery stops the agent.
    pub async fn handle(&mut self, delivery: Delivery) {
        let Delivery { channel, payload } = delivery;

        let outbound = match self.router.route(&channel, payload).await {
            Ok(outbound) => outbound,
            Err(error) => {
                tracing::error!(%channel, %error, "turn failed");
                let reason = match error {
                    RouterError::Align(error) => DropReason::MisalignedSpans(error.to_string()),
                    other => DropReason::Malformed(other.to_string()),
                };
                self.report(&channel, reason);
                return;
            }
        };

        for message in outbound {
            let target = message.channel().to_string();
            let published = match message.into_payload() {
                Ok(payload) => self
                    .transport
                    .publish(&target, payload)
                    .await
                    .map_err(|error| error.to_string()),
                Err(error) => Err(error.to_string()),
            };
            if let Err(error) = published {
                self.report(&channel, DropReason::PublishFailed(format!("{target}: {error}")));
            }
        }
    }

    /// Handle deliveries until the inbox closes.
    pub async fn run(mut self) -> Result<(), AgentError> {
        while let Some(delivery) = self.transport.next_delivery().await {
            self.handle(delivery).await;
        }
        Ok(())
    }

    /// Handle deliveries until `shutdown` completes, then leave the
    /// federation.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), AgentError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                delivery = self.transport.next_delivery() => match delivery {
                    Some(delivery) => self.handle(delivery).await,
                    None => return Ok(()),
                },
            }
        }

        tracing::info!(agent = %self.config.name, "leaving federation");
        self.transport.quit_federation().await?;
        Ok(())
    }

    fn report(&self, channel: &str, reason: DropReason) {
        self.diagnostics.turn_dropped(&DroppedTurn {
            channel: channel.to_string(),
            utterance: None,
            reason,
        });
    }
}
