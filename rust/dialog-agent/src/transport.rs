//! Federation transport: publish/subscribe by channel name.
//!
//! Agents in a federation talk through named channels. A peer subscribes to
//! the channels it listens on and publishes to any channel; every other peer
//! subscribed to that channel receives the message. A peer never receives
//! its own publications.
//!
//! All deliveries for one peer go through a single inbox, so a peer handles
//! one message at a time in arrival order, which is FIFO per publisher.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{RwLock, mpsc};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer '{0}' has left the federation")]
    NotJoined(String),
}

/// A message received on a subscribed channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub channel: String,
    pub payload: Value,
}

/// One agent's connection to a federation.
#[async_trait]
pub trait Transport: Send {
    async fn subscribe(&mut self, channel: &str) -> Result<(), TransportError>;

    async fn publish(&self, channel: &str, payload: Value) -> Result<(), TransportError>;

    /// The next delivery, or `None` once the peer has left and its inbox is
    /// drained.
    async fn next_delivery(&mut self) -> Option<Delivery>;

    async fn quit_federation(&mut self) -> Result<(), TransportError>;
}

struct PeerEntry {
    name: String,
    channels: HashSet<String>,
    inbox: mpsc::UnboundedSender<Delivery>,
}

/// An in-process federation.
///
/// Cloning the bus shares the same federation.
#[derive(Clone, Default)]
pub struct LocalBus {
    peers: Arc<RwLock<HashMap<u64, PeerEntry>>>,
    next_id: Arc<AtomicU64>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the federation as a new peer.
    pub async fn join(&self, name: impl Into<String>) -> LocalPeer {
        let name = name.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, inbox) = mpsc::unbounded_channel();

        self.peers.write().await.insert(
            id,
            PeerEntry {
                name: name.clone(),
                channels: HashSet::new(),
                inbox: sender,
            },
        );
        tracing::debug!(peer = %name, "joined federation");

        LocalPeer {
            id,
            name,
            bus: self.clone(),
            inbox,
        }
    }

    /// Names of the peers currently in the federation.
    pub async fn peer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .peers
            .read()
            .await
            .values()
            .map(|peer| peer.name.clone())
            .collect();
        names.sort();
        names
    }
}

/// A peer of a [`LocalBus`].
pub struct LocalPeer {
    id: u64,
    name: String,
    bus: LocalBus,
    inbox: mpsc::UnboundedReceiver<Delivery>,
}

impl LocalPeer {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Transport for LocalPeer {
    async fn subscribe(&mut self, channel: &str) -> Result<(), TransportError> {
        let mut peers = self.bus.peers.write().await;
        let peer = peers
            .get_mut(&self.id)
            .ok_or_else(|| TransportError::NotJoined(self.name.clone()))?;
        peer.channels.insert(channel.to_string());
        Ok(())
    }

    async fn publish(&self, channel: &str, payload: Value) -> Result<(), TransportError> {
        let peers = self.bus.peers.read().await;
        if !peers.contains_key(&self.id) {
            return Err(TransportError::NotJoined(self.name.clone()));
        }

        for (id, peer) in peers.iter() {
            if *id == self.id || !peer.channels.contains(channel) {
                continue;
            }
            let delivery = Delivery {
                channel: channel.to_string(),
                payload: payload.clone(),
            };
            // A closed inbox belongs to a peer that is shutting down.
            if peer.inbox.send(delivery).is_err() {
                tracing::debug!(peer = %peer.name, "inbox closed, delivery skipped");
            }
        }
        Ok(())
    }

    async fn next_delivery(&mut self) -> Option<Delivery> {
        self.inbox.recv().await
    }

    async fn quit_federation(&mut self) -> Result<(), TransportError> {
        let removed = self.bus.peers.write().await.remove(&self.id);
        match removed {
            Some(_) => {
                tracing::debug!(peer = %self.name, "left federation");
                Ok(())
            }
            None => Err(TransportError::NotJoined(self.name.clone())),
        }
    }
}
