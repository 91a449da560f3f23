use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crossbeam_channel::{unbounded, Receiver, Sender};
use eyre::Result;
use serde_json::Value;

use super::{Transport, TransportEvent};

#[derive(Debug, Default)]
struct BrokerState {
    connected: bool,
    subscriptions: HashSet<String>,
    fail_connect: Option<String>,
    hold_acks: bool,
    unsubscribed: Vec<String>,
}

/// In-process transport backed by an unbounded queue.
///
/// The paired [`MemoryHandle`] plays the server: it publishes payloads,
/// injects errors and controls acknowledgments.
pub struct MemoryTransport {
    tx: Sender<TransportEvent>,
    rx: Receiver<TransportEvent>,
    state: Arc<RwLock<BrokerState>>,
}

/// Server-side handle of a [`MemoryTransport`].
#[derive(Clone)]
pub struct MemoryHandle {
    tx: Sender<TransportEvent>,
    state: Arc<RwLock<BrokerState>>,
}

impl MemoryTransport {
    pub fn new() -> (Self, MemoryHandle) {
        let (tx, rx) = unbounded::<TransportEvent>();
        let state = Arc::new(RwLock::new(BrokerState::default()));
        let handle = MemoryHandle {
            tx: tx.clone(),
            state: Arc::clone(&state),
        };
        (Self { tx, rx, state }, handle)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, BrokerState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self) -> Result<()> {
        let mut state = self.write_state();
        if state.connected {
            return Ok(());
        }
        if let Some(reason) = state.fail_connect.clone() {
            eyre::bail!(reason);
        }
        state.connected = true;
        let _ = self.tx.send(TransportEvent::Connected);
        Ok(())
    }

    fn subscribe(&mut self, channel: &str) -> Result<()> {
        let mut state = self.write_state();
        if !state.connected {
            eyre::bail!("transport is not connected");
        }
        state.subscriptions.insert(channel.to_string());
        if !state.hold_acks {
            let _ = self.tx.send(TransportEvent::Subscribed {
                channel: channel.to_string(),
            });
        }
        Ok(())
    }

    fn unsubscribe(&mut self, channel: &str) -> Result<()> {
        let mut state = self.write_state();
        state.subscriptions.remove(channel);
        state.unsubscribed.push(channel.to_string());
        Ok(())
    }

    fn events(&self) -> Receiver<TransportEvent> {
        self.rx.clone()
    }
}

impl MemoryHandle {
    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, BrokerState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, BrokerState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Delivers `payload` if `channel` has a subscriber. Returns whether it was delivered.
    pub fn publish(&self, channel: &str, payload: Value) -> bool {
        if !self.read_state().subscriptions.contains(channel) {
            return false;
        }
        self.tx
            .send(TransportEvent::Message {
                channel: channel.to_string(),
                payload,
            })
            .is_ok()
    }

    pub fn fail(&self, reason: Option<&str>) {
        let _ = self.tx.send(TransportEvent::Error {
            reason: reason.map(str::to_string),
        });
    }

    /// Makes the next `connect` calls fail with `reason`.
    pub fn fail_connect(&self, reason: &str) {
        self.write_state().fail_connect = Some(reason.to_string());
    }

    /// Stops acknowledging subscriptions until [`MemoryHandle::acknowledge`] is called.
    pub fn hold_acks(&self) {
        self.write_state().hold_acks = true;
    }

    pub fn acknowledge(&self, channel: &str) {
        let _ = self.tx.send(TransportEvent::Subscribed {
            channel: channel.to_string(),
        });
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.read_state().subscriptions.contains(channel)
    }

    /// Channels that have been unsubscribed, in order.
    pub fn unsubscribed(&self) -> Vec<String> {
        self.read_state().unsubscribed.clone()
    }
}
