//! Event Bus - broadcast channel for tree mutation notifications
//!
//! Design: a subscription exists only while someone holds a receiver.
//! Events published with nobody listening are dropped on the floor, which
//! is exactly what a disconnected observer should see.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// What kind of change the host made to the live tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationRecord {
    ChildList,
    Attributes { name: String },
    CharacterData,
}

/// Simple event bus using tokio broadcast channel
pub struct EventBus<E> {
    tx: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event
    pub fn publish(&self, event: E) {
        let _ = self.tx.send(event); // Ignore error if no subscribers
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
