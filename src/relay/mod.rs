//! Hand-off from request handlers to the chat connection.
//!
//! Handlers never talk to the IRC connection directly. They enqueue
//! [`OutboundMessage`]s on a bounded channel whose single consumer is the IRC
//! client task.
//!
//! # Queue policy
//!
//! Enqueueing never blocks. When the queue is full the message being
//! enqueued is dropped (drop-newest) and [`RelayError::QueueFull`] is
//! returned; when the consumer has gone away [`RelayError::Unavailable`] is
//! returned. Either way the caller logs and carries on: delivery is
//! best-effort and never affects the HTTP response.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::types::{ChannelName, OutboundMessage};

/// Default number of messages buffered between handlers and the connection.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Failure to hand a message to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The queue is saturated; the message was dropped.
    #[error("relay queue full, dropped message for {0}")]
    QueueFull(ChannelName),

    /// The transport task is gone; the message was dropped.
    #[error("relay transport unavailable, dropped message for {0}")]
    Unavailable(ChannelName),
}

/// Something that accepts outbound chat lines without blocking.
///
/// The production implementation is [`RelayHandle`]; tests substitute a
/// recording fake.
pub trait MessageSink: Send + Sync {
    /// Enqueues a message for delivery. Returns immediately.
    fn send(&self, message: OutboundMessage) -> Result<(), RelayError>;
}

/// Sending half of the relay queue.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<OutboundMessage>,
}

impl RelayHandle {
    /// Creates a queue with the given capacity, returning the handle for
    /// producers and the receiver for the transport task.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (RelayHandle { tx }, rx)
    }
}

impl MessageSink for RelayHandle {
    fn send(&self, message: OutboundMessage) -> Result<(), RelayError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(m) => RelayError::QueueFull(m.channel),
            mpsc::error::TrySendError::Closed(m) => RelayError::Unavailable(m.channel),
        })
    }
}
