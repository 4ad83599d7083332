//! One-way status reporting.
//!
//! The engine never prints. Progress and failures are handed to a
//! [`StatusSink`] supplied by the caller; implementations must not block
//! the calling (worker) thread.

use tokio::sync::mpsc::UnboundedSender;

/// Receives human-readable status messages, in order, from the worker thread.
pub trait StatusSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Any `Fn(&str)` closure is a sink.
impl<F> StatusSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Sink that forwards messages to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn report(&self, message: &str) {
        tracing::info!("{message}");
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn report(&self, _message: &str) {}
}

/// Sink that queues messages onto an unbounded channel.
///
/// Sending never waits on the receiver, so the display side can drain the
/// queue on its own thread at its own pace. Messages sent after the receiver
/// is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl StatusSink for ChannelSink {
    fn report(&self, message: &str) {
        if self.tx.send(message.to_string()).is_err() {
            tracing::debug!(%message, "Status receiver gone, message dropped");
        }
    }
}
