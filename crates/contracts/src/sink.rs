//! OutputSink trait - dispatch output interface
//!
//! Defines the abstract capability for Samples' destinations. The registry is
//! heterogeneous, so the trait is object-safe via `async_trait` and sinks are
//! held as `Arc<dyn OutputSink>`.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{BridgeError, Sample};

/// Sender half of the deactivation channel.
///
/// A sink reports itself by name when it determines it can no longer operate;
/// the dispatch engine removes it from the active set.
#[derive(Debug, Clone)]
pub struct DeactivateSender(mpsc::UnboundedSender<String>);

/// Receiver half of the deactivation channel, consumed by the dispatch engine.
pub type DeactivateReceiver = mpsc::UnboundedReceiver<String>;

impl DeactivateSender {
    /// Create a deactivation channel pair.
    pub fn channel() -> (Self, DeactivateReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    /// Report the named sink as dead. Never blocks; a closed channel means the
    /// dispatch engine is already gone and the notice is moot.
    pub fn deactivate(&self, name: impl Into<String>) {
        let _ = self.0.send(name.into());
    }
}

/// Context handed to sinks during initialization.
#[derive(Debug, Clone)]
pub struct SinkContext {
    deactivate: DeactivateSender,
    cancel: CancellationToken,
}

impl SinkContext {
    pub fn new(deactivate: DeactivateSender, cancel: CancellationToken) -> Self {
        Self { deactivate, cancel }
    }

    /// The deactivation sender a sink may retain for self-reporting.
    pub fn deactivate_sender(&self) -> DeactivateSender {
        self.deactivate.clone()
    }

    /// Token cancelled when the shutdown sequence starts. Long-lived sink
    /// tasks end on it instead of being aborted.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Sample output trait
///
/// All sink implementations must implement this trait.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Sink name - stable, unique, lowercase. Used as the registry key and as
    /// the deactivation-notice payload.
    fn name(&self) -> &str;

    /// Called once before activation. A failure excludes the sink from the
    /// active set for this run.
    ///
    /// # Errors
    /// Returns an initialization error (should include context)
    async fn initialize(&mut self, cx: &SinkContext) -> Result<(), BridgeError>;

    /// Fire-and-forget delivery of one sample.
    ///
    /// Must not block the dispatch loop indefinitely: sinks retry or drop
    /// internally and self-deactivate on unrecoverable failure.
    async fn output(&self, sample: &Sample);

    /// Idempotent, best-effort resource release.
    async fn close(&self);
}
