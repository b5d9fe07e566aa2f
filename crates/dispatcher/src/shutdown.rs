//! Shutdown coordinator - the once-only release sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use crate::registry::SinkRegistry;

/// Exit status used when the device fails to answer the stop command before
/// the hard deadline.
pub const EXIT_NO_DEVICE_RESPONSE: i32 = 128;

type StopPort = Box<dyn AsyncWrite + Send + Unpin>;

/// Executes the release sequence exactly once, from whichever trigger fires
/// first: OS signal, reader failure, or the active set reaching empty.
pub struct ShutdownCoordinator {
    latch: AtomicBool,
    cancel: CancellationToken,
    registry: Arc<SinkRegistry>,
    stop_port: Mutex<Option<StopPort>>,
    exit_deadline: Option<Duration>,
}

impl ShutdownCoordinator {
    pub fn new(registry: Arc<SinkRegistry>) -> Self {
        Self {
            latch: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            registry,
            stop_port: Mutex::new(None),
            exit_deadline: None,
        }
    }

    /// Arm the hard-exit deadline: once `shutdown` has run, the process is
    /// force-terminated with [`EXIT_NO_DEVICE_RESPONSE`] unless it exits
    /// normally first. Not set in tests.
    pub fn with_exit_deadline(mut self, deadline: Duration) -> Self {
        self.exit_deadline = Some(deadline);
        self
    }

    /// Use an externally-created token instead of the default one, so the
    /// same token can also be handed to sinks before the coordinator exists.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The shared cancellation token broadcast by `shutdown`.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Retain the device write half for the best-effort stop command.
    pub async fn set_stop_port(&self, port: impl AsyncWrite + Send + Unpin + 'static) {
        *self.stop_port.lock().await = Some(Box::new(port));
    }

    /// Whether the release sequence has already run (or is running).
    pub fn is_shut_down(&self) -> bool {
        self.latch.load(Ordering::SeqCst)
    }

    /// Run the release sequence. Idempotent and concurrency-safe: concurrent
    /// triggers compete on the latch and only the first proceeds. Each step is
    /// attempted even if an earlier one failed:
    /// 1. cancel the shared context;
    /// 2. close every sink in the active set (failures logged by the sinks);
    /// 3. best-effort stop command to the device, which may already be gone;
    /// 4. arm the forced-exit deadline, if configured.
    #[instrument(name = "shutdown", skip(self))]
    pub async fn shutdown(&self) {
        if self.latch.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Shutdown sequence started");

        self.cancel.cancel();

        for (name, sink) in self.registry.snapshot().iter() {
            sink.close().await;
            debug!(sink = %name, "Sink closed");
        }

        if let Some(mut port) = self.stop_port.lock().await.take() {
            debug!(command = %device::COMMAND_STP, "Sending stop command");
            let _ = device::send_stop(&mut port).await;
        }

        if let Some(deadline) = self.exit_deadline {
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                error!("No response from device");
                std::process::exit(EXIT_NO_DEVICE_RESPONSE);
            });
        }
    }
}
