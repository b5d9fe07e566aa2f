//! Dispatch engine - main loop for fan-out to sinks.

use std::sync::Arc;

use contracts::{DeactivateReceiver, Sample};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::registry::SinkRegistry;
use crate::shutdown::ShutdownCoordinator;

/// The dispatch engine: sole mutator of the active set and sole fan-out
/// point for samples.
pub struct Dispatcher {
    registry: Arc<SinkRegistry>,
    coordinator: Arc<ShutdownCoordinator>,
    sample_rx: mpsc::Receiver<Sample>,
    deactivate_rx: DeactivateReceiver,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<SinkRegistry>,
        coordinator: Arc<ShutdownCoordinator>,
        sample_rx: mpsc::Receiver<Sample>,
        deactivate_rx: DeactivateReceiver,
    ) -> Self {
        Self {
            registry,
            coordinator,
            sample_rx,
            deactivate_rx,
        }
    }

    /// Run the dispatch loop.
    ///
    /// Each iteration reacts to exactly one event, whichever is ready first
    /// (no priority between them):
    /// - a deactivation notice removes the named sink; an emptied set invokes
    ///   the shutdown coordinator and ends the loop;
    /// - a sample is delivered to a single consistent snapshot of the active
    ///   set, awaiting every sink before the next event;
    /// - a closed sample channel ends the loop without re-triggering shutdown.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) {
        info!(sinks = self.registry.len(), "Dispatcher started");

        let mut sample_count: u64 = 0;

        loop {
            tokio::select! {
                Some(name) = self.deactivate_rx.recv() => {
                    let remaining = self.registry.deactivate(&name);
                    warn!(sink = %name, remaining, "Outputter deactivated");
                    if remaining == 0 {
                        debug!("No outputters are alive");
                        self.coordinator.shutdown().await;
                        return;
                    }
                }
                sample = self.sample_rx.recv() => {
                    let Some(sample) = sample else {
                        debug!(samples = sample_count, "Sample channel closed");
                        return;
                    };
                    sample_count += 1;
                    let active = self.registry.snapshot();
                    for sink in active.values() {
                        sink.output(&sample).await;
                    }
                }
            }
        }
    }

    /// Spawn the dispatch loop as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
