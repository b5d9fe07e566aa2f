//! Pipeline orchestrator.
//!
//! Wires the serial device to the dispatch engine: discover and open the
//! port, run the command handshake, activate the configured sinks, then pump
//! telemetry until the device goes quiet or an interrupt arrives.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{BridgeConfig, DeactivateSender, Sample, SinkContext};
use dispatcher::{Dispatcher, ShutdownCoordinator, SinkRegistry};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Exit code when a second interrupt arrives before shutdown completes.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Grace period after a shutdown starts before the process is forced down.
const EXIT_DEADLINE: Duration = Duration::from_secs(1);

/// How long to wait for the dispatch task to drain after the reader returns.
const DISPATCH_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub config: BridgeConfig,
    /// Capacity of the sample channel between reader and dispatcher.
    pub buffer_size: usize,
}

/// Orchestrates the device reader, sink registry, and dispatch engine.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the bridge until the device stops producing or shutdown completes.
    #[instrument(name = "pipeline_run", skip(self))]
    pub async fn run(self) -> Result<()> {
        let cfg = &self.config.config;

        // Resolve the serial port, preferring an explicit configuration.
        let port = match cfg.device.port.clone() {
            Some(port) => port,
            None => device::find_device().context("Device discovery failed")?,
        };
        info!(port = %port, baud = cfg.device.baud, "Using serial port");

        let stream = device::open(&port, &cfg.device)
            .with_context(|| format!("Failed to open serial port {port}"))?;
        let (rx_half, mut tx_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(rx_half);

        device::handshake(&mut reader, &mut tx_half)
            .await
            .context("Device handshake failed")?;
        info!("Device handshake complete, streaming started");

        // Sink activation. An empty active set is fatal before streaming.
        // Sinks and coordinator share one cancellation token so long-lived
        // sink tasks end when the shutdown sequence starts.
        let cancel = CancellationToken::new();
        let (deactivate_tx, deactivate_rx) = DeactivateSender::channel();
        let cx = SinkContext::new(deactivate_tx, cancel.clone());
        let registry = Arc::new(
            SinkRegistry::activate(cfg, &cx)
                .await
                .context("Sink activation failed")?,
        );
        info!(sinks = registry.len(), "Sinks activated");

        let coordinator = Arc::new(
            ShutdownCoordinator::new(Arc::clone(&registry))
                .with_cancel_token(cancel)
                .with_exit_deadline(EXIT_DEADLINE),
        );
        coordinator.set_stop_port(tx_half).await;

        spawn_signal_watcher(Arc::clone(&coordinator));

        let (sample_tx, sample_rx) = mpsc::channel::<Sample>(self.config.buffer_size);
        let dispatch_handle = Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&coordinator),
            sample_rx,
            deactivate_rx,
        )
        .spawn();

        let tags: Arc<[String]> = Arc::from(cfg.tags.clone());
        let read_timeout = Duration::from_secs(cfg.device.read_timeout_secs);

        // `sample_tx` moves into the reader; when the loop returns the sample
        // channel closes and the dispatch task drains out on its own.
        let read_result = device::read_loop(reader, sample_tx, tags, read_timeout).await;

        if let Err(ref e) = read_result {
            error!(error = %e, "Device read failed");
        }
        coordinator.shutdown().await;

        if tokio::time::timeout(DISPATCH_DRAIN_TIMEOUT, dispatch_handle)
            .await
            .is_err()
        {
            warn!("Dispatcher did not drain in time");
        }

        read_result.context("Device read loop failed")?;
        Ok(())
    }
}

/// Watch for interrupt signals. The first triggers a coordinated shutdown;
/// a second one forces the process down immediately.
fn spawn_signal_watcher(coordinator: Arc<ShutdownCoordinator>) {
    tokio::spawn(async move {
        let mut interrupts: u32 = 0;
        loop {
            wait_for_signal().await;
            interrupts += 1;
            if interrupts == 1 {
                warn!("Interrupt received, shutting down");
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move { coordinator.shutdown().await });
            } else {
                error!("Second interrupt, exiting immediately");
                std::process::exit(EXIT_INTERRUPTED);
            }
        }
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, watching Ctrl-C only");
            tokio::signal::ctrl_c().await.ok();
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    tokio::signal::ctrl_c().await.ok();
}
