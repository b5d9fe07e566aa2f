//! StdoutSink - JSON line per sample on standard output.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use contracts::{BridgeError, DeactivateSender, OutputSink, Sample, SinkContext, StdoutConfig};
use tracing::{debug, warn};

const SINK_NAME: &str = "stdout";

/// Sink that prints each sample as a JSON line, optionally throttled to one
/// sample per interval.
///
/// A write failure (for example a closed pipe on the consuming side) makes
/// the sink report itself for deactivation instead of propagating.
pub struct StdoutSink {
    interval: Duration,
    last_emit: Mutex<Option<Instant>>,
    out: Mutex<Box<dyn Write + Send>>,
    deactivate: Option<DeactivateSender>,
}

impl StdoutSink {
    pub fn new(config: &StdoutConfig) -> Self {
        Self::with_writer(config, Box::new(io::stdout()))
    }

    fn with_writer(config: &StdoutConfig, out: Box<dyn Write + Send>) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            last_emit: Mutex::new(None),
            out: Mutex::new(out),
            deactivate: None,
        }
    }

    /// Throttle check: true when the interval has elapsed since the previous
    /// emitted sample (always true with a zero interval).
    fn due(&self) -> bool {
        if self.interval.is_zero() {
            return true;
        }
        let mut last = self.last_emit.lock().expect("throttle lock poisoned");
        match *last {
            Some(at) if at.elapsed() < self.interval => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }
}

#[async_trait]
impl OutputSink for StdoutSink {
    fn name(&self) -> &str {
        SINK_NAME
    }

    async fn initialize(&mut self, cx: &SinkContext) -> Result<(), BridgeError> {
        self.deactivate = Some(cx.deactivate_sender());
        Ok(())
    }

    async fn output(&self, sample: &Sample) {
        if !self.due() {
            return;
        }
        let json = match serde_json::to_string(sample) {
            Ok(json) => json,
            Err(e) => {
                warn!(sink = SINK_NAME, error = %e, "Serialize failed");
                return;
            }
        };
        let result = {
            let mut out = self.out.lock().expect("writer lock poisoned");
            writeln!(out, "{json}")
        };
        if let Err(e) = result {
            warn!(sink = SINK_NAME, error = %e, "Write failed, deactivating");
            if let Some(deactivate) = &self.deactivate {
                deactivate.deactivate(SINK_NAME);
            }
        }
    }

    async fn close(&self) {
        let _ = self.out.lock().expect("writer lock poisoned").flush();
        debug!(sink = SINK_NAME, "Closed");
    }
}
