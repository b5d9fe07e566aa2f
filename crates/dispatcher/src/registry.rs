//! Sink registry - the active-outputter set.
//!
//! The active set is an immutable snapshot behind a single shared reference:
//! every change builds a new map and publishes it wholesale, so readers
//! iterating a snapshot never observe a half-updated set.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use contracts::{BridgeConfig, BridgeError, OutputSink, SinkContext};
use tracing::{debug, info, instrument, warn};

use crate::sinks::available_sinks;

/// Shared handle to the active sink set.
///
/// The dispatch engine is the sole mutator; other components only read
/// snapshots. The set shrinks monotonically and never grows after startup.
pub struct SinkRegistry {
    active: RwLock<Arc<HashMap<String, Arc<dyn OutputSink>>>>,
}

impl SinkRegistry {
    /// Build the active set from configuration: construct every configured
    /// sink from the compile-time table, initialize it, and keep the ones
    /// that succeed. Names not matching an available sink are silently
    /// ignored; initialization failures exclude only that sink.
    ///
    /// # Errors
    /// `BridgeError::NoActiveSinks` when nothing survives activation.
    #[instrument(name = "registry_activate", skip(config, cx), fields(outputs = ?config.outputs))]
    pub async fn activate(config: &BridgeConfig, cx: &SinkContext) -> Result<Self, BridgeError> {
        let mut available = available_sinks(config);
        let mut active: HashMap<String, Arc<dyn OutputSink>> = HashMap::new();

        for requested in &config.outputs {
            let requested = requested.to_ascii_lowercase();
            let Some(idx) = available.iter().position(|s| s.name() == requested) else {
                debug!(sink = %requested, "No such outputter, ignored");
                continue;
            };
            let mut sink = available.swap_remove(idx);
            match sink.initialize(cx).await {
                Ok(()) => {
                    info!(sink = %requested, "Outputter activated");
                    active.insert(requested, Arc::from(sink));
                }
                Err(e) => {
                    warn!(sink = %requested, error = %e, "Initialize outputter failed, excluded");
                }
            }
        }

        if active.is_empty() {
            return Err(BridgeError::NoActiveSinks);
        }

        Ok(Self::with_active(active))
    }

    /// Wrap an already-built active set (used by tests).
    pub fn with_active(active: HashMap<String, Arc<dyn OutputSink>>) -> Self {
        Self {
            active: RwLock::new(Arc::new(active)),
        }
    }

    /// Take a consistent snapshot of the current active set.
    pub fn snapshot(&self) -> Arc<HashMap<String, Arc<dyn OutputSink>>> {
        Arc::clone(&self.active.read().expect("active set lock poisoned"))
    }

    /// Remove a sink by name, publishing a fresh set. Returns the number of
    /// sinks remaining. Unknown names are a no-op.
    pub fn deactivate(&self, name: &str) -> usize {
        let name = name.to_ascii_lowercase();
        let mut guard = self.active.write().expect("active set lock poisoned");
        if !guard.contains_key(&name) {
            return guard.len();
        }
        let next: HashMap<_, _> = guard
            .iter()
            .filter(|(k, _)| **k != name)
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        let remaining = next.len();
        *guard = Arc::new(next);
        remaining
    }

    /// Number of currently active sinks.
    pub fn len(&self) -> usize {
        self.active.read().expect("active set lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
