//! PrometheusSink - gauge exposition over an HTTP metrics endpoint.

use async_trait::async_trait;
use contracts::{BridgeError, OutputSink, PrometheusConfig, Sample, SinkContext};
use metrics::{describe_gauge, gauge, Gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, instrument};

const SINK_NAME: &str = "prometheus";

/// Gauge handles owned by the sink instance, registered during `initialize`.
struct Gauges {
    co2: Gauge,
    humidity: Gauge,
    temperature: Gauge,
}

/// Sink that mirrors the latest sample into Prometheus gauges served on a
/// `/metrics` HTTP listener.
pub struct PrometheusSink {
    config: PrometheusConfig,
    gauges: Option<Gauges>,
}

impl PrometheusSink {
    pub fn new(config: &PrometheusConfig) -> Self {
        Self {
            config: config.clone(),
            gauges: None,
        }
    }
}

#[async_trait]
impl OutputSink for PrometheusSink {
    fn name(&self) -> &str {
        SINK_NAME
    }

    #[instrument(name = "prometheus_sink_initialize", skip(self, _cx), fields(port = self.config.port))]
    async fn initialize(&mut self, _cx: &SinkContext) -> Result<(), BridgeError> {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], self.config.port))
            .install()
            .map_err(|e| BridgeError::sink(SINK_NAME, format!("exporter install failed: {e}")))?;

        describe_gauge!("co2", "CO2 concentration");
        describe_gauge!("humidity", "Humidity");
        describe_gauge!("temperature", "Temperature");

        self.gauges = Some(Gauges {
            co2: gauge!("co2", "tag" => "CO2"),
            humidity: gauge!("humidity", "tag" => "Humidity"),
            temperature: gauge!("temperature", "tag" => "Temperature"),
        });

        debug!(sink = SINK_NAME, port = self.config.port, "Metrics endpoint initialized");
        Ok(())
    }

    async fn output(&self, sample: &Sample) {
        if let Some(gauges) = &self.gauges {
            gauges.co2.set(sample.co2 as f64);
            gauges.humidity.set(sample.humidity);
            gauges.temperature.set(sample.temperature);
        }
    }

    async fn close(&self) {
        // The exporter has no uninstall; the listener ends with the process.
        debug!(sink = SINK_NAME, "Closed");
    }
}
