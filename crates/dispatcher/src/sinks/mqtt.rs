//! MqttSink - publishes samples as JSON to a broker topic.

use std::time::Duration;

use async_trait::async_trait;
use contracts::{BridgeError, MqttConfig, OutputSink, Sample, SinkContext};
use rumqttc::{AsyncClient, MqttOptions, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

const SINK_NAME: &str = "mqtt";

/// Consecutive event-loop errors tolerated before the sink reports itself
/// dead.
const MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Delay between reconnection attempts of the event loop.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Sink that publishes each sample to an MQTT topic.
///
/// `initialize` spawns the event-loop driver task; persistent connection
/// failure makes the sink self-deactivate instead of blocking the dispatch
/// loop.
pub struct MqttSink {
    config: MqttConfig,
    client: Option<AsyncClient>,
    driver: Option<JoinHandle<()>>,
}

impl MqttSink {
    pub fn new(config: &MqttConfig) -> Self {
        Self {
            config: config.clone(),
            client: None,
            driver: None,
        }
    }

    fn qos(&self) -> QoS {
        match self.config.qos {
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            _ => QoS::AtMostOnce,
        }
    }
}

#[async_trait]
impl OutputSink for MqttSink {
    fn name(&self) -> &str {
        SINK_NAME
    }

    async fn initialize(&mut self, cx: &SinkContext) -> Result<(), BridgeError> {
        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            options.set_credentials(username.clone(), password.clone());
        }

        let (client, mut event_loop) = AsyncClient::new(options, 16);
        let deactivate = cx.deactivate_sender();
        let cancel = cx.cancel_token();

        // Event-loop driver. Connection errors are retried; a run of
        // consecutive failures is treated as unrecoverable and the sink
        // reports itself for deactivation. The shutdown token ends the task.
        let driver = tokio::spawn(async move {
            let mut consecutive_errors = 0u32;
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(sink = SINK_NAME, "Driver stopped by shutdown");
                        return;
                    }
                    event = event_loop.poll() => event,
                };
                match event {
                    Ok(event) => {
                        consecutive_errors = 0;
                        trace!(sink = SINK_NAME, event = ?event, "MQTT event");
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        warn!(
                            sink = SINK_NAME,
                            error = %e,
                            attempts = consecutive_errors,
                            "MQTT connection error"
                        );
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            error!(sink = SINK_NAME, "MQTT connection lost, deactivating");
                            deactivate.deactivate(SINK_NAME);
                            return;
                        }
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                debug!(sink = SINK_NAME, "Driver stopped by shutdown");
                                return;
                            }
                            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                        }
                    }
                }
            }
        });

        debug!(
            sink = SINK_NAME,
            host = %self.config.host,
            port = self.config.port,
            topic = %self.config.topic,
            "MQTT client started"
        );

        self.client = Some(client);
        self.driver = Some(driver);
        Ok(())
    }

    async fn output(&self, sample: &Sample) {
        let Some(client) = &self.client else {
            return;
        };
        let payload = match serde_json::to_vec(sample) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(sink = SINK_NAME, error = %e, "Serialize failed");
                return;
            }
        };
        // try_publish keeps the dispatch loop non-blocking; a full request
        // queue drops the sample.
        if let Err(e) = client.try_publish(
            &self.config.topic,
            self.qos(),
            self.config.retain,
            payload,
        ) {
            warn!(sink = SINK_NAME, error = %e, "Publish dropped");
        }
    }

    async fn close(&self) {
        if let Some(client) = &self.client {
            let _ = client.disconnect().await;
        }
        if let Some(driver) = &self.driver {
            driver.abort();
        }
        debug!(sink = SINK_NAME, "Closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qos_mapping() {
        let mut config = MqttConfig::default();
        assert!(matches!(MqttSink::new(&config).qos(), QoS::AtMostOnce));
        config.qos = 1;
        assert!(matches!(MqttSink::new(&config).qos(), QoS::AtLeastOnce));
        config.qos = 2;
        assert!(matches!(MqttSink::new(&config).qos(), QoS::ExactlyOnce));
    }

    #[tokio::test]
    async fn test_output_before_initialize_is_noop() {
        let sink = MqttSink::new(&MqttConfig::default());
        let sample = Sample::now(400, 40.0, 20.0, std::sync::Arc::from(Vec::new()));
        // No client yet: must not panic or block.
        sink.output(&sample).await;
        sink.close().await;
    }

    #[tokio::test]
    async fn test_driver_ends_on_cancellation() {
        use contracts::{DeactivateSender, SinkContext};
        use tokio_util::sync::CancellationToken;

        let cancel = CancellationToken::new();
        let (deactivate, mut deactivate_rx) = DeactivateSender::channel();
        let cx = SinkContext::new(deactivate, cancel.clone());

        let mut sink = MqttSink::new(&MqttConfig::default());
        sink.initialize(&cx).await.unwrap();

        cancel.cancel();
        let driver = sink.driver.take().expect("driver spawned at initialize");
        tokio::time::timeout(Duration::from_secs(5), driver)
            .await
            .expect("driver must end once cancelled")
            .unwrap();

        // Ending by cancellation is not a failure report.
        assert!(deactivate_rx.try_recv().is_err());
    }
}
