//! # Integration Tests
//!
//! Cross-crate tests covering:
//! - contract snapshots (wire shapes, config loading)
//! - mock end-to-end pipelines (no physical device)

#[cfg(test)]
mod contract_tests {
    use std::sync::Arc;

    use contracts::Sample;

    #[test]
    fn sample_wire_shape_is_stable() {
        let tags: Arc<[String]> = Arc::from(vec!["office".to_string()]);
        let sample = Sample::now(834, 41.5, 23.1, tags);

        let value: serde_json::Value = serde_json::from_str(&serde_json::to_string(&sample).unwrap()).unwrap();
        assert_eq!(value["co2"], 834);
        assert_eq!(value["humidity"], 41.5);
        assert_eq!(value["temperature"], 23.1);
        assert_eq!(value["tags"][0], "office");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn config_loads_from_toml() {
        let toml = r#"
            tags = ["lab"]
            outputs = ["stdout", "prometheus"]

            [device]
            port = "/dev/ttyACM0"

            [prometheus]
            port = 9191
        "#;

        let config =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(config.outputs, vec!["stdout", "prometheus"]);
        assert_eq!(config.device.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.device.baud, 115200);
        assert_eq!(config.prometheus.port, 9191);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use contracts::{
        BridgeError, DeactivateSender, OutputSink, Sample, SinkContext,
    };
    use dispatcher::{Dispatcher, ShutdownCoordinator, SinkRegistry};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::sync::mpsc;

    /// Records every delivery and close call.
    struct CountingSink {
        outputs: Arc<AtomicU64>,
        closes: Arc<AtomicU64>,
    }

    #[async_trait]
    impl OutputSink for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }

        async fn initialize(&mut self, _cx: &SinkContext) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn output(&self, _sample: &Sample) {
            self.outputs.fetch_add(1, Ordering::SeqCst);
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Reports itself dead on the first delivery.
    struct FailingSink {
        deactivate: DeactivateSender,
    }

    #[async_trait]
    impl OutputSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn initialize(&mut self, _cx: &SinkContext) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn output(&self, _sample: &Sample) {
            self.deactivate.deactivate("failing");
        }

        async fn close(&self) {}
    }

    fn registry_with(
        name: &str,
        sink: Arc<dyn OutputSink>,
    ) -> Arc<SinkRegistry> {
        let mut active: HashMap<String, Arc<dyn OutputSink>> = HashMap::new();
        active.insert(name.to_string(), sink);
        Arc::new(SinkRegistry::with_active(active))
    }

    /// Full mock pipeline: handshake, telemetry stream, dispatch fan-out,
    /// coordinated shutdown with the stop command on the wire.
    #[tokio::test(start_paused = true)]
    async fn e2e_mock_device_pipeline() {
        let (host, device_end) = tokio::io::duplex(4096);
        let (host_rx, mut host_tx) = tokio::io::split(host);
        let (dev_rx, mut dev_tx) = tokio::io::split(device_end);
        let mut reader = BufReader::new(host_rx);

        // Mock device: acknowledge each handshake command, stream three
        // readings plus noise, then close the send side and capture whatever
        // the host writes afterwards.
        let driver = tokio::spawn(async move {
            let mut dev_reader = BufReader::new(dev_rx);
            let mut commands = Vec::new();
            for _ in 0..3 {
                let mut line = String::new();
                dev_reader.read_line(&mut line).await.unwrap();
                commands.push(line.trim_end().to_string());
                dev_tx.write_all(b"OK\r\n").await.unwrap();
            }

            dev_tx
                .write_all(
                    b"CO2=1234,HUM=45.6,TMP=21.3\r\n\
                      garbage line\r\n\
                      CO2=1301,HUM=44.9,TMP=21.4\r\n\
                      CO2=1287,HUM=45.1,TMP=21.2\r\n",
                )
                .await
                .unwrap();
            dev_tx.shutdown().await.unwrap();

            let mut after_eof = String::new();
            dev_reader.read_line(&mut after_eof).await.unwrap();
            (commands, after_eof)
        });

        device::handshake(&mut reader, &mut host_tx).await.unwrap();

        let outputs = Arc::new(AtomicU64::new(0));
        let closes = Arc::new(AtomicU64::new(0));
        let registry = registry_with(
            "counting",
            Arc::new(CountingSink {
                outputs: Arc::clone(&outputs),
                closes: Arc::clone(&closes),
            }),
        );

        let coordinator = Arc::new(ShutdownCoordinator::new(Arc::clone(&registry)));
        coordinator.set_stop_port(host_tx).await;

        let (sample_tx, sample_rx) = mpsc::channel::<Sample>(16);
        let (_deactivate_tx, deactivate_rx) = DeactivateSender::channel();
        let handle = Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&coordinator),
            sample_rx,
            deactivate_rx,
        )
        .spawn();

        let tags: Arc<[String]> = Arc::from(vec!["test".to_string()]);
        device::read_loop(reader, sample_tx, tags, Duration::from_secs(10))
            .await
            .unwrap();

        coordinator.shutdown().await;
        handle.await.unwrap();

        let (commands, after_eof) = driver.await.unwrap();
        assert_eq!(commands, vec!["STP", "ID?", "STA"]);
        assert_eq!(after_eof, "STP\r\n");
        assert_eq!(outputs.load(Ordering::SeqCst), 3);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    /// A sink that reports itself dead empties the active set, which triggers
    /// a coordinated shutdown and ends the dispatch loop.
    #[tokio::test]
    async fn deactivation_cascade_shuts_down() {
        let (deactivate_tx, deactivate_rx) = DeactivateSender::channel();
        let registry = registry_with(
            "failing",
            Arc::new(FailingSink {
                deactivate: deactivate_tx,
            }),
        );

        let coordinator = Arc::new(ShutdownCoordinator::new(Arc::clone(&registry)));
        let (sample_tx, sample_rx) = mpsc::channel::<Sample>(16);
        let handle = Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&coordinator),
            sample_rx,
            deactivate_rx,
        )
        .spawn();

        let tags: Arc<[String]> = Arc::from(Vec::new());
        sample_tx.send(Sample::now(900, 40.0, 22.0, tags)).await.unwrap();

        handle.await.unwrap();
        assert!(coordinator.is_shut_down());
        assert!(registry.is_empty());
    }
}
