//! Telemetry reader loop.

use std::sync::Arc;
use std::time::Duration;

use contracts::{BridgeError, Sample};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::protocol::STOP_ECHO;
use crate::telemetry::parse_telemetry;

/// Continuously read newline-delimited text from the handshaken channel and
/// turn matching lines into `Sample`s on the channel.
///
/// Terminates with `Ok(())` on:
/// - the device's stop echo (`OK STP` prefix) - clean end-of-session;
/// - the serial channel being closed by another component;
/// - the sample channel being closed downstream.
///
/// # Errors
/// `BridgeError::Io` on read failure or read timeout. The caller triggers the
/// shutdown coordinator before surfacing the failure.
#[instrument(name = "device_read_loop", skip_all)]
pub async fn read_loop<R>(
    mut reader: R,
    tx: mpsc::Sender<Sample>,
    tags: Arc<[String]>,
    read_timeout: Duration,
) -> Result<(), BridgeError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut line = String::new();
        let n = timeout(read_timeout, reader.read_line(&mut line))
            .await
            .map_err(|_| BridgeError::read_timeout())??;

        if n == 0 {
            debug!("Serial channel closed");
            return Ok(());
        }

        let text = line.trim_end_matches(['\r', '\n']);
        if let Some(reading) = parse_telemetry(text) {
            let sample = Sample::now(
                reading.co2,
                reading.humidity,
                reading.temperature,
                Arc::clone(&tags),
            );
            if tx.send(sample).await.is_err() {
                debug!("Sample channel closed, stopping reader");
                return Ok(());
            }
        } else if text.starts_with(STOP_ECHO) {
            debug!("Stop echo received, clean end of session");
            return Ok(());
        } else {
            warn!(line = %text, "Read unmatched line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::io::{duplex, AsyncWriteExt, BufReader};

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn tags() -> Arc<[String]> {
        Arc::from(vec!["test".to_string()])
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_line_produces_sample() {
        let entry = Utc::now();
        let (driver, device) = duplex(1024);
        let (_device_rx, mut device_tx) = tokio::io::split(device);
        let (tx, mut rx) = mpsc::channel(8);

        device_tx
            .write_all(b"CO2=123,HUM=45.6,TMP=-7.8\r\n")
            .await
            .unwrap();

        let reader_task = tokio::spawn(read_loop(BufReader::new(driver), tx, tags(), TIMEOUT));

        let sample = rx.recv().await.expect("expected a sample");
        assert_eq!(sample.co2, 123);
        assert_eq!(sample.humidity, 45.6);
        assert_eq!(sample.temperature, -7.8);
        assert_eq!(sample.tags.as_ref(), ["test".to_string()]);
        assert!(sample.timestamp >= entry);

        // Close the device side; the reader exits cleanly.
        drop(device_tx);
        drop(_device_rx);
        assert!(reader_task.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_echo_terminates_without_sample() {
        let (driver, device) = duplex(1024);
        let (_device_rx, mut device_tx) = tokio::io::split(device);
        let (tx, mut rx) = mpsc::channel(8);

        device_tx.write_all(b"OK STP\r\n").await.unwrap();

        let result = read_loop(BufReader::new(driver), tx, tags(), TIMEOUT).await;
        assert!(result.is_ok());
        assert!(rx.try_recv().is_err(), "stop echo must not emit a sample");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_echo_prefix_is_enough() {
        let (driver, device) = duplex(1024);
        let (_device_rx, mut device_tx) = tokio::io::split(device);
        let (tx, _rx) = mpsc::channel(8);

        device_tx.write_all(b"OK STP extra text\r\n").await.unwrap();

        assert!(read_loop(BufReader::new(driver), tx, tags(), TIMEOUT)
            .await
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmatched_lines_are_skipped() {
        let (driver, device) = duplex(1024);
        let (_device_rx, mut device_tx) = tokio::io::split(device);
        let (tx, mut rx) = mpsc::channel(8);

        device_tx
            .write_all(b"some diagnostic noise\r\nCO2=400,HUM=40.0,TMP=20.0\r\nOK STP\r\n")
            .await
            .unwrap();

        let result = read_loop(BufReader::new(driver), tx, tags(), TIMEOUT).await;
        assert!(result.is_ok());

        let sample = rx.try_recv().expect("one sample expected");
        assert_eq!(sample.co2, 400);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout_is_io_error() {
        let (driver, device) = duplex(1024);
        // Keep the device end open but silent.
        let (tx, _rx) = mpsc::channel(8);

        let result = read_loop(BufReader::new(driver), tx, tags(), TIMEOUT).await;
        match result.unwrap_err() {
            BridgeError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::TimedOut),
            other => panic!("unexpected error: {other}"),
        }
        drop(device);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_sample_channel_stops_reader() {
        let (driver, device) = duplex(1024);
        let (_device_rx, mut device_tx) = tokio::io::split(device);
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        device_tx
            .write_all(b"CO2=1,HUM=2.0,TMP=3.0\r\n")
            .await
            .unwrap();

        assert!(read_loop(BufReader::new(driver), tx, tags(), TIMEOUT)
            .await
            .is_ok());
    }
}
