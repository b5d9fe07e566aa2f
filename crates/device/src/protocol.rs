//! Device protocol driver - startup handshake.
//!
//! Brings the sensor from an unknown power-on state into a known streaming
//! state before any telemetry is trusted: `STP` (stop streaming), `ID?`
//! (identify), `STA` (start streaming), each acknowledged with an `OK` line.

use std::io;
use std::time::Duration;

use contracts::BridgeError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{sleep, timeout};
use tracing::{debug, instrument, trace};

/// Stop-streaming command.
pub const COMMAND_STP: &str = "STP";
/// Identify command.
pub const COMMAND_ID: &str = "ID?";
/// Start-streaming command.
pub const COMMAND_STA: &str = "STA";

/// Acknowledgement prefix.
pub const RESPONSE_OK: &str = "OK";
/// Rejection prefix.
pub const RESPONSE_NG: &str = "NG";

/// Echo line the device emits once it has stopped streaming; the reader loop
/// treats it as the clean end-of-session signal.
pub const STOP_ECHO: &str = "OK STP";

/// Settle delay between sending a command and awaiting its response. A timing
/// requirement of the hardware, not an optimization.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Maximum time to wait for a handshake response line.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the three-command startup handshake.
///
/// Commands are sent in a fixed order; each must be acknowledged with an `OK`
/// line before the next is sent. Non-ack lines received in between are device
/// chatter and are ignored.
///
/// # Errors
/// - `BridgeError::Protocol` when the device rejects a command (`NG`); no
///   further commands are sent.
/// - `BridgeError::Io` on write failure, read failure or response timeout.
///
/// No retries: retry policy, if any, belongs to the caller.
#[instrument(name = "device_handshake", skip(reader, writer))]
pub async fn handshake<R, W>(reader: &mut R, writer: &mut W) -> Result<(), BridgeError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    for command in [COMMAND_STP, COMMAND_ID, COMMAND_STA] {
        write_command(writer, command).await?;
        sleep(SETTLE_DELAY).await;
        await_ack(reader, command).await?;
        debug!(command = %command, "Command acknowledged");
    }
    debug!("Device ready, streaming started");
    Ok(())
}

/// Best-effort stop command, used by the shutdown sequence. The device may
/// already be gone, so the caller ignores the result.
pub async fn send_stop<W>(writer: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_command(writer, COMMAND_STP).await
}

async fn write_command<W>(writer: &mut W, command: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    trace!(command = %command, "Sending command");
    writer.write_all(format!("{command}\r\n").as_bytes()).await?;
    writer.flush().await
}

/// Wait for an `OK`/`NG` classification of the given command, skipping
/// chatter lines. Lines shorter than the ack prefix are treated as chatter
/// rather than indexed into.
async fn await_ack<R>(reader: &mut R, command: &str) -> Result<(), BridgeError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut line = String::new();
        let n = timeout(RESPONSE_TIMEOUT, reader.read_line(&mut line))
            .await
            .map_err(|_| BridgeError::read_timeout())??;

        if n == 0 {
            return Err(BridgeError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "serial channel closed during handshake",
            )));
        }

        let text = line.trim_end_matches(['\r', '\n']);
        if text.len() < RESPONSE_OK.len() {
            trace!(line = %text, "Skipping short line");
            continue;
        }

        if text.starts_with(RESPONSE_OK) {
            return Ok(());
        }
        if text.starts_with(RESPONSE_NG) {
            return Err(BridgeError::protocol(command, text));
        }

        trace!(line = %text, "Skipping chatter line");
    }
}
