//! # Device
//!
//! Serial device layer for the UD-CO2S sensor.
//!
//! Responsibilities:
//! - USB discovery (vendor/product identifier lookup)
//! - Startup handshake that brings the device into a known streaming state
//! - Telemetry line parsing
//! - The reader loop that turns raw lines into `Sample`s

mod discovery;
mod protocol;
mod reader;
mod telemetry;

pub use discovery::{find_device, list_ports, open, UDCO2S_PID, UDCO2S_VID};
pub use protocol::{
    handshake, send_stop, COMMAND_ID, COMMAND_STA, COMMAND_STP, RESPONSE_NG, RESPONSE_OK,
    SETTLE_DELAY, STOP_ECHO,
};
pub use reader::read_loop;
pub use telemetry::{parse_telemetry, RawReading};
