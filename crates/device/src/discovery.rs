//! Serial port discovery and opening.

use contracts::{BridgeError, DeviceConfig};
use tokio_serial::{
    DataBits, Parity, SerialPortBuilderExt, SerialPortInfo, SerialPortType, SerialStream, StopBits,
};
use tracing::debug;

/// USB vendor identifier of the UD-CO2S (Microchip).
pub const UDCO2S_VID: u16 = 0x04D8;

/// USB product identifier of the UD-CO2S.
pub const UDCO2S_PID: u16 = 0xE95A;

/// Enumerate serial ports and select the one matching the UD-CO2S
/// vendor/product identifiers.
///
/// # Errors
/// `BridgeError::Discovery` when enumeration fails or no port matches.
pub fn find_device() -> Result<String, BridgeError> {
    let ports = list_ports()?;

    for port in &ports {
        if let SerialPortType::UsbPort(usb) = &port.port_type {
            if usb.vid == UDCO2S_VID && usb.pid == UDCO2S_PID {
                debug!(port = %port.port_name, vid = usb.vid, pid = usb.pid, "Found UD-CO2S");
                return Ok(port.port_name.clone());
            }
        }
    }

    Err(BridgeError::discovery("UD-CO2S not found"))
}

/// Enumerate all serial ports on the system.
pub fn list_ports() -> Result<Vec<SerialPortInfo>, BridgeError> {
    tokio_serial::available_ports()
        .map_err(|e| BridgeError::discovery(format!("serial port enumeration failed: {e}")))
}

/// Open the serial port with the device's line settings (8 data bits, 1 stop
/// bit, no parity).
pub fn open(path: &str, config: &DeviceConfig) -> Result<SerialStream, BridgeError> {
    let builder = tokio_serial::new(path, config.baud)
        .data_bits(DataBits::Eight)
        .stop_bits(StopBits::One)
        .parity(Parity::None);

    let stream = builder
        .open_native_async()
        .map_err(|e| BridgeError::Io(e.into()))?;

    debug!(port = %path, baud = config.baud, "Serial port opened");
    Ok(stream)
}
