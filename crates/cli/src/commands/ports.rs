//! `ports` command implementation.

use anyhow::Result;
use tokio_serial::SerialPortType;

use crate::cli::PortsArgs;

/// Execute the `ports` command
pub fn run_ports(args: &PortsArgs) -> Result<()> {
    if args.matching {
        let port = device::find_device()?;
        println!("{port}");
        return Ok(());
    }

    let ports = device::list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    for port in ports {
        match port.port_type {
            SerialPortType::UsbPort(usb) => {
                let product = usb.product.unwrap_or_default();
                println!(
                    "{}  usb {:04x}:{:04x}  {}",
                    port.port_name, usb.vid, usb.pid, product
                );
            }
            other => println!("{}  {:?}", port.port_name, other),
        }
    }

    Ok(())
}
