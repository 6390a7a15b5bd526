use serde::Serialize;
use serialport::SerialPortType;

use crate::error::{PortError, Result};

/// A serial port visible to the operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    pub name: String,
    pub port_type: &'static str,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

/// Enumerate serial ports, sorted by name.
///
/// On macOS only `/dev/cu.*` devices are listed; the matching `/dev/tty.*`
/// nodes block on open waiting for carrier detect.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(PortError::Enumerate)?;

    let mut infos: Vec<PortInfo> = ports
        .into_iter()
        .filter(|p| !hidden_port(&p.port_name))
        .map(|p| port_info(p.port_name, p.port_type))
        .collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(infos)
}

fn port_info(name: String, port_type: SerialPortType) -> PortInfo {
    match port_type {
        SerialPortType::UsbPort(usb) => PortInfo {
            name,
            port_type: "usb",
            manufacturer: usb.manufacturer,
            product: usb.product,
            serial_number: usb.serial_number,
            vid: Some(usb.vid),
            pid: Some(usb.pid),
        },
        SerialPortType::BluetoothPort => bare(name, "bluetooth"),
        SerialPortType::PciPort => bare(name, "pci"),
        SerialPortType::Unknown => bare(name, "unknown"),
    }
}

fn bare(name: String, port_type: &'static str) -> PortInfo {
    PortInfo {
        name,
        port_type,
        manufacturer: None,
        product: None,
        serial_number: None,
        vid: None,
        pid: None,
    }
}

#[cfg(target_os = "macos")]
fn hidden_port(name: &str) -> bool {
    name.starts_with("/dev/tty.")
}

#[cfg(not(target_os = "macos"))]
fn hidden_port(_name: &str) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    #[test]
    fn usb_port_keeps_descriptor_fields() {
        let info = port_info(
            "/dev/ttyACM0".to_string(),
            SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x2341,
                pid: 0x0043,
                serial_number: Some("8573".to_string()),
                manufacturer: Some("Arduino".to_string()),
                product: Some("Uno".to_string()),
            }),
        );

        assert_eq!(info.port_type, "usb");
        assert_eq!(info.vid, Some(0x2341));
        assert_eq!(info.pid, Some(0x0043));
        assert_eq!(info.manufacturer.as_deref(), Some("Arduino"));
    }

    #[test]
    fn non_usb_port_has_no_descriptor() {
        let info = port_info("/dev/ttyS0".to_string(), SerialPortType::PciPort);
        assert_eq!(info.port_type, "pci");
        assert!(info.vid.is_none());
        assert!(info.product.is_none());
    }
}
