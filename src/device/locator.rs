//! Port enumeration and best-guess device selection.

use serialport::SerialPortType;

use super::{DeviceError, DeviceRef};

/// Description keywords that identify common Arduino-class USB bridges.
pub const DEFAULT_KEYWORDS: [&str; 4] = ["ARDUINO", "CH340", "USB SERIAL", "FTDI"];

/// One enumerated port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS port name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

impl PortInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Source of the available port list.
pub trait PortEnumerator {
    /// List ports in OS order.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Enumerate`] if the OS query fails.
    fn list_ports(&self) -> Result<Vec<PortInfo>, DeviceError>;
}

/// A fixed port list, mostly useful for tests and dry runs.
impl PortEnumerator for Vec<PortInfo> {
    fn list_ports(&self) -> Result<Vec<PortInfo>, DeviceError> {
        Ok(self.clone())
    }
}

/// Enumerates ports through the `serialport` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn list_ports(&self) -> Result<Vec<PortInfo>, DeviceError> {
        let ports = serialport::available_ports()
            .map_err(|e| DeviceError::Enumerate(e.to_string()))?;
        log::debug!("OS reported {} serial ports", ports.len());

        Ok(ports
            .into_iter()
            .map(|p| PortInfo::new(p.port_name, describe(&p.port_type)))
            .collect())
    }
}

/// Build a description comparable to what OS device managers show.
fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let parts: Vec<&str> = [usb.product.as_deref(), usb.manufacturer.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if parts.is_empty() {
                format!("USB Serial Device ({:04x}:{:04x})", usb.vid, usb.pid)
            } else {
                parts.join(" - ")
            }
        }
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => "Unknown".to_string(),
    }
}

/// Pick the logging device from a port list.
///
/// The first port whose description contains any keyword (case-insensitive)
/// wins. Without a match the first port is used; an empty list yields `None`.
/// With several matching devices the result follows the OS enumeration order.
#[must_use]
pub fn detect<S: AsRef<str>>(ports: &[PortInfo], keywords: &[S]) -> Option<DeviceRef> {
    let matched = ports.iter().find(|port| {
        let description = port.description.to_uppercase();
        keywords
            .iter()
            .any(|k| description.contains(&k.as_ref().to_uppercase()))
    });

    match matched {
        Some(port) => {
            log::info!("Detected device on {} ({})", port.name, port.description);
            Some(DeviceRef::new(&port.name))
        }
        None => {
            let first = ports.first()?;
            log::info!(
                "No known device description, falling back to first port {}",
                first.name
            );
            Some(DeviceRef::new(&first.name))
        }
    }
}
