//! Opening a device and reading text lines from it.

use std::io::{self, BufRead, BufReader};
use std::time::Duration;

use serialport::SerialPort;

use super::{DeviceError, DeviceRef};

/// Connection parameters for the logging device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    /// Baud rate.
    pub baud_rate: u32,
    /// Upper bound on a single read; also bounds stop latency.
    pub read_timeout: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// A device that yields newline-terminated text.
pub trait LineSource: Send {
    /// Read the next complete line, without its line terminator.
    ///
    /// Returns `Ok(None)` when the read timeout elapses before a full line
    /// arrives. Bytes of an incomplete line are kept for the next call.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Read`] on I/O failure or
    /// [`DeviceError::Decode`] for non UTF-8 data.
    fn read_line(&mut self) -> Result<Option<String>, DeviceError>;
}

/// Opens [`LineSource`]s for a device reference.
pub trait DeviceConnector {
    /// Open the device.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Open`] if the port cannot be opened.
    fn connect(
        &self,
        device: &DeviceRef,
        settings: &LinkSettings,
    ) -> Result<Box<dyn LineSource>, DeviceError>;
}

/// Connector for real serial ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl DeviceConnector for SerialConnector {
    fn connect(
        &self,
        device: &DeviceRef,
        settings: &LinkSettings,
    ) -> Result<Box<dyn LineSource>, DeviceError> {
        let link = SerialLink::open(device, settings)?;
        Ok(Box::new(link))
    }
}

/// A serial port read line by line.
pub struct SerialLink {
    reader: BufReader<Box<dyn SerialPort>>,
    pending: Vec<u8>,
}

impl SerialLink {
    /// Open `device` with the given baud rate and read timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Open`] if the port is missing or busy.
    pub fn open(device: &DeviceRef, settings: &LinkSettings) -> Result<Self, DeviceError> {
        let port = serialport::new(device.port(), settings.baud_rate)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| DeviceError::Open {
                port: device.port().to_string(),
                message: e.to_string(),
            })?;
        log::info!(
            "Opened {} at {} baud (timeout {:?})",
            device,
            settings.baud_rate,
            settings.read_timeout
        );
        Ok(Self::from_reader(port))
    }

    fn from_reader(port: Box<dyn SerialPort>) -> Self {
        Self {
            reader: BufReader::new(port),
            pending: Vec::new(),
        }
    }
}

impl LineSource for SerialLink {
    fn read_line(&mut self) -> Result<Option<String>, DeviceError> {
        read_buffered_line(&mut self.reader, &mut self.pending)
    }
}

/// Shared line assembly for buffered readers.
///
/// Timeouts keep the partial line in `pending`. A zero-byte read means the
/// device went away.
pub(crate) fn read_buffered_line<R: BufRead>(
    reader: &mut R,
    pending: &mut Vec<u8>,
) -> Result<Option<String>, DeviceError> {
    match reader.read_until(b'\n', pending) {
        Ok(0) => Err(DeviceError::Read(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "device closed the connection",
        ))),
        Ok(_) if pending.last() == Some(&b'\n') => {
            let bytes = std::mem::take(pending);
            let text = String::from_utf8(bytes)?;
            Ok(Some(text.trim_end_matches(['\r', '\n']).to_string()))
        }
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock => {
            Ok(None)
        }
        Err(e) => Err(DeviceError::Read(e)),
    }
}
