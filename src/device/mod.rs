//! Serial device discovery and line-oriented reads.
//!
//! # Overview
//!
//! * [`locator`]: enumerate ports and pick the most likely logging device.
//! * [`link`]: open a port and read newline-terminated text with a bounded
//!   timeout.
//!
//! Both halves sit behind traits ([`PortEnumerator`], [`DeviceConnector`],
//! [`LineSource`]) so the session logic can run against scripted devices.

pub mod link;
pub mod locator;

use std::fmt;
use std::io;

use thiserror::Error;

pub use link::{DeviceConnector, LineSource, LinkSettings, SerialConnector, SerialLink};
pub use locator::{detect, PortEnumerator, PortInfo, SystemPorts, DEFAULT_KEYWORDS};

/// Identifier of the port believed to be the logging device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceRef {
    port: String,
}

impl DeviceRef {
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self { port: port.into() }
    }

    /// OS port name, e.g. `COM5` or `/dev/ttyACM0`.
    #[must_use]
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.port)
    }
}

/// Errors from port enumeration, connection and reads.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The OS port list could not be queried.
    #[error("failed to list serial ports: {0}")]
    Enumerate(String),

    /// No ports are present at all.
    #[error("no serial device found")]
    NotFound,

    /// Opening the port failed.
    #[error("failed to open {port}: {message}")]
    Open { port: String, message: String },

    /// A read failed, typically because the device was unplugged.
    #[error("read from device failed: {0}")]
    Read(#[from] io::Error),

    /// The device sent bytes that are not valid UTF-8.
    #[error("device sent invalid text: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}
