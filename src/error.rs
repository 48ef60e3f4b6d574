//! Structured error handling and exit codes.

use serde::Serialize;

use crate::controller::ControllerError;

/// Exit codes for the endolog binary.
///
/// - 0: Success
/// - 1: General error (configuration, I/O, unexpected failure)
/// - 2: Sign-in refused
/// - 3: No usable device
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed normally.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Missing or wrong credentials.
    AuthFailed = 2,
    /// No device found, or the device could not be opened or read.
    NoDevice = 3,
    /// Recording was interrupted by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "EL000",
            Self::GeneralError => "EL001",
            Self::AuthFailed => "EL002",
            Self::NoDevice => "EL003",
            Self::Interrupted => "EL130",
        }
    }

    /// Classify an application error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ControllerError>() {
            Some(ControllerError::MissingCredentials | ControllerError::InvalidCredentials) => {
                Self::AuthFailed
            }
            Some(ControllerError::NoDevice | ControllerError::Device(_)) => Self::NoDevice,
            Some(ControllerError::Recorder(crate::recorder::RecorderError::Device(_))) => {
                Self::NoDevice
            }
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "EL001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceError;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::AuthFailed.as_i32(), 2);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_for_error_classifies_controller_errors() {
        let auth = anyhow::Error::new(ControllerError::InvalidCredentials);
        assert_eq!(ExitCode::for_error(&auth), ExitCode::AuthFailed);

        let device = anyhow::Error::new(ControllerError::Device(DeviceError::NotFound));
        assert_eq!(ExitCode::for_error(&device), ExitCode::NoDevice);

        let other = anyhow::anyhow!("disk full");
        assert_eq!(ExitCode::for_error(&other), ExitCode::GeneralError);
    }

    #[test]
    fn test_structured_error_json() {
        let err = anyhow::Error::new(ControllerError::NoDevice);
        let structured = StructuredError::new(&err, ExitCode::NoDevice);
        let json = serde_json::to_string(&structured).unwrap();
        assert!(json.contains("\"code\":\"EL003\""));
        assert!(json.contains("\"exit_code\":3"));
        assert!(json.contains("\"interrupted\":false"));
    }
}
