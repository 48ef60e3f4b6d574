//! Cooperative cancellation for the logging session.
//!
//! A [`StopToken`] wraps a shared `AtomicBool`. The interactive thread sets
//! it, the reader thread polls it between reads. Because each read is bounded
//! by the device read timeout, a stop is observed within one timeout interval,
//! never instantly.
//!
//! Headless recordings additionally route Ctrl+C into a token through
//! [`install_ctrlc`].
//!
//! # Example
//!
//! ```
//! use endolog::signal::StopToken;
//!
//! let token = StopToken::new();
//! let reader_side = token.clone();
//!
//! token.request_stop();
//! assert!(reader_side.is_stop_requested());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared stop flag polled by the reader thread.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// Create a token with no stop requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Ask the reader to stop. Idempotent.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Token tripped by Ctrl+C. `ctrlc` allows one handler per process, so
/// the lock is held across the check and the install.
static CTRLC_TOKEN: Mutex<Option<StopToken>> = Mutex::new(None);

/// Install a Ctrl+C handler and return the token it trips.
///
/// Repeated calls, including concurrent ones, return the token registered
/// by the first call.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if another handler already owns
/// the signal.
pub fn install_ctrlc() -> Result<StopToken, SignalError> {
    let mut installed = CTRLC_TOKEN.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(token) = installed.as_ref() {
        return Ok(token.clone());
    }

    let token = StopToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        handler_token.request_stop();
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping recording...");
        let _ = std::io::stderr().flush();
        log::info!("Stop signal received");
    })?;

    *installed = Some(token.clone());
    Ok(token)
}
