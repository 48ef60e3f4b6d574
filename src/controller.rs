//! Session controller.
//!
//! Wires user actions (sign in, field edits, detect, start, stop, sign out)
//! to the credential store, filename composer, device locator and recorder.
//! Front ends only read the strings and flags exposed here and feed user
//! intents back in.
//!
//! # Confirmation gates
//!
//! Two actions need explicit consent and cannot be skipped:
//!
//! - starting over an existing output file, and
//! - signing out or exiting while a session runs.
//!
//! Both take a [`Gate`]. Passing [`Gate::Unconfirmed`] returns a
//! `Confirm*` error with no side effects; the front end asks the user and
//! repeats the call with [`Gate::Confirmed`].
//!
//! # Threading
//!
//! The controller lives on the interactive thread. Reader updates arrive
//! through the recorder's channel and are applied by
//! [`SessionController::pump_events`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::auth::{CredentialStore, SessionIdentity};
use crate::config::Config;
use crate::device::{detect, DeviceConnector, DeviceError, DeviceRef, PortEnumerator};
use crate::naming::{full_path, NamingField, NamingFields};
use crate::recorder::{Recorder, RecorderError, RecorderEvent, StartOutcome};

/// Status shown before any device action.
pub const STATUS_READY: &str = "Ready - Please detect the device and start logging";

/// Longest received line echoed in the status text.
const STATUS_LINE_CHARS: usize = 50;

/// Whether the user has confirmed a gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Unconfirmed,
    Confirmed,
}

/// Source of a user-chosen directory.
pub trait DirectoryPicker {
    /// Ask for a directory starting at `initial`; `None` means cancelled.
    fn pick(&mut self, initial: &Path) -> Option<PathBuf>;
}

/// Errors and refusals reported to the front end.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Please enter both username and password")]
    MissingCredentials,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Please sign in first")]
    NotAuthenticated,

    #[error("No device detected - connect the device and detect again")]
    NoDevice,

    #[error("{0}")]
    Device(#[from] DeviceError),

    /// The target file exists; ask before truncating it.
    #[error("File {} already exists. Overwrite?", .0.display())]
    ConfirmOverwrite(PathBuf),

    /// A session is running; ask before stopping it.
    #[error("Data logging is active. Stop logging and continue?")]
    ConfirmStopRunning,

    #[error("{0}")]
    Recorder(#[from] RecorderError),
}

impl ControllerError {
    /// True for the refusals that a confirmation can lift.
    #[must_use]
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Self::ConfirmOverwrite(_) | Self::ConfirmStopRunning)
    }
}

/// Orchestrates one operator's sign-in and logging sessions.
pub struct SessionController {
    store: CredentialStore,
    identity: Option<SessionIdentity>,
    initial_fields: NamingFields,
    initial_folder: PathBuf,
    fields: NamingFields,
    output_folder: PathBuf,
    filename: String,
    full_path: PathBuf,
    keywords: Vec<String>,
    device: Option<DeviceRef>,
    connector: Box<dyn DeviceConnector>,
    recorder: Recorder,
    stop_grace: Duration,
    status: String,
    notice: Option<String>,
    lines_logged: u64,
}

impl SessionController {
    /// Build a controller from loaded credentials and configuration.
    #[must_use]
    pub fn new(
        store: CredentialStore,
        config: &Config,
        connector: Box<dyn DeviceConnector>,
    ) -> Self {
        let mut controller = Self {
            store,
            identity: None,
            initial_fields: config.naming.clone(),
            initial_folder: config.output_folder.clone(),
            fields: config.naming.clone(),
            output_folder: config.output_folder.clone(),
            filename: String::new(),
            full_path: PathBuf::new(),
            keywords: config.device.keywords.clone(),
            device: None,
            connector,
            recorder: Recorder::new(config.recorder_settings()),
            stop_grace: config.stop_grace(),
            status: STATUS_READY.to_string(),
            notice: None,
            lines_logged: 0,
        };
        controller.refresh_preview();
        controller
    }

    // ==================== Identity ====================

    /// Sign in. Inputs are trimmed; empty values are refused without touching
    /// the current identity.
    ///
    /// # Errors
    ///
    /// [`ControllerError::MissingCredentials`] or
    /// [`ControllerError::InvalidCredentials`].
    pub fn login(
        &mut self,
        username: &str,
        secret: &str,
    ) -> Result<&SessionIdentity, ControllerError> {
        let username = username.trim();
        let secret = secret.trim();
        if username.is_empty() || secret.is_empty() {
            return Err(ControllerError::MissingCredentials);
        }

        let identity = self
            .store
            .authenticate(username, secret)
            .ok_or(ControllerError::InvalidCredentials)?;
        let identity = self.identity.insert(identity);
        Ok(&*identity)
    }

    #[must_use]
    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity.as_ref().is_some_and(SessionIdentity::is_admin)
    }

    /// Sign out and reset the form.
    ///
    /// # Errors
    ///
    /// [`ControllerError::ConfirmStopRunning`] while a session runs and the
    /// gate is unconfirmed.
    pub fn logout(&mut self, gate: Gate) -> Result<(), ControllerError> {
        self.shut_down_session(gate)?;
        if let Some(identity) = self.identity.take() {
            log::info!("User '{}' signed out", identity.username());
        }
        self.reset();
        Ok(())
    }

    /// Prepare for process exit, stopping any session first.
    ///
    /// # Errors
    ///
    /// Same gate as [`SessionController::logout`].
    pub fn exit(&mut self, gate: Gate) -> Result<(), ControllerError> {
        self.shut_down_session(gate)
    }

    fn shut_down_session(&mut self, gate: Gate) -> Result<(), ControllerError> {
        if !self.recorder.is_running() {
            return Ok(());
        }
        if gate == Gate::Unconfirmed {
            return Err(ControllerError::ConfirmStopRunning);
        }
        self.stop();
        self.recorder.stop_and_wait(self.stop_grace);
        self.pump_events();
        Ok(())
    }

    /// Return form, device and status to their initial values.
    ///
    /// Identity and any running session are left alone.
    pub fn reset(&mut self) {
        self.fields = self.initial_fields.clone();
        self.output_folder = self.initial_folder.clone();
        self.device = None;
        self.status = STATUS_READY.to_string();
        self.notice = None;
        self.lines_logged = 0;
        self.refresh_preview();
    }

    // ==================== Naming ====================

    pub fn set_field(&mut self, field: NamingField, value: impl Into<String>) {
        self.fields.set(field, value);
        self.refresh_preview();
    }

    #[must_use]
    pub fn fields(&self) -> &NamingFields {
        &self.fields
    }

    pub fn set_output_folder(&mut self, folder: impl Into<PathBuf>) {
        self.output_folder = folder.into();
        self.refresh_preview();
    }

    #[must_use]
    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// Let the user pick the output folder. Returns `false` on cancel.
    pub fn browse_folder(&mut self, picker: &mut dyn DirectoryPicker) -> bool {
        match picker.pick(&self.output_folder) {
            Some(folder) => {
                self.set_output_folder(folder);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    fn refresh_preview(&mut self) {
        self.filename = self.fields.compose();
        self.full_path = full_path(&self.output_folder, &self.filename);
    }

    // ==================== Device ====================

    /// Detect the logging device.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Device`] when enumeration fails and
    /// [`ControllerError::NoDevice`] when no port exists. Both clear the
    /// current device.
    pub fn detect_device(
        &mut self,
        enumerator: &dyn PortEnumerator,
    ) -> Result<&DeviceRef, ControllerError> {
        let ports = match enumerator.list_ports() {
            Ok(ports) => ports,
            Err(e) => {
                self.device = None;
                self.status = format!("Error: {e}");
                return Err(e.into());
            }
        };

        match detect(&ports, &self.keywords) {
            Some(device) => {
                self.status = format!("Device detected on {device} - Ready to start logging");
                let device = self.device.insert(device);
                Ok(&*device)
            }
            None => {
                self.device = None;
                self.status =
                    "No device detected - Please connect the device and try again".to_string();
                Err(ControllerError::NoDevice)
            }
        }
    }

    /// Use a known port instead of detection.
    pub fn set_device(&mut self, device: DeviceRef) {
        self.status = format!("Using {device} - Ready to start logging");
        self.device = Some(device);
    }

    #[must_use]
    pub fn device(&self) -> Option<&DeviceRef> {
        self.device.as_ref()
    }

    // ==================== Session ====================

    /// Start logging to the previewed path.
    ///
    /// # Errors
    ///
    /// [`ControllerError::NotAuthenticated`], [`ControllerError::NoDevice`],
    /// [`ControllerError::ConfirmOverwrite`] when the file exists and the
    /// gate is unconfirmed, or [`ControllerError::Recorder`] when setup fails.
    pub fn start(&mut self, gate: Gate) -> Result<StartOutcome, ControllerError> {
        if self.identity.is_none() {
            return Err(ControllerError::NotAuthenticated);
        }
        if self.recorder.is_running() {
            return Ok(StartOutcome::AlreadyRunning);
        }
        let device = self.device.clone().ok_or(ControllerError::NoDevice)?;

        let path = self.full_path.clone();
        if path.exists() && gate == Gate::Unconfirmed {
            return Err(ControllerError::ConfirmOverwrite(path));
        }

        // Events of a previous session would otherwise land in this one.
        self.pump_events();

        match self.recorder.start(&device, &path, self.connector.as_ref()) {
            Ok(outcome) => {
                self.lines_logged = 0;
                self.notice = None;
                self.status = "Logging data... Press stop to end".to_string();
                Ok(outcome)
            }
            Err(e) => {
                self.status = format!("Error: {e}");
                Err(e.into())
            }
        }
    }

    /// Request a stop. No-op when idle.
    pub fn stop(&mut self) {
        if self.recorder.is_running() {
            self.recorder.stop();
            self.status = "Logging stopped".to_string();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.recorder.is_running()
    }

    #[must_use]
    pub fn start_enabled(&self) -> bool {
        self.identity.is_some() && self.device.is_some() && !self.is_running()
    }

    #[must_use]
    pub fn stop_enabled(&self) -> bool {
        self.is_running()
    }

    /// Apply pending reader events to the status and notice.
    ///
    /// Returns the number of events applied.
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.recorder.try_event() {
            self.apply_event(event);
            applied += 1;
        }
        applied
    }

    fn apply_event(&mut self, event: RecorderEvent) {
        match event {
            RecorderEvent::Line(line) => {
                self.lines_logged += 1;
                self.status = format!("Logging: {}", truncate_line(&line, STATUS_LINE_CHARS));
            }
            RecorderEvent::Stopped { lines } => {
                self.status = format!("Logging stopped ({lines} lines written)");
            }
            RecorderEvent::Failed { message, lines } => {
                self.status = format!("Logging failed after {lines} lines");
                self.notice = Some(format!("Serial connection lost: {message}"));
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Take the pending failure notice, if any.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Lines written in the current or last session.
    #[must_use]
    pub fn lines_logged(&self) -> u64 {
        self.lines_logged
    }
}

/// Shorten `line` to `max` characters, marking the cut with `...`.
fn truncate_line(line: &str, max: usize) -> String {
    match line.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.to_string(),
    }
}
