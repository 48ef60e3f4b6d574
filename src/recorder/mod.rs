//! Logging session: device lines to a timestamped CSV file.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start--> Running --stop | read error--> Idle
//! ```
//!
//! [`Recorder::start`] does the blocking setup on the caller's thread (create
//! the output folder, open the device, wait the settle delay, truncate the
//! file and write the header) and then hands the device and the file to a
//! reader thread. That thread is the only owner of both until it exits.
//!
//! The interactive thread keeps a [`StopToken`] and a channel of
//! [`RecorderEvent`]s which it drains with [`Recorder::try_event`]. Stop
//! latency is bounded by the device read timeout.
//!
//! # Example
//!
//! ```no_run
//! use endolog::device::{DeviceRef, SerialConnector};
//! use endolog::recorder::{Recorder, RecorderSettings};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let mut recorder = Recorder::new(RecorderSettings::default());
//! recorder
//!     .start(&DeviceRef::new("/dev/ttyACM0"), Path::new("Endo_Data/run.csv"), &SerialConnector)
//!     .unwrap();
//! // ...
//! recorder.stop_and_wait(Duration::from_secs(1));
//! ```

pub mod sink;

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use thiserror::Error;

use crate::device::{DeviceConnector, DeviceError, DeviceRef, LineSource, LinkSettings};
use crate::signal::StopToken;
pub use sink::{CsvSink, SinkError, CSV_HEADER, TIMESTAMP_FORMAT};

/// Interval at which [`Recorder::stop_and_wait`] checks the reader thread.
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors raised while starting a session.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The output folder could not be created.
    #[error("failed to create folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The device could not be opened.
    #[error("serial connection failed: {0}")]
    Device(#[from] DeviceError),

    /// The output file could not be created.
    #[error("failed to create {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The header row could not be written.
    #[error("failed to write header: {0}")]
    Sink(#[from] SinkError),

    /// The reader thread could not be spawned.
    #[error("failed to spawn reader thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Session state as seen by the interactive thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session is running.
    Started,
    /// A session was already running; nothing changed.
    AlreadyRunning,
}

/// Update sent from the reader thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// A non-empty line was written.
    Line(String),
    /// The reader observed the stop token and closed the file.
    Stopped { lines: u64 },
    /// A read or write failed; the session ended.
    Failed { message: String, lines: u64 },
}

/// Fixed timings of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderSettings {
    /// Baud rate and read timeout.
    pub link: LinkSettings,
    /// Pause after connecting so boards that reset on connect can boot.
    pub settle_delay: Duration,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            link: LinkSettings::default(),
            settle_delay: Duration::from_secs(2),
        }
    }
}

struct ActiveSession {
    token: StopToken,
    handle: JoinHandle<()>,
    output: PathBuf,
}

/// Owner of at most one running logging session.
pub struct Recorder {
    settings: RecorderSettings,
    events_tx: Sender<RecorderEvent>,
    events_rx: Receiver<RecorderEvent>,
    active: Option<ActiveSession>,
}

impl Recorder {
    #[must_use]
    pub fn new(settings: RecorderSettings) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            settings,
            events_tx,
            events_rx,
            active: None,
        }
    }

    /// Running while a reader thread exists and has not exited.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match &self.active {
            Some(active) if !active.handle.is_finished() => SessionState::Running,
            _ => SessionState::Idle,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Start logging `device` into `output`.
    ///
    /// Overwrite confirmation is the caller's job; an existing file is
    /// truncated. Calling this while running changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError`] if the folder, device, file or thread cannot
    /// be set up. The recorder stays idle in that case.
    pub fn start(
        &mut self,
        device: &DeviceRef,
        output: &Path,
        connector: &dyn DeviceConnector,
    ) -> Result<StartOutcome, RecorderError> {
        if self.is_running() {
            log::debug!("Start ignored, session already running");
            return Ok(StartOutcome::AlreadyRunning);
        }
        self.reap();

        if let Some(folder) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(folder).map_err(|source| RecorderError::CreateDir {
                path: folder.to_path_buf(),
                source,
            })?;
        }

        let source = connector.connect(device, &self.settings.link)?;
        if !self.settings.settle_delay.is_zero() {
            log::debug!("Waiting {:?} for device to settle", self.settings.settle_delay);
            thread::sleep(self.settings.settle_delay);
        }

        let file = File::create(output).map_err(|source| RecorderError::CreateFile {
            path: output.to_path_buf(),
            source,
        })?;
        let sink = CsvSink::create(file)?;

        let token = StopToken::new();
        let reader_token = token.clone();
        let events = self.events_tx.clone();
        let handle = thread::Builder::new()
            .name("endolog-reader".to_string())
            .spawn(move || read_loop(source, sink, &reader_token, &events))
            .map_err(RecorderError::Spawn)?;

        log::info!("Logging {} to {}", device, output.display());
        self.active = Some(ActiveSession {
            token,
            handle,
            output: output.to_path_buf(),
        });
        Ok(StartOutcome::Started)
    }

    /// Ask the reader to stop. No-op when idle.
    ///
    /// Returns immediately; the reader notices within one read timeout and
    /// closes the device and the file itself.
    pub fn stop(&self) {
        if let Some(active) = &self.active {
            if !active.token.is_stop_requested() {
                log::info!("Stop requested for {}", active.output.display());
            }
            active.token.request_stop();
        }
    }

    /// Stop and wait up to `grace` for the reader to exit.
    ///
    /// Returns `true` if no reader thread is left running.
    pub fn stop_and_wait(&mut self, grace: Duration) -> bool {
        self.stop();
        let deadline = Instant::now() + grace;
        while self.is_running() {
            if Instant::now() >= deadline {
                log::warn!("Reader still running after {:?}", grace);
                return false;
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }
        self.reap();
        true
    }

    /// Next pending event, if any.
    #[must_use]
    pub fn try_event(&self) -> Option<RecorderEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    #[must_use]
    pub fn wait_event(&self, timeout: Duration) -> Option<RecorderEvent> {
        self.events_rx.recv_timeout(timeout).ok()
    }

    /// Join a reader thread that has already exited.
    fn reap(&mut self) {
        let finished = self
            .active
            .as_ref()
            .is_some_and(|a| a.handle.is_finished());
        if finished {
            if let Some(active) = self.active.take() {
                if active.handle.join().is_err() {
                    log::error!("Reader thread panicked");
                }
            }
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reader thread body.
fn read_loop(
    mut source: Box<dyn LineSource>,
    mut sink: CsvSink<File>,
    token: &StopToken,
    events: &Sender<RecorderEvent>,
) {
    let mut lines = 0u64;
    let outcome = loop {
        if token.is_stop_requested() {
            break Ok(());
        }
        match source.read_line() {
            Ok(Some(raw)) => {
                let line = raw.trim();
                if line.is_empty() {
                    continue;
                }
                if let Err(e) = sink.write_line(&Local::now(), line) {
                    break Err(e.to_string());
                }
                lines += 1;
                log::trace!("Logged line {}: {}", lines, line);
                let _ = events.send(RecorderEvent::Line(line.to_string()));
            }
            Ok(None) => {}
            Err(e) => break Err(e.to_string()),
        }
    };

    drop(source);
    let closed = sink.finish().map(drop).map_err(|e| e.to_string());

    let event = match outcome.and(closed) {
        Ok(()) => {
            log::info!("Logging stopped after {} lines", lines);
            RecorderEvent::Stopped { lines }
        }
        Err(message) => {
            log::error!("Logging aborted after {} lines: {}", lines, message);
            RecorderEvent::Failed { message, lines }
        }
    };
    let _ = events.send(event);
}
