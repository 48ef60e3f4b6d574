//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use endolog::auth::CredentialStore;
use endolog::config::Config;
use endolog::controller::SessionController;
use endolog::device::{DeviceConnector, DeviceError, DeviceRef, LineSource, LinkSettings};

/// One scripted read result.
pub enum Step {
    Line(&'static str),
    Fail(&'static str),
}

/// Device double fed from a shared script; idles once the script runs dry.
#[derive(Clone, Default)]
pub struct FakeDevice {
    script: Arc<Mutex<VecDeque<Step>>>,
    connects: Arc<Mutex<u32>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn push_lines(&self, lines: &[&'static str]) {
        for line in lines {
            self.push(Step::Line(line));
        }
    }

    pub fn connects(&self) -> u32 {
        *self.connects.lock().unwrap()
    }
}

struct FakeSource {
    script: Arc<Mutex<VecDeque<Step>>>,
    timeout: Duration,
}

impl LineSource for FakeSource {
    fn read_line(&mut self) -> Result<Option<String>, DeviceError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Step::Line(line)) => Ok(Some(line.to_string())),
            Some(Step::Fail(message)) => Err(DeviceError::Read(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                message,
            ))),
            None => {
                thread::sleep(self.timeout);
                Ok(None)
            }
        }
    }
}

impl DeviceConnector for FakeDevice {
    fn connect(
        &self,
        _device: &DeviceRef,
        settings: &LinkSettings,
    ) -> Result<Box<dyn LineSource>, DeviceError> {
        *self.connects.lock().unwrap() += 1;
        Ok(Box::new(FakeSource {
            script: Arc::clone(&self.script),
            timeout: settings.read_timeout,
        }))
    }
}

/// Configuration with short timings writing into `folder`.
pub fn fast_config(folder: &Path) -> Config {
    let mut config = Config {
        output_folder: folder.to_path_buf(),
        stop_grace_ms: 2000,
        ..Config::default()
    };
    config.device.read_timeout_ms = 20;
    config.device.settle_delay_ms = 0;
    config
}

pub fn controller(folder: &Path, device: &FakeDevice) -> SessionController {
    SessionController::new(
        CredentialStore::seeded(),
        &fast_config(folder),
        Box::new(device.clone()),
    )
}

/// Poll `controller` until `done` holds or two seconds pass.
pub fn pump_until(
    controller: &mut SessionController,
    mut done: impl FnMut(&SessionController) -> bool,
) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        controller.pump_events();
        if done(controller) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}
