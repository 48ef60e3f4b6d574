//! endolog - Endoscopy serial data logger
//!
//! Records newline-delimited text from a serial measurement device into
//! timestamped CSV files. Operators sign in against a local credential
//! file, name each recording from six structured fields, and start or stop
//! logging from an interactive terminal UI or the `record` subcommand.

pub mod auth;
pub mod cli;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod logging;
pub mod naming;
pub mod progress;
pub mod recorder;
pub mod signal;
pub mod tui;

use std::time::Duration;

use anyhow::Context;
use yansi::Paint;

use crate::auth::CredentialStore;
use crate::cli::{Cli, Commands, FilenameArgs, NamingArgs, RecordArgs};
use crate::config::Config;
use crate::controller::{ControllerError, Gate, SessionController};
use crate::device::{detect, DeviceRef, PortEnumerator, SerialConnector, SystemPorts};
use crate::error::ExitCode;
use crate::logging::LogTarget;
use crate::progress::RecordingSpinner;
use crate::tui::App;

/// Refresh interval of the headless recording loop.
const RECORD_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the application for parsed CLI arguments.
///
/// # Errors
///
/// Returns an error when configuration, sign-in, device access or the
/// terminal fails. [`ExitCode::for_error`] maps it to an exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }

    match &cli.command {
        None | Some(Commands::Tui) => run_tui(&cli),
        Some(Commands::Record(args)) => run_record(&cli, args),
        Some(Commands::Ports) => run_ports(&cli),
        Some(Commands::Filename(args)) => run_filename(&cli, args),
    }
}

fn init_stderr_logging(cli: &Cli) -> anyhow::Result<()> {
    logging::init_logging(cli.verbose, cli.quiet, &LogTarget::Stderr)
        .context("failed to initialize logging")
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.merge_cli(cli);
    Ok(config)
}

/// Load credentials; problems are reported and an empty store is used.
fn load_credentials(config: &Config) -> anyhow::Result<(CredentialStore, Option<String>)> {
    let path = config.users_path()?;
    log::debug!("Using credential file {}", path.display());
    Ok(CredentialStore::load_or_empty(&path))
}

fn run_tui(cli: &Cli) -> anyhow::Result<ExitCode> {
    let log_file = Config::log_file_path()?;
    logging::init_logging(cli.verbose, cli.quiet, &LogTarget::File(log_file.clone()))
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;
    log::info!("endolog {} starting TUI", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli)?;
    let (store, warning) = load_credentials(&config)?;
    let controller = SessionController::new(store, &config, Box::new(SerialConnector));
    let mut app = App::new(controller, Box::new(SystemPorts), warning);

    let shutdown = match signal::install_ctrlc() {
        Ok(token) => Some(token),
        Err(e) => {
            log::warn!("Running without a termination handler: {}", e);
            None
        }
    };

    tui::run_tui(&mut app, shutdown)?;
    Ok(ExitCode::Success)
}

fn run_record(cli: &Cli, args: &RecordArgs) -> anyhow::Result<ExitCode> {
    init_stderr_logging(cli)?;

    let config = load_config(cli)?;
    let (store, warning) = load_credentials(&config)?;
    if let Some(warning) = warning {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }

    let mut controller = SessionController::new(store, &config, Box::new(SerialConnector));
    let identity = controller.login(&args.user, &args.password)?;
    log::info!("Signed in as {}", identity);

    apply_naming(&mut controller, &args.naming);

    match &args.port {
        Some(port) => controller.set_device(DeviceRef::new(port.clone())),
        None => {
            controller.detect_device(&SystemPorts)?;
        }
    }

    let stop = signal::install_ctrlc()?;
    let gate = if args.yes {
        Gate::Confirmed
    } else {
        Gate::Unconfirmed
    };
    controller.start(gate).map_err(|e| match e {
        ControllerError::ConfirmOverwrite(_) => {
            anyhow::Error::new(e).context("refusing to overwrite without --yes")
        }
        other => other.into(),
    })?;

    if !cli.quiet {
        eprintln!(
            "{} {}",
            "Recording to".green().bold(),
            controller.full_path().display()
        );
    }

    let spinner = RecordingSpinner::new(cli.quiet);
    let interrupted = loop {
        controller.pump_events();
        spinner.update(controller.lines_logged(), controller.status());

        if stop.is_stop_requested() {
            controller.exit(Gate::Confirmed)?;
            break true;
        }
        if !controller.is_running() {
            controller.pump_events();
            break false;
        }
        std::thread::sleep(RECORD_POLL_INTERVAL);
    };

    spinner.finish(controller.status());
    if let Some(notice) = controller.take_notice() {
        anyhow::bail!(notice);
    }
    if interrupted {
        log::info!("Recording interrupted after {} lines", controller.lines_logged());
        return Ok(ExitCode::Interrupted);
    }
    Ok(ExitCode::Success)
}

fn apply_naming(controller: &mut SessionController, naming: &NamingArgs) {
    let mut fields = controller.fields().clone();
    naming.apply_to(&mut fields);
    for field in naming::NamingField::ALL {
        controller.set_field(field, fields.get(field).to_string());
    }
    if let Some(folder) = &naming.folder {
        controller.set_output_folder(folder.clone());
    }
}

fn run_ports(cli: &Cli) -> anyhow::Result<ExitCode> {
    init_stderr_logging(cli)?;
    let config = load_config(cli)?;

    let ports = SystemPorts.list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(ExitCode::NoDevice);
    }

    for port in &ports {
        println!("{} {}", format!("{:<16}", port.name).bold(), port.description);
    }
    match detect(&ports, &config.device.keywords) {
        Some(device) => println!("\n{} {}", "Selected:".green().bold(), device),
        None => println!("\n{}", "No device selected".red()),
    }
    Ok(ExitCode::Success)
}

fn run_filename(cli: &Cli, args: &FilenameArgs) -> anyhow::Result<ExitCode> {
    init_stderr_logging(cli)?;
    // Not merged with CLI paths so a saved file only gains naming defaults.
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    args.naming.apply_to(&mut config.naming);
    if let Some(folder) = &args.naming.folder {
        config.output_folder = folder.clone();
    }
    let filename = config.naming.compose();

    println!("{}", filename);
    println!("{}", naming::full_path(&config.output_folder, &filename).display());

    if args.save {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => Config::default_config_path()?,
        };
        config
            .save(&path)
            .with_context(|| format!("failed to save configuration to {}", path.display()))?;
        log::info!("Saved naming defaults to {}", path.display());
    }
    Ok(ExitCode::Success)
}
