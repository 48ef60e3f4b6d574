//! Command-line interface definitions for endolog.
//!
//! Global options (verbosity, colour, config and credential paths) come
//! first, followed by an optional subcommand. Without a subcommand the
//! interactive TUI starts.
//!
//! # Example
//!
//! ```bash
//! # Interactive terminal UI
//! endolog
//!
//! # Headless recording, stop with Ctrl+C
//! ENDOLOG_PASSWORD=user123 endolog record --user user --subject S4 --trial T2
//!
//! # Show serial ports and the detected device
//! endolog ports
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::naming::{NamingField, NamingFields};

/// Serial data logger with local sign-in and structured CSV naming.
#[derive(Debug, Parser)]
#[command(name = "endolog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "PATH", env = "ENDOLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the credential file (JSON)
    #[arg(long, global = true, value_name = "PATH")]
    pub users_file: Option<PathBuf>,

    /// Subcommand to execute (defaults to the TUI)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the interactive terminal UI
    Tui,
    /// Sign in and record from the device until Ctrl+C
    Record(RecordArgs),
    /// List serial ports and the device that would be selected
    Ports,
    /// Print the filename and path the naming fields produce
    Filename(FilenameArgs),
}

/// Naming field overrides shared by `record` and `filename`.
#[derive(Debug, Clone, Default, Args)]
pub struct NamingArgs {
    /// Experiment type (e.g. CR)
    #[arg(long, value_name = "TEXT")]
    pub experiment_type: Option<String>,

    /// Model type (e.g. B1)
    #[arg(long, value_name = "TEXT")]
    pub model_type: Option<String>,

    /// Year (e.g. Y1)
    #[arg(long, value_name = "TEXT")]
    pub year: Option<String>,

    /// Experience (e.g. E01)
    #[arg(long, value_name = "TEXT")]
    pub experience: Option<String>,

    /// Subject (e.g. S1)
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Trial (e.g. T1)
    #[arg(long, value_name = "TEXT")]
    pub trial: Option<String>,

    /// Output folder
    #[arg(short, long, value_name = "DIR")]
    pub folder: Option<PathBuf>,
}

impl NamingArgs {
    /// Overlay the given values onto `fields`.
    pub fn apply_to(&self, fields: &mut NamingFields) {
        let overrides = [
            (NamingField::ExperimentType, &self.experiment_type),
            (NamingField::ModelType, &self.model_type),
            (NamingField::Year, &self.year),
            (NamingField::Experience, &self.experience),
            (NamingField::Subject, &self.subject),
            (NamingField::Trial, &self.trial),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                fields.set(field, value.clone());
            }
        }
    }
}

/// Arguments for the filename subcommand.
#[derive(Debug, Args)]
pub struct FilenameArgs {
    /// Store the resulting fields and folder as defaults in the config file
    #[arg(long)]
    pub save: bool,

    #[command(flatten)]
    pub naming: NamingArgs,
}

/// Arguments for the record subcommand.
#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Username to sign in as
    #[arg(short, long, value_name = "NAME")]
    pub user: String,

    /// Password (prefer the environment variable over the flag)
    #[arg(long, value_name = "SECRET", env = "ENDOLOG_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Use this port instead of auto-detection
    #[arg(long, value_name = "PORT")]
    pub port: Option<String>,

    /// Overwrite the output file if it already exists
    #[arg(short = 'y', long)]
    pub yes: bool,

    #[command(flatten)]
    pub naming: NamingArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["endolog"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_verbose_count() {
        let cli = Cli::try_parse_from(["endolog", "-vv", "ports"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Ports)));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["endolog", "-q", "-v", "ports"]).is_err());
    }

    #[test]
    fn test_record_args() {
        let cli = Cli::try_parse_from([
            "endolog",
            "record",
            "--user",
            "admin",
            "--password",
            "admin123",
            "--subject",
            "S9",
            "--folder",
            "/tmp/data",
            "-y",
        ])
        .unwrap();
        let Some(Commands::Record(args)) = cli.command else {
            panic!("expected record subcommand");
        };
        assert_eq!(args.user, "admin");
        assert!(args.yes);
        assert_eq!(args.naming.subject.as_deref(), Some("S9"));
        assert_eq!(args.naming.folder, Some(PathBuf::from("/tmp/data")));
    }

    #[test]
    fn test_filename_save_flag() {
        let cli = Cli::try_parse_from(["endolog", "filename", "--trial", "T7", "--save"]).unwrap();
        let Some(Commands::Filename(args)) = cli.command else {
            panic!("expected filename subcommand");
        };
        assert!(args.save);
        assert_eq!(args.naming.trial.as_deref(), Some("T7"));
    }

    #[test]
    fn test_naming_args_apply() {
        let args = NamingArgs {
            year: Some("Y3".to_string()),
            trial: Some("T7".to_string()),
            ..NamingArgs::default()
        };
        let mut fields = NamingFields::default();
        args.apply_to(&mut fields);
        assert_eq!(fields.compose(), "CRB1Y3E01S1T7.csv");
    }
}
