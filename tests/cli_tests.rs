//! `run_app` exit codes for the headless subcommands.

use clap::Parser;
use endolog::cli::Cli;
use endolog::config::Config;
use endolog::error::{ExitCode, StructuredError};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn cli(dir: &Path, args: &[&str]) -> Cli {
    let config = dir.join("config.toml");
    let users = dir.join("users.json");
    let mut argv = vec![
        "endolog".to_string(),
        "-q".to_string(),
        "--no-color".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--users-file".to_string(),
        users.display().to_string(),
    ];
    argv.extend(args.iter().map(|a| a.to_string()));
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_filename_subcommand_succeeds() {
    let dir = tempdir().unwrap();
    let code = endolog::run_app(cli(dir.path(), &["filename", "--trial", "T3"])).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_filename_save_persists_naming_defaults() {
    let dir = tempdir().unwrap();
    let args = ["filename", "--subject", "S5", "--folder", "runs", "--save"];
    let code = endolog::run_app(cli(dir.path(), &args)).unwrap();
    assert_eq!(code, ExitCode::Success);

    let saved = Config::load_from_path(&dir.path().join("config.toml")).unwrap();
    assert_eq!(saved.naming.compose(), "CRB1Y1E01S5T1.csv");
    assert_eq!(saved.output_folder.as_path(), Path::new("runs"));
    assert_eq!(saved.users_file, None);

    // Later runs start from the saved values.
    let code = endolog::run_app(cli(dir.path(), &["filename", "--trial", "T2"])).unwrap();
    assert_eq!(code, ExitCode::Success);
    let unchanged = Config::load_from_path(&dir.path().join("config.toml")).unwrap();
    assert_eq!(unchanged, saved);
}

#[test]
fn test_record_wrong_password_is_auth_failure() {
    let dir = tempdir().unwrap();
    let err = endolog::run_app(cli(
        dir.path(),
        &["record", "--user", "admin", "--password", "wrong", "--port", "COM99"],
    ))
    .unwrap_err();

    let code = ExitCode::for_error(&err);
    assert_eq!(code, ExitCode::AuthFailed);
    assert_eq!(code.code_prefix(), "EL002");

    // The credential file was seeded on first use.
    assert!(dir.path().join("users.json").is_file());
}

#[test]
fn test_record_corrupted_credentials_locks_everyone_out() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("users.json"), "[]").unwrap();

    let err = endolog::run_app(cli(
        dir.path(),
        &["record", "--user", "admin", "--password", "admin123", "--port", "COM99"],
    ))
    .unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::AuthFailed);
}

#[test]
fn test_record_unopenable_port_is_device_failure() {
    let dir = tempdir().unwrap();
    let folder = dir.path().join("out");
    let port = dir.path().join("no-such-tty");
    let err = endolog::run_app(cli(
        dir.path(),
        &[
            "record",
            "--user",
            "user",
            "--password",
            "user123",
            "--port",
            port.to_str().unwrap(),
            "--folder",
            folder.to_str().unwrap(),
        ],
    ))
    .unwrap_err();

    let code = ExitCode::for_error(&err);
    assert_eq!(code, ExitCode::NoDevice);

    let structured = StructuredError::new(&err, code);
    assert_eq!(structured.exit_code, 3);
    assert!(structured.message.contains("no-such-tty"));
    assert!(!folder.join("CRB1Y1E01S1T1.csv").exists());
}

#[test]
fn test_record_refuses_overwrite_without_yes() {
    let dir = tempdir().unwrap();
    let folder = dir.path().join("out");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("CRB1Y1E01S1T1.csv"), "keep me").unwrap();

    let err = endolog::run_app(cli(
        dir.path(),
        &[
            "record",
            "--user",
            "user",
            "--password",
            "user123",
            "--port",
            "COM99",
            "--folder",
            folder.to_str().unwrap(),
        ],
    ))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("--yes"));
    assert_eq!(
        fs::read_to_string(folder.join("CRB1Y1E01S1T1.csv")).unwrap(),
        "keep me"
    );
}
