//! End-to-end logging sessions through the controller with a fake device.

mod common;

use std::fs;

use common::{controller, pump_until, FakeDevice, Step};
use endolog::controller::{ControllerError, Gate, STATUS_READY};
use endolog::device::{DeviceRef, PortInfo};
use endolog::naming::NamingField;
use endolog::recorder::StartOutcome;
use tempfile::tempdir;

fn rows(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .skip(1)
        .map(|row| {
            let (stamp, data) = row.split_once(',').unwrap();
            (stamp.to_string(), data.to_string())
        })
        .collect()
}

#[test]
fn test_default_admin_records_lines() {
    let dir = tempdir().unwrap();
    let device = FakeDevice::new();
    let mut c = controller(dir.path(), &device);

    let identity = c.login("admin", "admin123").unwrap();
    assert!(identity.is_admin());

    let ports = vec![
        PortInfo::new("COM3", "Generic"),
        PortInfo::new("COM5", "Arduino Uno"),
    ];
    assert_eq!(c.detect_device(&ports).unwrap().port(), "COM5");

    device.push_lines(&["512", "", "  ", "518\r"]);
    assert_eq!(c.start(Gate::Unconfirmed).unwrap(), StartOutcome::Started);
    assert!(c.is_running());
    assert!(!c.start_enabled());
    assert!(c.stop_enabled());

    assert!(pump_until(&mut c, |c| c.lines_logged() == 2));
    assert_eq!(c.status(), "Logging: 518");

    c.stop();
    assert!(pump_until(&mut c, |c| !c.is_running()
        && c.status().contains("2 lines written")));

    let content = fs::read_to_string(dir.path().join("CRB1Y1E01S1T1.csv")).unwrap();
    assert!(content.starts_with("timestamp,data\n"));
    let rows = rows(&content);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].1, "512");
    assert_eq!(rows[1].1, "518");
    // YYYY-MM-DD HH:MM:SS.mmm
    assert_eq!(rows[0].0.len(), 23);
    assert_eq!(&rows[0].0[10..11], " ");
    assert_eq!(&rows[0].0[19..20], ".");
}

#[test]
fn test_second_start_is_ignored() {
    let dir = tempdir().unwrap();
    let device = FakeDevice::new();
    let mut c = controller(dir.path(), &device);
    c.login("user", "user123").unwrap();
    c.set_device(DeviceRef::new("COM7"));

    assert_eq!(c.start(Gate::Unconfirmed).unwrap(), StartOutcome::Started);
    assert_eq!(c.start(Gate::Confirmed).unwrap(), StartOutcome::AlreadyRunning);
    assert_eq!(device.connects(), 1);

    c.stop();
    assert!(pump_until(&mut c, |c| !c.is_running()));
    let content = fs::read_to_string(c.full_path()).unwrap();
    assert_eq!(content.matches("timestamp,data").count(), 1);
}

#[test]
fn test_existing_file_needs_confirmation() {
    let dir = tempdir().unwrap();
    let device = FakeDevice::new();
    let mut c = controller(dir.path(), &device);
    c.login("user", "user123").unwrap();
    c.set_device(DeviceRef::new("COM7"));
    c.set_field(NamingField::Trial, "T9");

    let target = dir.path().join("CRB1Y1E01S1T9.csv");
    fs::write(&target, "previous run").unwrap();

    let err = c.start(Gate::Unconfirmed).unwrap_err();
    assert!(matches!(err, ControllerError::ConfirmOverwrite(ref p) if *p == target));
    assert!(!c.is_running());
    assert_eq!(device.connects(), 0);
    assert_eq!(fs::read_to_string(&target).unwrap(), "previous run");

    c.start(Gate::Confirmed).unwrap();
    c.stop();
    assert!(pump_until(&mut c, |c| !c.is_running()));
    assert_eq!(fs::read_to_string(&target).unwrap(), "timestamp,data\n");
}

#[test]
fn test_logout_while_running_needs_confirmation() {
    let dir = tempdir().unwrap();
    let device = FakeDevice::new();
    let mut c = controller(dir.path(), &device);
    c.login("admin", "admin123").unwrap();
    c.set_device(DeviceRef::new("COM5"));
    c.set_field(NamingField::Subject, "S4");
    c.start(Gate::Unconfirmed).unwrap();

    assert!(matches!(
        c.logout(Gate::Unconfirmed),
        Err(ControllerError::ConfirmStopRunning)
    ));
    assert!(c.is_running());
    assert!(c.is_authenticated());

    c.logout(Gate::Confirmed).unwrap();
    assert!(!c.is_running());
    assert!(!c.is_authenticated());
    assert!(c.device().is_none());
    assert_eq!(c.fields().get(NamingField::Subject), "S1");
    assert_eq!(c.status(), STATUS_READY);
    assert!(!c.start_enabled());
    assert!(!c.stop_enabled());
}

#[test]
fn test_exit_while_running_needs_confirmation() {
    let dir = tempdir().unwrap();
    let device = FakeDevice::new();
    let mut c = controller(dir.path(), &device);
    c.login("admin", "admin123").unwrap();
    c.set_device(DeviceRef::new("COM5"));
    c.start(Gate::Unconfirmed).unwrap();

    assert!(c.exit(Gate::Unconfirmed).unwrap_err().needs_confirmation());
    c.exit(Gate::Confirmed).unwrap();
    assert!(!c.is_running());
}

#[test]
fn test_connection_loss_is_reported() {
    let dir = tempdir().unwrap();
    let device = FakeDevice::new();
    let mut c = controller(dir.path(), &device);
    c.login("user", "user123").unwrap();
    c.set_device(DeviceRef::new("COM5"));

    device.push(Step::Line("700"));
    device.push(Step::Fail("device unplugged"));
    c.start(Gate::Unconfirmed).unwrap();

    assert!(pump_until(&mut c, |c| !c.is_running() && c.status().starts_with("Logging failed")));
    let notice = c.take_notice().unwrap();
    assert!(notice.starts_with("Serial connection lost"));
    assert!(notice.contains("device unplugged"));
    assert!(c.take_notice().is_none());

    let content = fs::read_to_string(c.full_path()).unwrap();
    assert_eq!(rows(&content).len(), 1);
    assert!(c.start_enabled());
}

#[test]
fn test_long_lines_truncated_in_status() {
    let dir = tempdir().unwrap();
    let device = FakeDevice::new();
    let mut c = controller(dir.path(), &device);
    c.login("user", "user123").unwrap();
    c.set_device(DeviceRef::new("COM5"));

    device.push(Step::Line(
        "0123456789012345678901234567890123456789012345678901234567890123456789",
    ));
    c.start(Gate::Unconfirmed).unwrap();
    assert!(pump_until(&mut c, |c| c.lines_logged() == 1));
    assert_eq!(
        c.status(),
        "Logging: 01234567890123456789012345678901234567890123456789..."
    );
    c.stop();
}

#[test]
fn test_output_folder_created_on_start() {
    let dir = tempdir().unwrap();
    let device = FakeDevice::new();
    let mut c = controller(dir.path(), &device);
    c.login("user", "user123").unwrap();
    c.set_device(DeviceRef::new("COM5"));
    c.set_output_folder(dir.path().join("nested").join("runs"));

    c.start(Gate::Unconfirmed).unwrap();
    c.stop();
    assert!(pump_until(&mut c, |c| !c.is_running()));
    assert!(dir.path().join("nested/runs/CRB1Y1E01S1T1.csv").is_file());
}
