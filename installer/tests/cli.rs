//! CLI tests for the `installer` binary.
//!
//! Only paths that finish before the privilege check are exercised here, so
//! the tests behave the same whether or not they run as an administrator.

use std::process::Command;

use installer::exit_codes;

#[test]
fn help_exits_ok() {
    let status = Command::new(env!("CARGO_BIN_EXE_installer"))
        .arg("--help")
        .status()
        .expect("installer --help");
    assert_eq!(status.code(), Some(exit_codes::OK));
}

#[test]
fn help_lists_a_skip_switch_per_step() {
    let output = Command::new(env!("CARGO_BIN_EXE_installer"))
        .arg("--help")
        .output()
        .expect("installer --help");
    let help = String::from_utf8_lossy(&output.stdout);
    for slug in installer::steps::slugs() {
        assert!(
            help.contains(&format!("--skip-{slug}-step")),
            "help should mention skip switch for {slug}"
        );
    }
    assert!(help.contains("--developer-mode"));
    assert!(help.contains("--keep-edge"));
}

#[test]
fn unknown_skip_switch_exits_with_config_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = Command::new(env!("CARGO_BIN_EXE_installer"))
        .current_dir(temp.path())
        .arg("--skip-format-disk-step")
        .output()
        .expect("installer");
    assert_eq!(output.status.code(), Some(exit_codes::CONFIG));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--skip-format-disk-step"));
    assert!(!temp.path().join("logs").exists(), "no step may run");
}
