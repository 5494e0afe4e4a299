//! `cadenced --check` validates the config without running frames

use crate::prelude::*;

const VALID: &str = r#"
[[timers]]
name = "heartbeat"
interval = 1.0
auto_start = true

[[timers]]
name = "blink"
interval = 0.25

[[groups]]
name = "leds"
timers = ["blink"]
"#;

#[test]
fn check_reports_declared_timers_and_groups() {
    let project = Project::empty();
    let config = project.config(VALID);

    let output = cadenced()
        .arg("--check")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "config ok: 2 timers, 1 groups");
}

#[test]
fn check_uses_config_from_env() {
    let project = Project::empty();
    let config = project.config(VALID);

    let output = cadenced()
        .arg("--check")
        .env("CADENCE_CONFIG", &config)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("2 timers"));
}

#[test]
fn check_rejects_invalid_interval() {
    let project = Project::empty();
    let config = project.config("[[timers]]\nname = \"bad\"\ninterval = 0.0\n");

    let output = cadenced()
        .arg("--check")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("timer \"bad\""),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn check_rejects_unknown_group_member() {
    let project = Project::empty();
    let config = project.config("[[groups]]\nname = \"g\"\ntimers = [\"ghost\"]\n");

    let output = cadenced()
        .arg("--check")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown timer \"ghost\""));
}

#[test]
fn check_reports_missing_config_file() {
    let project = Project::empty();

    let output = cadenced()
        .arg("--check")
        .arg("--config")
        .arg(project.file("absent.toml"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to read config"));
}

#[test]
fn check_reports_toml_syntax_errors() {
    let project = Project::empty();
    let config = project.config("frame_ms = \n");

    let output = cadenced()
        .arg("--check")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid config"));
}
