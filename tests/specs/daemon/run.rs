//! Running the frame loop for a bounded number of frames

use crate::prelude::*;
use assert_cmd::Command;

fn cadenced_cmd() -> Command {
    let mut cmd = Command::new(cadenced_binary());
    cmd.env_remove("CADENCE_CONFIG")
        .env_remove("CADENCE_FRAME_MS")
        .env("RUST_LOG", "info");
    cmd
}

#[test]
fn bounded_run_exits_cleanly() {
    let project = Project::empty();
    let config = project.config("[[timers]]\nname = \"t\"\ninterval = 0.001\nauto_start = true\n");

    cadenced_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--frame-ms", "1", "--frames", "5"])
        .assert()
        .success();
}

#[test]
fn completion_is_logged_to_file() {
    let project = Project::empty();
    let log = project.file("logs/cadenced.log");
    let config = project.config(&format!(
        r#"
log_path = "{}"

[[timers]]
name = "once"
interval = 0.001
repeat_count = 1
auto_start = true
"#,
        log.display()
    ));

    cadenced_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--frame-ms", "5", "--frames", "5"])
        .assert()
        .success();

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("timer complete"), "log:\n{text}");
    assert!(text.contains("once"), "log:\n{text}");
    assert!(text.contains("cadenced stopped"), "log:\n{text}");
}

#[test]
fn group_lifecycle_is_logged() {
    let project = Project::empty();
    let log = project.file("cadenced.log");
    let config = project.config(&format!(
        r#"
log_path = "{}"

[[timers]]
name = "a"

[[groups]]
name = "pair"
auto_start = true
timers = ["a"]
"#,
        log.display()
    ));

    cadenced_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--frame-ms", "1", "--frames", "2"])
        .assert()
        .success();

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("groupStart"), "log:\n{text}");
    assert!(text.contains("groupStop"), "log:\n{text}");
}

#[test]
fn missing_serial_port_does_not_stop_timers() {
    let project = Project::empty();
    let config = project.config("[[timers]]\nname = \"t\"\nauto_start = true\n");
    let port = project.file("no-such-tty");

    cadenced_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--port")
        .arg(&port)
        .args(["--frame-ms", "1", "--frames", "3"])
        .assert()
        .success();
}

#[test]
fn invalid_frame_env_is_ignored() {
    let project = Project::empty();
    let config = project.config("");

    cadenced_cmd()
        .env("CADENCE_FRAME_MS", "fast")
        .arg("--config")
        .arg(&config)
        .args(["--frames", "1"])
        .assert()
        .success();
}
