//! Daemon help and version specs

use crate::prelude::*;

#[test]
fn cadenced_version_shows_version() {
    let output = cadenced().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(
        stdout(&output).starts_with("cadenced 0.1.0"),
        "unexpected version output: {}",
        stdout(&output)
    );
}

#[test]
fn cadenced_help_lists_flags() {
    let output = cadenced().arg("--help").output().unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    for flag in ["--config", "--frame-ms", "--port", "--frames", "--check"] {
        assert!(out.contains(flag), "help should mention {flag}:\n{out}");
    }
}

#[test]
fn cadenced_rejects_unknown_argument() {
    let output = cadenced().arg("--bogus").output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--bogus"));
}
