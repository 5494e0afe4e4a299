// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::{Read, Seek, SeekFrom, Write};

#[yare::parameterized(
    zero         = { 0, 1 },
    under_tenth  = { 40, 1 },
    exact        = { 500, 5 },
    rounds_up    = { 501, 6 },
    capped       = { 60_000, 255 },
)]
fn read_timeout_in_deciseconds(ms: u64, expected: u8) {
    assert_eq!(deciseconds(Duration::from_millis(ms)), expected);
}

#[test]
fn stty_args_configure_raw_mode() {
    let mut settings = SerialSettings::new("/dev/ttyUSB0");
    settings.baud_rate = 115_200;
    let args = stty_args(&settings);

    assert_eq!(args[1], "/dev/ttyUSB0");
    assert_eq!(args[2], "115200");
    assert!(args.contains(&"raw".to_string()));
    assert_eq!(args.last().map(String::as_str), Some("5"));
}

#[test]
fn opens_plain_file_read_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("port");
    std::fs::write(&path, b"").unwrap();
    let settings = SerialSettings::new(path.to_string_lossy());

    let mut stream = FileSerialDriver::raw().open(&settings).unwrap();
    stream.write_all(b"hello\n").unwrap();
    stream.flush().unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"hello\n");
}

#[test]
fn clone_reads_same_file() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"abc").unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let mut clone = SerialStream::try_clone(&file).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(clone.read(&mut buf).unwrap(), 3);
    assert_eq!(&buf[..3], b"abc");
}

#[test]
fn missing_port_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let settings = SerialSettings::new(dir.path().join("absent").to_string_lossy());

    let err = FileSerialDriver::new().open(&settings).err().unwrap();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}

#[test]
fn non_terminal_port_is_used_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("port");
    std::fs::write(&path, b"ready\n").unwrap();
    let settings = SerialSettings::new(path.to_string_lossy());

    let mut stream = FileSerialDriver::new().open(&settings).unwrap();
    let mut buf = [0u8; 16];

    assert_eq!(stream.read(&mut buf).unwrap(), 6);
    assert_eq!(&buf[..6], b"ready\n");
}
