// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Packet encoding for serial streams

/// Converts between application messages and wire bytes.
///
/// The reader thread owns its own clone of the codec, so `unpack` may keep
/// partial frames between reads. Either direction may produce nothing.
pub trait PacketCodec: Clone + Send + 'static {
    type Message: ?Sized;
    type Packet: Send + 'static;

    fn pack(&self, message: &Self::Message) -> Vec<u8>;

    /// Decode every complete packet in `bytes`, buffering any remainder.
    fn unpack(&mut self, bytes: &[u8]) -> Vec<Self::Packet>;
}

/// Newline-delimited UTF-8 text frames.
///
/// A trailing `\r` is stripped and blank lines are skipped. Invalid UTF-8 is
/// replaced rather than rejected. A line longer than `max_line_len` bytes is
/// discarded up to its terminating newline.
#[derive(Debug, Clone)]
pub struct LineCodec {
    buffer: Vec<u8>,
    max_line_len: usize,
    discarding: bool,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::with_max_line_len(4096)
    }
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line_len: max_line_len.max(1),
            discarding: false,
        }
    }

    /// Bytes held back waiting for a newline
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn finish_line(&mut self, packets: &mut Vec<String>) {
        let line = std::mem::take(&mut self.buffer);
        if std::mem::replace(&mut self.discarding, false) {
            return;
        }
        let line = line.strip_suffix(b"\r").unwrap_or(&line);
        if !line.is_empty() {
            packets.push(String::from_utf8_lossy(line).into_owned());
        }
    }
}

impl PacketCodec for LineCodec {
    type Message = str;
    type Packet = String;

    fn pack(&self, message: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(message.len() + 1);
        bytes.extend_from_slice(message.as_bytes());
        if !message.ends_with('\n') {
            bytes.push(b'\n');
        }
        bytes
    }

    fn unpack(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut packets = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                self.finish_line(&mut packets);
                continue;
            }
            if self.discarding {
                continue;
            }
            self.buffer.push(byte);
            if self.buffer.len() > self.max_line_len {
                tracing::warn!(
                    max_line_len = self.max_line_len,
                    "serial line too long, discarding"
                );
                self.buffer.clear();
                self.discarding = true;
            }
        }
        packets
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
