//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use ratatui::text::Line;

/// Flatten a styled line to its text.
pub fn plain(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

pub fn plain_lines(lines: &[Line<'_>]) -> Vec<String> {
    lines.iter().map(plain).collect()
}

/// A cloneable in-memory sink. One clone goes into the terminal, the test
/// keeps the other to inspect what was written.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written since the last call, as lossy UTF-8.
    pub fn take(&self) -> String {
        let mut bytes = self.0.lock().unwrap();
        let out = String::from_utf8_lossy(&bytes).into_owned();
        bytes.clear();
        out
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
