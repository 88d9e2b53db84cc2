// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Serial console capture.
///
/// Collects CRLF/LF terminated lines and optionally mirrors the raw bytes to
/// stdout and to a shared byte sink.
#[derive(Debug, Default)]
pub struct LineLog {
    lines: Vec<String>,
    pending: String,
    sink: Option<Arc<Mutex<Vec<u8>>>>,
    echo_stdout: bool,
}

impl LineLog {
    pub fn new(echo_stdout: bool) -> Self {
        Self {
            echo_stdout,
            ..Default::default()
        }
    }

    pub fn set_sink(&mut self, sink: Option<Arc<Mutex<Vec<u8>>>>, echo_stdout: bool) {
        self.sink = sink;
        self.echo_stdout = echo_stdout;
    }

    /// Completed lines, terminators stripped.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle)) || self.pending.contains(needle)
    }

    fn push_raw(&mut self, s: &str) {
        if let Some(sink) = &self.sink {
            if let Ok(mut guard) = sink.lock() {
                guard.extend_from_slice(s.as_bytes());
            }
        }

        if self.echo_stdout {
            #[allow(unused_must_use)]
            {
                print!("{}", s);
                io::stdout().flush();
            }
        }
    }
}

impl fmt::Write for LineLog {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_raw(s);
        for ch in s.chars() {
            match ch {
                '\n' => {
                    let line = std::mem::take(&mut self.pending);
                    self.lines.push(line.trim_end_matches('\r').to_string());
                }
                _ => self.pending.push(ch),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    #[test]
    fn test_crlf_lines_are_split() {
        let mut log = LineLog::new(false);
        write!(log, "ON\r\nOFF\r\nPART").unwrap();
        assert_eq!(log.lines(), &["ON".to_string(), "OFF".to_string()]);
        assert!(log.contains("PART"));
        assert!(!log.contains("\r"));
    }

    #[test]
    fn test_sink_receives_raw_bytes() {
        let mut log = LineLog::new(false);
        let sink = Arc::new(Mutex::new(Vec::new()));
        log.set_sink(Some(sink.clone()), false);
        log.write_str("OFF\r\n").unwrap();
        assert_eq!(sink.lock().unwrap().as_slice(), b"OFF\r\n");
    }
}
