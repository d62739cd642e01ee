//! In-memory transports
//!
//! `SimulatedModule` behaves like a module on the other end of the line and
//! backs `--simulate` sessions. `ScriptedTransport` replays fixed replies and
//! records traffic, for tests.
//!
//! Neither sleeps: `settle()` is the point where pending replies become
//! readable, which stands in for the module's processing latency.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;
use crate::protocol::{reply, wire};
use crate::types::{PortInfo, TransportKind};
use crate::Transport;

fn take_bytes(queue: &mut VecDeque<u8>, n: usize) -> Vec<u8> {
    let n = n.min(queue.len());
    queue.drain(..n).collect()
}

// ============================================================================
// ScriptedTransport
// ============================================================================

/// Transport that releases one scripted reply per `settle()` call.
///
/// The first `settle()` makes the first reply readable, the second the
/// second, and so on; once the script runs out, settles release nothing.
/// Bytes pushed with `push_incoming` are readable immediately.
pub struct ScriptedTransport {
    info: PortInfo,
    replies: VecDeque<Vec<u8>>,
    incoming: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    write_attempts: usize,
    settle_delays: Vec<Duration>,
    fail_writes: bool,
    closed: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            info: PortInfo {
                path: "scripted".into(),
                baud_rate: 0,
                kind: TransportKind::Scripted,
            },
            replies: VecDeque::new(),
            incoming: VecDeque::new(),
            writes: Vec::new(),
            write_attempts: 0,
            settle_delays: Vec::new(),
            fail_writes: false,
            closed: false,
        }
    }

    /// Transport whose n-th settle releases the n-th reply
    pub fn with_replies<I, B>(replies: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut transport = Self::new();
        for r in replies {
            transport.push_reply(r);
        }
        transport
    }

    /// Queue a reply for a later settle
    pub fn push_reply(&mut self, reply: impl AsRef<[u8]>) {
        self.replies.push_back(reply.as_ref().to_vec());
    }

    /// Make bytes readable right away
    pub fn push_incoming(&mut self, data: &[u8]) {
        self.incoming.extend(data);
    }

    /// Make every subsequent write fail with a broken-pipe error
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }

    /// Successful writes, in order
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Every write call, including failed ones
    pub fn write_attempts(&self) -> usize {
        self.write_attempts
    }

    pub fn settle_count(&self) -> usize {
        self.settle_delays.len()
    }

    pub fn settle_delays(&self) -> &[Duration] {
        &self.settle_delays
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed {
            Err(TransportError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ScriptedTransport {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.write_attempts += 1;
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted write failure").into());
        }
        self.writes.push(data.to_vec());
        Ok(())
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        self.ensure_open()?;
        Ok(take_bytes(&mut self.incoming, n))
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        self.ensure_open()?;
        Ok(self.incoming.len())
    }

    fn settle(&mut self, delay: Duration) {
        self.settle_delays.push(delay);
        if let Some(reply) = self.replies.pop_front() {
            self.incoming.extend(reply);
        }
    }

    fn port_info(&self) -> &PortInfo {
        &self.info
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}

// ============================================================================
// SimulatedModule
// ============================================================================

/// Operating mode of the simulated module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleMode {
    /// Raw HID reports
    Data,
    /// CRLF-terminated configuration lines
    Command,
}

/// Software stand-in for the module.
///
/// Replies are queued on write and released by the next `settle()`.
pub struct SimulatedModule {
    info: PortInfo,
    mode: ModuleMode,
    hid_code: Option<String>,
    line: Vec<u8>,
    pending: Vec<u8>,
    incoming: VecDeque<u8>,
    reports: usize,
    closed: bool,
}

impl SimulatedModule {
    pub fn new() -> Self {
        Self {
            info: PortInfo {
                path: "simulated".into(),
                baud_rate: 0,
                kind: TransportKind::Simulated,
            },
            mode: ModuleMode::Data,
            hid_code: None,
            line: Vec::new(),
            pending: Vec::new(),
            incoming: VecDeque::new(),
            reports: 0,
            closed: false,
        }
    }

    pub fn mode(&self) -> ModuleMode {
        self.mode
    }

    /// Last HID flag value accepted with `SH,`
    pub fn hid_code(&self) -> Option<&str> {
        self.hid_code.as_deref()
    }

    /// Number of raw reports received in data mode
    pub fn reports_received(&self) -> usize {
        self.reports
    }

    fn respond(&mut self, text: &str) {
        self.pending.extend_from_slice(text.as_bytes());
        self.pending.extend_from_slice(wire::LINE_TERMINATOR);
    }

    fn handle_data(&mut self, data: &[u8]) {
        if data == wire::COMMAND_MODE_SENTINEL {
            self.mode = ModuleMode::Command;
            self.line.clear();
            self.respond(reply::COMMAND_MODE);
        } else if data.first() == Some(&wire::REPORT_START) {
            self.reports += 1;
        }
    }

    fn handle_command_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            if byte != b'\n' {
                self.line.push(byte);
                continue;
            }
            let line = String::from_utf8_lossy(&self.line)
                .trim_end_matches('\r')
                .to_string();
            self.line.clear();
            self.handle_command_line(&line);
            if self.mode == ModuleMode::Data {
                break;
            }
        }
    }

    fn handle_command_line(&mut self, line: &str) {
        debug!("Simulated module got {:?}", line);
        if line == "---" {
            self.mode = ModuleMode::Data;
            self.respond(reply::DATA_MODE);
        } else if let Some(code) = line.strip_prefix(wire::SET_HID_TYPE_PREFIX) {
            if code.len() == 4 && code.chars().all(|c| c.is_ascii_hexdigit()) {
                self.hid_code = Some(code.to_ascii_uppercase());
                self.respond(reply::OK);
            } else {
                self.respond("ERR");
            }
        } else if line.is_empty() {
            // Bare CRLF is ignored.
        } else {
            self.respond(reply::UNKNOWN);
        }
    }
}

impl Default for SimulatedModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimulatedModule {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        match self.mode {
            ModuleMode::Data => self.handle_data(data),
            ModuleMode::Command => self.handle_command_bytes(data),
        }
        Ok(())
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        Ok(take_bytes(&mut self.incoming, n))
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        Ok(self.incoming.len())
    }

    fn settle(&mut self, _delay: Duration) {
        self.incoming.extend(self.pending.drain(..));
    }

    fn port_info(&self) -> &PortInfo {
        &self.info
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}
