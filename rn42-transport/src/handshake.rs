//! Command-mode handshake
//!
//! The module switches between data mode (raw reports) and command mode
//! (CRLF lines) on request, but never acknowledges synchronously: it answers
//! some time later with a short token. A handshake therefore writes, waits a
//! fixed settle delay, drains whatever arrived and scans it for the token,
//! repeating a bounded number of times.
//!
//! ```text
//! write(output) -> settle(delay) -> drain() -> contains(expected)?
//!       ^                                            | no
//!       +-------------- attempt < max_attempts ------+
//! ```
//!
//! A missing reply is not an error: the scan reports `Ok(false)`. Only
//! transport I/O failures produce `Err`, and those are returned at once
//! without another attempt.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::TransportError;
use crate::protocol::{self, reply, timing, wire, HidType};
use crate::Transport;

/// Attempt bound and settle delay for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    /// Write/settle/drain rounds before giving up
    pub max_attempts: u32,
    /// Blind wait after each write
    pub settle_delay: Duration,
}

impl ScanPolicy {
    pub fn new(max_attempts: u32, settle_delay: Duration) -> Self {
        Self {
            max_attempts,
            settle_delay,
        }
    }
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            max_attempts: timing::MAX_SCAN_ATTEMPTS,
            settle_delay: Duration::from_millis(timing::SETTLE_DELAY_MS),
        }
    }
}

/// Read every currently buffered byte, handing each chunk to `sink`.
///
/// Polls until `bytes_available()` reports zero. Chunks are at most
/// `MAX_DRAIN_BYTES` long. Returns the total number of bytes read.
fn drain_chunks<T, F>(link: &mut T, mut sink: F) -> Result<usize, TransportError>
where
    T: Transport + ?Sized,
    F: FnMut(&[u8]),
{
    let mut total = 0;
    loop {
        let available = link.bytes_available()?.min(timing::MAX_DRAIN_BYTES);
        if available == 0 {
            break;
        }
        let chunk = link.read(available)?;
        if chunk.is_empty() {
            break;
        }
        total += chunk.len();
        sink(&chunk);
    }
    Ok(total)
}

/// Read everything currently buffered, without blocking for more.
///
/// The port is always emptied; only the first `MAX_DRAIN_BYTES` are
/// returned and the rest is discarded.
pub fn drain<T: Transport + ?Sized>(link: &mut T) -> Result<Vec<u8>, TransportError> {
    let mut out = Vec::new();
    let total = drain_chunks(link, |chunk| {
        let room = timing::MAX_DRAIN_BYTES - out.len();
        out.extend_from_slice(&chunk[..chunk.len().min(room)]);
    })?;
    if total > out.len() {
        debug!("Drain discarded {} bytes", total - out.len());
    }
    Ok(out)
}

/// Empty the port and report whether `expected` appeared anywhere in it.
///
/// Only a short tail is carried between chunks, so a token split across two
/// reads is still found.
fn drain_scan<T: Transport + ?Sized>(link: &mut T, expected: &str) -> Result<bool, TransportError> {
    let keep = expected.len().saturating_sub(1);
    let mut window: Vec<u8> = Vec::new();
    let mut found = expected.is_empty();
    let total = drain_chunks(link, |chunk| {
        if found {
            return;
        }
        window.extend_from_slice(chunk);
        if protocol::contains_token(&window, expected) {
            found = true;
            return;
        }
        let cut = window.len().saturating_sub(keep);
        window.drain(..cut);
    })?;
    if !found {
        debug!(
            "No {:?} in {} bytes (tail {:?})",
            expected,
            total,
            protocol::escape_ascii(&window)
        );
    }
    Ok(found)
}

/// Write `output` and scan the reply for `expected`, retrying per `policy`.
///
/// Returns `Ok(true)` as soon as a round's drained reply contains `expected`,
/// `Ok(false)` once every attempt has failed. Each round empties the port,
/// so nothing from one round is seen by the next.
pub fn scan_expect<T: Transport + ?Sized>(
    link: &mut T,
    output: &[u8],
    expected: &str,
    policy: &ScanPolicy,
) -> Result<bool, TransportError> {
    for attempt in 1..=policy.max_attempts {
        link.write(output)?;
        link.settle(policy.settle_delay);

        if drain_scan(link, expected)? {
            debug!("Got {:?} on attempt {}", expected, attempt);
            return Ok(true);
        }

        debug!("Attempt {}/{}: no {:?}", attempt, policy.max_attempts, expected);
    }

    warn!(
        "No {:?} reply after {} attempts",
        expected, policy.max_attempts
    );
    Ok(false)
}

/// Switch the module into command mode (`$$$` → `CMD`).
pub fn enter_command_mode<T: Transport + ?Sized>(
    link: &mut T,
    policy: &ScanPolicy,
) -> Result<bool, TransportError> {
    scan_expect(link, wire::COMMAND_MODE_SENTINEL, reply::COMMAND_MODE, policy)
}

/// Return the module to data mode (`---` → `END`).
pub fn exit_command_mode<T: Transport + ?Sized>(
    link: &mut T,
    policy: &ScanPolicy,
) -> Result<bool, TransportError> {
    scan_expect(link, wire::EXIT_COMMAND_MODE, reply::DATA_MODE, policy)
}

/// Set the advertised HID profile (`SH,XXXX` → `AOK`).
///
/// Only meaningful in command mode; the module applies it after a reboot.
pub fn set_hid_type<T: Transport + ?Sized>(
    link: &mut T,
    hid_type: HidType,
    policy: &ScanPolicy,
) -> Result<bool, TransportError> {
    let command = protocol::build_set_hid_type(hid_type);
    scan_expect(link, &command, reply::OK, policy)
}
