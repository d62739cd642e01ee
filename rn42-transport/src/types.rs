//! Common types for the transport layer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Real serial device (USB-UART bridge to the module)
    Serial,
    /// In-process module simulator
    Simulated,
    /// Scripted replies for tests
    Scripted,
}

/// Identification of the open transport
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Device path or identifier (transport-specific)
    pub path: String,
    /// Line rate in baud (0 for in-memory transports)
    pub baud_rate: u32,
    /// Backend kind
    pub kind: TransportKind,
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TransportKind::Serial => write!(f, "{} @ {} baud", self.path, self.baud_rate),
            _ => write!(f, "{} ({:?})", self.path, self.kind),
        }
    }
}

/// Serial parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Serial line settings used to open the port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Device path, e.g. `/dev/ttyUSB0`
    pub path: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5-8)
    pub data_bits: u8,
    pub parity: Parity,
    /// Stop bits (1 or 2)
    pub stop_bits: u8,
    /// Timeout for blocking reads (ms)
    pub read_timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            path: crate::protocol::serial::DEFAULT_PORT.to_string(),
            baud_rate: crate::protocol::serial::DEFAULT_BAUD_RATE,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            read_timeout_ms: crate::protocol::serial::READ_TIMEOUT_MS,
        }
    }
}
