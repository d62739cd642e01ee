//! PrinterTransport middleware for monitoring transport traffic
//!
//! Wraps any `Transport` and prints every write and read passing through it
//! to stderr.
//!
//! # Example
//!
//! ```ignore
//! use rn42_transport::{PrinterConfig, PrinterTransport, SerialTransport};
//!
//! let serial = SerialTransport::open(&settings)?;
//! let monitored = PrinterTransport::wrap(serial, PrinterConfig::default());
//! // All traffic is now echoed to stderr
//! ```

use std::str::FromStr;
use std::time::Duration;

use colored::Colorize;

use crate::protocol::{escape_ascii, format_hex};
use crate::{PortInfo, Transport, TransportError};

/// Traffic direction filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrafficFilter {
    #[default]
    All,
    /// Writes to the module only
    Tx,
    /// Bytes read from the module only
    Rx,
}

impl TrafficFilter {
    fn shows_tx(self) -> bool {
        matches!(self, Self::All | Self::Tx)
    }

    fn shows_rx(self) -> bool {
        matches!(self, Self::All | Self::Rx)
    }
}

impl FromStr for TrafficFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "tx" | "out" | "write" => Ok(Self::Tx),
            "rx" | "in" | "read" => Ok(Self::Rx),
            _ => Err(format!("Unknown filter: {}", s)),
        }
    }
}

/// Configuration for the PrinterTransport
#[derive(Debug, Clone, Default)]
pub struct PrinterConfig {
    /// Show raw hex dump alongside the escaped text
    pub show_hex: bool,
    /// Directions to print
    pub filter: TrafficFilter,
}

impl PrinterConfig {
    /// Create config with hex output setting
    pub fn with_hex(mut self, show: bool) -> Self {
        self.show_hex = show;
        self
    }

    /// Create config with filter
    pub fn with_filter(mut self, filter: TrafficFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Transport middleware that prints all traffic
pub struct PrinterTransport<T> {
    inner: T,
    config: PrinterConfig,
}

impl<T: Transport> PrinterTransport<T> {
    /// Wrap a transport with printing middleware
    pub fn wrap(transport: T, config: PrinterConfig) -> Self {
        Self {
            inner: transport,
            config,
        }
    }

    /// Unwrap the monitored transport
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn print_tx(&self, data: &[u8]) {
        if !self.config.filter.shows_tx() {
            return;
        }
        eprintln!(
            "{} {}  {:?}",
            ">>>".cyan(),
            "TX".cyan().bold(),
            escape_ascii(data)
        );
        if self.config.show_hex {
            eprintln!("    {}  {}", "HEX".dimmed(), format_hex(data));
        }
    }

    fn print_rx(&self, data: &[u8]) {
        if data.is_empty() || !self.config.filter.shows_rx() {
            return;
        }
        eprintln!(
            "{} {}  {:?}",
            "<<<".green(),
            "RX".green().bold(),
            escape_ascii(data)
        );
        if self.config.show_hex {
            eprintln!("    {}  {}", "HEX".dimmed(), format_hex(data));
        }
    }
}

impl<T: Transport> Transport for PrinterTransport<T> {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.print_tx(data);
        self.inner.write(data)
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        let data = self.inner.read(n)?;
        self.print_rx(&data);
        Ok(data)
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        self.inner.bytes_available()
    }

    fn settle(&mut self, delay: Duration) {
        self.inner.settle(delay)
    }

    fn port_info(&self) -> &PortInfo {
        self.inner.port_info()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close()
    }
}
