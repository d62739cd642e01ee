//! Console configuration
//!
//! Stored as TOML, by default in `~/.config/rn42/console.toml`. Every field has
//! a default, so partial files and a missing file are both fine.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rn42_transport::protocol::timing;
use rn42_transport::{PrinterConfig, ScanPolicy, SerialSettings, TrafficFilter};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Handshake retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Write/settle/drain rounds per mode transition
    pub max_attempts: u32,
    /// Wait after each write before reading the reply (ms)
    pub settle_delay_ms: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            max_attempts: timing::MAX_SCAN_ATTEMPTS,
            settle_delay_ms: timing::SETTLE_DELAY_MS,
        }
    }
}

/// Traffic monitor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    /// Print a hex dump under each line
    pub hex: bool,
    /// `all`, `tx` or `rx`
    pub filter: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hex: false,
            filter: "all".to_string(),
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub serial: SerialSettings,
    pub handshake: HandshakeConfig,
    pub monitor: MonitorConfig,
}

impl ConsoleConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rn42")
            .join("console.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: ConsoleConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fold command-line flags over the loaded values.
    ///
    /// Any monitor flag (`--monitor`, `--hex`, `--filter`) turns monitoring on.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = &cli.port {
            self.serial.path = port.clone();
        }
        if let Some(baud) = cli.baud {
            self.serial.baud_rate = baud;
        }
        if let Some(attempts) = cli.attempts {
            self.handshake.max_attempts = attempts;
        }
        if let Some(ms) = cli.settle_ms {
            self.handshake.settle_delay_ms = ms;
        }
        if cli.monitor {
            self.monitor.enabled = true;
        }
        if cli.hex {
            self.monitor.enabled = true;
            self.monitor.hex = true;
        }
        if let Some(filter) = &cli.filter {
            self.monitor.enabled = true;
            self.monitor.filter = filter.clone();
        }
    }

    pub fn scan_policy(&self) -> ScanPolicy {
        ScanPolicy::new(
            self.handshake.max_attempts,
            Duration::from_millis(self.handshake.settle_delay_ms),
        )
    }

    /// Printer settings, if monitoring is enabled
    pub fn printer_config(&self) -> anyhow::Result<Option<PrinterConfig>> {
        if !self.monitor.enabled {
            return Ok(None);
        }
        let filter = TrafficFilter::from_str(&self.monitor.filter).map_err(anyhow::Error::msg)?;
        Ok(Some(
            PrinterConfig::default()
                .with_hex(self.monitor.hex)
                .with_filter(filter),
        ))
    }
}
