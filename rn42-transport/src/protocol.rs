//! Protocol constants and utilities for RN-42 HID module communication

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Literal byte sequences exchanged with the module
pub mod wire {
    /// Enter command mode. Sent bare, the module needs the line quiet
    /// around it so no terminator is appended.
    pub const COMMAND_MODE_SENTINEL: &[u8] = b"$$$";
    /// Leave command mode and return to data mode
    pub const EXIT_COMMAND_MODE: &[u8] = b"---\r\n";
    /// Line terminator for command-mode lines and framed reports
    pub const LINE_TERMINATOR: &[u8] = b"\r\n";
    /// Prefix of the set-HID-type command (`SH,<code>`)
    pub const SET_HID_TYPE_PREFIX: &str = "SH,";
    /// First byte of every raw HID report
    pub const REPORT_START: u8 = 0xFD;
}

/// Reply tokens scanned for after a mode command
pub mod reply {
    /// Module acknowledged `$$$`
    pub const COMMAND_MODE: &str = "CMD";
    /// Module acknowledged `---`
    pub const DATA_MODE: &str = "END";
    /// Module accepted a setting
    pub const OK: &str = "AOK";
    /// Module rejected a command-mode line
    pub const UNKNOWN: &str = "?";
}

/// Handshake timing constants
pub mod timing {
    /// Rounds of write/settle/drain before a handshake is declared failed
    pub const MAX_SCAN_ATTEMPTS: u32 = 3;
    /// Blind wait after each write before polling for a reply (ms)
    pub const SETTLE_DELAY_MS: u64 = 1000;
    /// Upper bound on bytes collected by a single drain
    pub const MAX_DRAIN_BYTES: usize = 4096;
}

/// Serial line defaults (FTDI USB-UART bridge)
pub mod serial {
    pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;
    /// Blocking read timeout (ms)
    pub const READ_TIMEOUT_MS: u64 = 500;
}

// ---------------------------------------------------------------------------
// HID Type
// ---------------------------------------------------------------------------

/// HID profile advertised by the module (value of the HID flag register).
///
/// Separate namespace from device classes: joystick and gamepad share a
/// report layout but are distinct profiles here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HidType {
    Keyboard,
    Gamepad,
    Mouse,
    Combo,
    Joystick,
    Digitizer,
    Sensor,
    UseCfg,
}

impl HidType {
    /// All HID types in register order.
    pub const ALL: [HidType; 8] = [
        HidType::Keyboard,
        HidType::Gamepad,
        HidType::Mouse,
        HidType::Combo,
        HidType::Joystick,
        HidType::Digitizer,
        HidType::Sensor,
        HidType::UseCfg,
    ];

    /// Console name.
    pub fn name(self) -> &'static str {
        match self {
            HidType::Keyboard => "keyboard",
            HidType::Gamepad => "gamepad",
            HidType::Mouse => "mouse",
            HidType::Combo => "combo",
            HidType::Joystick => "joystick",
            HidType::Digitizer => "digitizer",
            HidType::Sensor => "sensor",
            HidType::UseCfg => "usecfg",
        }
    }

    /// 16-bit HID flag register value.
    pub fn code(self) -> u16 {
        match self {
            HidType::Keyboard => 0x0200,
            HidType::Gamepad => 0x0210,
            HidType::Mouse => 0x0220,
            HidType::Combo => 0x0230,
            HidType::Joystick => 0x0240,
            HidType::Digitizer => 0x0250,
            HidType::Sensor => 0x0260,
            HidType::UseCfg => 0x0270,
        }
    }

    /// Look up a HID type by console name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Comma-separated list of valid names, for diagnostics.
    pub fn valid_names() -> String {
        Self::ALL.map(HidType::name).join(", ")
    }
}

impl fmt::Display for HidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:04X})", self.name(), self.code())
    }
}

/// Unknown HID type name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no RN42-HID type named {0}")]
pub struct HidTypeError(pub String);

impl FromStr for HidType {
    type Err = HidTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| HidTypeError(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Framing helpers
// ---------------------------------------------------------------------------

/// Append the line terminator to a payload.
pub fn frame_line(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(payload.len() + wire::LINE_TERMINATOR.len());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(wire::LINE_TERMINATOR);
    buf
}

/// Build the set-HID-type command line: `SH,<XXXX>\r\n`
pub fn build_set_hid_type(hid_type: HidType) -> Vec<u8> {
    let line = format!("{}{:04X}", wire::SET_HID_TYPE_PREFIX, hid_type.code());
    frame_line(line.as_bytes())
}

/// Colon-separated lowercase hex, e.g. `fd:09:01`
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Printable rendering of module output with control bytes escaped
pub fn escape_ascii(data: &[u8]) -> String {
    data.escape_ascii().to_string()
}

/// Search for `needle` anywhere in `haystack`. An empty needle always matches.
pub fn contains_token(haystack: &[u8], needle: &str) -> bool {
    let needle = needle.as_bytes();
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hid_type_codes() {
        assert_eq!(HidType::Keyboard.code(), 0x0200);
        assert_eq!(HidType::Joystick.code(), 0x0240);
        assert_eq!(HidType::UseCfg.code(), 0x0270);
    }

    #[test]
    fn test_hid_type_from_str() {
        assert_eq!("gamepad".parse::<HidType>().unwrap(), HidType::Gamepad);
        assert_eq!("Mouse".parse::<HidType>().unwrap(), HidType::Mouse);
        assert_eq!(
            "bogus".parse::<HidType>().unwrap_err(),
            HidTypeError("bogus".into())
        );
    }

    #[test]
    fn test_set_hid_type_command() {
        assert_eq!(build_set_hid_type(HidType::Combo), b"SH,0230\r\n".to_vec());
        assert_eq!(
            build_set_hid_type(HidType::Keyboard),
            b"SH,0200\r\n".to_vec()
        );
    }

    #[test]
    fn test_valid_names_lists_every_type() {
        let names = HidType::valid_names();
        for t in HidType::ALL {
            assert!(names.contains(t.name()));
        }
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xFD, 0x09, 0x01]), "fd:09:01");
        assert_eq!(format_hex(&[]), "");
    }

    #[test]
    fn test_contains_token() {
        assert!(contains_token(b"\r\nCMD\r\n", "CMD"));
        assert!(!contains_token(b"CM", "CMD"));
        assert!(contains_token(b"", ""));
        assert!(!contains_token(b"", "AOK"));
    }

    #[test]
    fn test_escape_ascii() {
        assert_eq!(escape_ascii(b"AOK\r\n"), "AOK\\r\\n");
    }
}
