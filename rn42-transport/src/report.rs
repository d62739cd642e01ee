//! Raw HID report encoding
//!
//! In data mode the module forwards binary reports of the form
//! `[0xFD] [preamble...] [fields...]`. The preamble identifies the report
//! type; the fields are packed one byte each in a fixed layout per device
//! class. `DEVICE_CLASSES` is the only place that binds a console name to a
//! preamble and layout.

use std::fmt;

use thiserror::Error;
use zerocopy::{Immutable, IntoBytes};

use crate::protocol::{format_hex, frame_line, wire};

// =============================================================================
// Errors
// =============================================================================

/// Report encoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{class} report needs {required} values, got {got}")]
    InsufficientFields {
        class: &'static str,
        required: usize,
        got: usize,
    },

    #[error("value #{index} ({token:?}) is not an integer in 0-255")]
    InvalidFieldValue { index: usize, token: String },

    #[error("no RN42 action type named {0}")]
    UnknownDeviceClass(String),
}

// =============================================================================
// Report structs
// =============================================================================

/// Keyboard report body: modifier bitmap and one key code.
#[derive(Debug, Clone, Copy, IntoBytes, Immutable)]
#[repr(C)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub key_code: u8,
}

/// Mouse report body.
#[derive(Debug, Clone, Copy, IntoBytes, Immutable)]
#[repr(C)]
pub struct MouseReport {
    pub buttons: u8,
    pub x: u8,
    pub y: u8,
    pub wheel: u8,
}

/// Joystick / gamepad report body: two button bytes and four axes.
#[derive(Debug, Clone, Copy, IntoBytes, Immutable)]
#[repr(C)]
pub struct JoystickReport {
    pub buttons_low: u8,
    pub buttons_high: u8,
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub rz: u8,
}

/// Consumer-control report body: 16-bit usage bitmap, low byte first.
#[derive(Debug, Clone, Copy, IntoBytes, Immutable)]
#[repr(C)]
pub struct ConsumerReport {
    pub usage_low: u8,
    pub usage_high: u8,
}

/// Report layouts understood by the module.
///
/// Joystick and gamepad classes share `Joystick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportLayout {
    Keyboard,
    Mouse,
    Joystick,
    Consumer,
}

impl ReportLayout {
    /// Number of one-byte fields in the report body.
    pub const fn field_count(self) -> usize {
        match self {
            ReportLayout::Keyboard => std::mem::size_of::<KeyboardReport>(),
            ReportLayout::Mouse => std::mem::size_of::<MouseReport>(),
            ReportLayout::Joystick => std::mem::size_of::<JoystickReport>(),
            ReportLayout::Consumer => std::mem::size_of::<ConsumerReport>(),
        }
    }

    /// Pack parsed values into the report body.
    ///
    /// `values` must hold at least `field_count()` entries; extras are ignored.
    fn pack(self, values: &[u8]) -> Vec<u8> {
        match self {
            ReportLayout::Keyboard => KeyboardReport {
                modifiers: values[0],
                key_code: values[1],
            }
            .as_bytes()
            .to_vec(),
            ReportLayout::Mouse => MouseReport {
                buttons: values[0],
                x: values[1],
                y: values[2],
                wheel: values[3],
            }
            .as_bytes()
            .to_vec(),
            ReportLayout::Joystick => JoystickReport {
                buttons_low: values[0],
                buttons_high: values[1],
                x: values[2],
                y: values[3],
                z: values[4],
                rz: values[5],
            }
            .as_bytes()
            .to_vec(),
            ReportLayout::Consumer => ConsumerReport {
                usage_low: values[0],
                usage_high: values[1],
            }
            .as_bytes()
            .to_vec(),
        }
    }
}

// =============================================================================
// Device classes
// =============================================================================

/// A logical HID peripheral and its report framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceClass {
    /// Console name (`action=<name>(...)`)
    pub name: &'static str,
    /// Bytes following `0xFD` that identify the report to the module
    pub preamble: &'static [u8],
    /// Raw descriptor number from the RN-HID user guide
    pub descriptor: u8,
    pub layout: ReportLayout,
}

/// Device class table.
pub const DEVICE_CLASSES: &[DeviceClass] = &[
    DeviceClass {
        name: "keyboard",
        preamble: &[0x09, 0x01],
        descriptor: 1,
        layout: ReportLayout::Keyboard,
    },
    DeviceClass {
        name: "mouse",
        preamble: &[0x09, 0x01],
        descriptor: 2,
        layout: ReportLayout::Mouse,
    },
    DeviceClass {
        name: "consumer",
        preamble: &[0x03, 0x03],
        descriptor: 3,
        layout: ReportLayout::Consumer,
    },
    DeviceClass {
        name: "gamepad",
        preamble: &[0x06],
        descriptor: 6,
        layout: ReportLayout::Joystick,
    },
    DeviceClass {
        name: "joystick",
        preamble: &[0x06],
        descriptor: 6,
        layout: ReportLayout::Joystick,
    },
];

/// Field delimiter inside `action=<name>(<fields>)`
pub const FIELD_DELIMITER: char = ',';

impl DeviceClass {
    /// Look up a device class by console name (case-insensitive).
    pub fn from_name(name: &str) -> Option<&'static DeviceClass> {
        let name = name.trim();
        DEVICE_CLASSES
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Comma-separated list of valid names, for diagnostics.
    pub fn valid_names() -> String {
        DEVICE_CLASSES
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Number of values an action for this class requires.
    pub fn field_count(&self) -> usize {
        self.layout.field_count()
    }

    /// Total encoded length: start byte + preamble + body.
    pub fn packet_len(&self) -> usize {
        1 + self.preamble.len() + self.field_count()
    }

    /// Encode a comma-delimited value list into a report packet.
    pub fn encode(&self, fields: &str) -> Result<ReportPacket, EncodeError> {
        let tokens: Vec<&str> = fields.split(FIELD_DELIMITER).map(str::trim).collect();
        let required = self.field_count();
        if tokens.len() < required {
            return Err(EncodeError::InsufficientFields {
                class: self.name,
                required,
                got: tokens.len(),
            });
        }

        let values = tokens[..required]
            .iter()
            .enumerate()
            .map(|(index, token)| {
                token
                    .parse::<u8>()
                    .map_err(|_| EncodeError::InvalidFieldValue {
                        index,
                        token: (*token).to_string(),
                    })
            })
            .collect::<Result<Vec<u8>, _>>()?;

        let mut bytes = Vec::with_capacity(self.packet_len());
        bytes.push(wire::REPORT_START);
        bytes.extend_from_slice(self.preamble);
        bytes.extend_from_slice(&self.layout.pack(&values));
        Ok(ReportPacket(bytes))
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Encode `fields` for the device class called `device_class`.
pub fn encode(device_class: &str, fields: &str) -> Result<ReportPacket, EncodeError> {
    DeviceClass::from_name(device_class)
        .ok_or_else(|| EncodeError::UnknownDeviceClass(device_class.to_string()))?
        .encode(fields)
}

// =============================================================================
// Report packet
// =============================================================================

/// An encoded report, ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportPacket(Vec<u8>);

impl ReportPacket {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Packet followed by the line terminator, as written to the module.
    pub fn to_line(&self) -> Vec<u8> {
        frame_line(&self.0)
    }
}

impl AsRef<[u8]> for ReportPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ReportPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hex(&self.0))
    }
}
