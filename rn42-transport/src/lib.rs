//! Transport abstraction layer for RN-42 HID module communication
//!
//! This crate provides:
//!
//! - A byte-stream `Transport` trait with a serial backend
//! - The command-mode handshake (`$$$` / `---` / `SH,`)
//! - Raw HID report encoding for data mode
//! - A traffic printer and in-memory transports for dry runs and tests

pub mod error;
pub mod handshake;
pub mod printer;
pub mod protocol;
pub mod report;
pub mod sim;
pub mod types;

mod serial;

pub use error::TransportError;
pub use handshake::{
    drain, enter_command_mode, exit_command_mode, scan_expect, set_hid_type, ScanPolicy,
};
pub use printer::{PrinterConfig, PrinterTransport, TrafficFilter};
pub use protocol::{HidType, HidTypeError};
pub use report::{encode, DeviceClass, EncodeError, ReportLayout, ReportPacket, DEVICE_CLASSES};
pub use serial::{list_ports, SerialTransport};
pub use sim::{ScriptedTransport, SimulatedModule};
pub use types::{Parity, PortInfo, SerialSettings, TransportKind};

use std::time::Duration;

/// The core transport trait - all backends implement this
///
/// A duplex byte stream that is already open and configured. Calls block
/// until complete; there is no internal buffering beyond what the backend
/// provides.
pub trait Transport: Send {
    /// Write all of `data`
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Blocking read of up to `n` bytes
    fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError>;

    /// Number of bytes that can be read without blocking
    fn bytes_available(&mut self) -> Result<usize, TransportError>;

    /// Wait for the module to process the last write.
    ///
    /// The module gives no synchronous acknowledgement, so handshakes sleep
    /// blindly before polling. In-memory transports override this to release
    /// scripted replies instead of sleeping.
    fn settle(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    /// Get port information
    fn port_info(&self) -> &PortInfo;

    /// Close the transport. Further I/O fails with `TransportError::Closed`.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Type alias for a boxed transport
pub type BoxedTransport = Box<dyn Transport>;

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(data)
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        (**self).read(n)
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        (**self).bytes_available()
    }

    fn settle(&mut self, delay: Duration) {
        (**self).settle(delay)
    }

    fn port_info(&self) -> &PortInfo {
        (**self).port_info()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }
}
