//! RN-42 HID console
//!
//! Line-oriented front end for an RN-42 Bluetooth module running the HID
//! firmware: switches it between data and command mode, sets its HID
//! profile, and sends raw or encoded HID reports.

pub mod cli;
pub mod command;
pub mod config;
pub mod console;
pub mod error;

pub use command::ConsoleCommand;
pub use config::ConsoleConfig;
pub use console::{Console, Outcome};
pub use error::ConsoleError;
