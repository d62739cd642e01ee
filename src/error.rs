//! Console error types

use rn42_transport::{EncodeError, TransportError};
use thiserror::Error;

/// Errors raised while interpreting or executing a console line
///
/// Everything except `Transport` and `Output` is recoverable: the console
/// prints it and reads the next line.
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("no RN42-HID type named {name} (valid: {valid})")]
    UnknownHidType { name: String, valid: String },

    #[error("no RN42 action type named {name} (valid: {valid})")]
    UnknownDeviceClass { name: String, valid: String },

    #[error("action packet formatted incorrectly: {0:?}, expected action=<name>(<v1>,<v2>,...)")]
    MalformedAction(String),

    #[error("action syntax was incorrect: {0}")]
    Encode(#[from] EncodeError),

    #[error("raw payload is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("incorrect {form} format, must use {form}={usage}")]
    MissingValue { form: &'static str, usage: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("console output failed: {0}")]
    Output(#[from] std::io::Error),
}

impl ConsoleError {
    /// Whether the session must end
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Output(_))
    }
}
