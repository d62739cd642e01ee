//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial error: {0}")]
    Serial(String),

    #[error("Transport is closed")]
    Closed,
}

impl From<tokio_serial::Error> for TransportError {
    fn from(e: tokio_serial::Error) -> Self {
        match e.kind() {
            tokio_serial::ErrorKind::Io(kind) => {
                TransportError::Io(std::io::Error::new(kind, e.description))
            }
            _ => TransportError::Serial(e.to_string()),
        }
    }
}
