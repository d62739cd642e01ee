//! Serial transport for a module behind a USB-UART bridge

use std::io::{Read, Write};
use std::time::Duration;

use tokio_serial::SerialPort;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::protocol;
use crate::types::{Parity, PortInfo, SerialSettings, TransportKind};
use crate::Transport;

/// Blocking serial port transport
///
/// Uses the synchronous port handle from the serialport builder that
/// `tokio-serial` re-exports; the console is strictly request/response so no
/// async stream is needed.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    info: PortInfo,
}

impl SerialTransport {
    /// Open and configure the port described by `settings`
    pub fn open(settings: &SerialSettings) -> Result<Self, TransportError> {
        debug!("Serial: {} @{}baud", settings.path, settings.baud_rate);

        let parity = match settings.parity {
            Parity::Even => tokio_serial::Parity::Even,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::None => tokio_serial::Parity::None,
        };

        let data_bits = match settings.data_bits {
            5 => tokio_serial::DataBits::Five,
            6 => tokio_serial::DataBits::Six,
            7 => tokio_serial::DataBits::Seven,
            _ => tokio_serial::DataBits::Eight,
        };

        let stop_bits = match settings.stop_bits {
            2 => tokio_serial::StopBits::Two,
            _ => tokio_serial::StopBits::One,
        };

        let port = tokio_serial::new(settings.path.as_str(), settings.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(Duration::from_millis(settings.read_timeout_ms))
            .open()
            .map_err(|source| TransportError::Open {
                path: settings.path.clone(),
                source,
            })?;

        info!("Serial opened: {}", settings.path);
        Ok(Self {
            port: Some(port),
            info: PortInfo {
                path: settings.path.clone(),
                baud_rate: settings.baud_rate,
                kind: TransportKind::Serial,
            },
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let port = self.port_mut()?;
        port.write_all(data)?;
        port.flush()?;
        debug!("TX {}B: {}", data.len(), protocol::format_hex(data));
        Ok(())
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        let port = self.port_mut()?;
        let mut buf = vec![0u8; n];
        let got = Read::read(port, &mut buf)?;
        buf.truncate(got);
        debug!("RX {}B: {}", got, protocol::format_hex(&buf));
        Ok(buf)
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        let port = self.port_mut()?;
        Ok(port.bytes_to_read()? as usize)
    }

    fn port_info(&self) -> &PortInfo {
        &self.info
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(port) = self.port.take() {
            info!("Serial closed: {}", self.info.path);
            drop(port);
        }
        Ok(())
    }
}

/// List serial ports known to the OS, as `(path, description)` pairs
pub fn list_ports() -> Result<Vec<(String, String)>, TransportError> {
    let ports = tokio_serial::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let description = match p.port_type {
                tokio_serial::SerialPortType::UsbPort(usb) => format!(
                    "USB {:04x}:{:04x} {}",
                    usb.vid,
                    usb.pid,
                    usb.product.unwrap_or_default()
                ),
                tokio_serial::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                tokio_serial::SerialPortType::PciPort => "PCI".to_string(),
                tokio_serial::SerialPortType::Unknown => "unknown".to_string(),
            };
            (p.port_name, description)
        })
        .collect())
}
