use crate::constants::*;
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("Write failed: {0}")]
    Write(#[source] io::Error),
    #[error("Read failed: {0}")]
    Read(#[source] io::Error),
    #[error(
        "Short read: expected {expected_len} bytes but got {actual_len}. Raw data: {raw_data:02x?}"
    )]
    ShortRead {
        expected_len: usize,
        actual_len: usize,
        raw_data: Vec<u8>,
    },
}

/// Byte channel to the controller board.
///
/// `read` must return exactly `len` bytes or fail; a timeout before the
/// reply is complete is reported as [`TransportError::ShortRead`].
pub trait Transport: Send + 'static {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
    fn read(&mut self, len: usize) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, TransportError> {
        (**self).read(len)
    }
}

#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl SerialConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }
}

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        info!(
            "Opened {} at {} baud (timeout {:?})",
            config.port, config.baud_rate, config.timeout
        );
        Ok(SerialTransport { port })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(bytes).map_err(TransportError::Write)?;
        self.port.flush().map_err(TransportError::Write)
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;

        while filled < len {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    debug!("Timed out after {} of {} reply bytes", filled, len);
                    break;
                }
                Err(e) => return Err(TransportError::Read(e)),
            }
        }

        if filled < len {
            return Err(TransportError::ShortRead {
                expected_len: len,
                actual_len: filled,
                raw_data: buf[..filled].to_vec(),
            });
        }

        Ok(buf)
    }
}
