//! Tag reader attached to a serial port.

use gatepost_hardware::{HardwareError, Result, traits::TagSource};
use serialport::SerialPort;
use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::time::Duration;
use tracing::{debug, info, trace};

/// Bytes pulled from the port in one read.
const READ_CHUNK: usize = 64;

/// Read timeout for the port. Reads only happen when bytes are pending, so
/// this merely bounds a read racing with a line glitch.
const PORT_TIMEOUT: Duration = Duration::from_millis(10);

/// Serial line settings of the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialTagReaderConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub port: String,

    /// Line speed; the common reader modules run at 9600 8N1.
    pub baud_rate: u32,
}

impl Default for SerialTagReaderConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
        }
    }
}

/// A byte source that can tell how much input is waiting.
///
/// Lets the reader check for input without blocking.
pub trait PendingRead: Read + Send {
    /// Number of bytes that can be read right now.
    fn pending(&self) -> std::io::Result<usize>;
}

impl PendingRead for Box<dyn SerialPort> {
    fn pending(&self) -> std::io::Result<usize> {
        self.bytes_to_read()
            .map(|n| n as usize)
            .map_err(std::io::Error::from)
    }
}

/// Tag reader on a serial line.
///
/// Bytes are read in small chunks when the driver reports pending input and
/// handed out one at a time through [`TagSource::poll_byte`].
pub struct SerialTagReader<P = Box<dyn SerialPort>> {
    port: P,
    buffer: VecDeque<u8>,
    device: String,
}

impl SerialTagReader {
    /// Open the configured port.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the port cannot be opened.
    pub fn open(config: &SerialTagReaderConfig) -> Result<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(PORT_TIMEOUT)
            .open()
            .map_err(|e| {
                debug!("Failed to open tag reader port {}: {}", config.port, e);
                HardwareError::disconnected(format!("{} ({})", config.port, e))
            })?;

        info!(
            "Tag reader opened on {} at {} baud",
            config.port, config.baud_rate
        );
        Ok(Self::with_port(port, &config.port))
    }
}

impl<P: PendingRead> SerialTagReader<P> {
    /// Wrap an already opened byte source.
    pub fn with_port(port: P, device: impl Into<String>) -> Self {
        Self {
            port,
            buffer: VecDeque::with_capacity(READ_CHUNK),
            device: device.into(),
        }
    }

    /// Name of the device this reader is attached to.
    pub fn device(&self) -> &str {
        &self.device
    }

    fn fill(&mut self) -> Result<()> {
        let pending = self.port.pending()?;
        if pending == 0 {
            return Ok(());
        }

        let mut chunk = [0u8; READ_CHUNK];
        let wanted = pending.min(READ_CHUNK);
        match self.port.read(&mut chunk[..wanted]) {
            Ok(0) => Err(HardwareError::disconnected(self.device.clone())),
            Ok(n) => {
                trace!("Read {} bytes from {}", n, self.device);
                self.buffer.extend(&chunk[..n]);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl<P: PendingRead> TagSource for SerialTagReader<P> {
    async fn poll_byte(&mut self) -> Result<Option<u8>> {
        if self.buffer.is_empty() {
            self.fill()?;
        }
        Ok(self.buffer.pop_front())
    }
}
