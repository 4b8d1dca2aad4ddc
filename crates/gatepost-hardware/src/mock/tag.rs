//! Mock tag reader emitting scripted serial bytes.

use crate::{Result, traits::TagSource};
use gatepost_protocol::encode_frame;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Buffer size of the simulated serial line, in bytes.
const LINE_CAPACITY: usize = 1024;

/// Mock tag reader for testing and development.
///
/// Bytes queued through the [`MockTagReaderHandle`] come out of
/// [`TagSource::poll_byte`] one at a time, in order.
///
/// # Examples
///
/// ```
/// use gatepost_hardware::mock::MockTagReader;
/// use gatepost_hardware::traits::TagSource;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> gatepost_hardware::Result<()> {
///     let (mut reader, handle) = MockTagReader::new();
///
///     handle.send_bytes(&[0x02, b'0']).await?;
///
///     assert_eq!(reader.poll_byte().await?, Some(0x02));
///     assert_eq!(reader.poll_byte().await?, Some(b'0'));
///     assert_eq!(reader.poll_byte().await?, None);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTagReader {
    /// Channel receiver for line bytes
    line_rx: mpsc::Receiver<u8>,
}

impl MockTagReader {
    /// Create a new mock reader and the handle that feeds it.
    pub fn new() -> (Self, MockTagReaderHandle) {
        let (line_tx, line_rx) = mpsc::channel(LINE_CAPACITY);
        (Self { line_rx }, MockTagReaderHandle { line_tx })
    }
}

impl TagSource for MockTagReader {
    async fn poll_byte(&mut self) -> Result<Option<u8>> {
        match self.line_rx.try_recv() {
            Ok(byte) => Ok(Some(byte)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(crate::HardwareError::disconnected(
                "Tag reader line closed",
            )),
        }
    }
}

/// Handle for feeding a mock tag reader.
#[derive(Debug, Clone)]
pub struct MockTagReaderHandle {
    /// Channel sender for line bytes
    line_tx: mpsc::Sender<u8>,
}

impl MockTagReaderHandle {
    /// Queue raw bytes on the simulated serial line.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.line_tx
                .send(byte)
                .await
                .map_err(|_| crate::HardwareError::disconnected("Tag reader line closed"))?;
        }
        Ok(())
    }

    /// Queue the complete frame the reader emits for `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present_tag(&self, tag: u32) -> Result<()> {
        self.send_bytes(&encode_frame(tag)).await
    }
}
