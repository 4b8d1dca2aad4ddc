//! R30x driver implementing the sensor contract.

use crate::packet::{Confirmation, DEFAULT_ADDRESS, HEAD_LEN, Instruction, Packet, PacketError};
use gatepost_core::constants::{MAX_TEMPLATE_ID, MIN_TEMPLATE_ID};
use gatepost_core::{BiometricMatch, TemplateId};
use gatepost_hardware::{BiometricSensor, Capture, FeatureSlot, HardwareError, Result, SlotStatus};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, trace, warn};

impl From<PacketError> for HardwareError {
    fn from(e: PacketError) -> Self {
        HardwareError::invalid_data(e.to_string())
    }
}

/// Driver settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct R30xConfig {
    /// Module address.
    pub address: u32,

    /// Module password, checked by [`R30x::handshake`].
    pub password: u32,

    /// How long to wait for each acknowledgement.
    pub reply_timeout: Duration,
}

impl Default for R30xConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            password: 0,
            reply_timeout: Duration::from_millis(2000),
        }
    }
}

/// Image held in the module's image buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct ImageBuffer(());

/// Features held in one of the module's character buffers.
#[derive(Debug, PartialEq, Eq)]
pub struct CharBuffer(FeatureSlot);

impl CharBuffer {
    pub fn slot(&self) -> FeatureSlot {
        self.0
    }
}

/// Model combined into the module's character buffers.
#[derive(Debug, PartialEq, Eq)]
pub struct ModelBuffer(());

/// Driver for an R30x fingerprint module.
///
/// Images, features and models never leave the module; the associated
/// types of [`BiometricSensor`] are tokens naming the module buffer that
/// holds them.
pub struct R30x<S> {
    stream: S,
    config: R30xConfig,
    /// Set when an exchange broke off and unread reply bytes may follow.
    out_of_sync: bool,
}

impl R30x<SerialStream> {
    /// Open the module on a serial port.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the port cannot be opened.
    pub fn open(path: &str, baud_rate: u32, config: R30xConfig) -> Result<Self> {
        let stream = tokio_serial::new(path, baud_rate)
            .open_native_async()
            .map_err(|e| HardwareError::disconnected(format!("{path} ({e})")))?;

        info!("Fingerprint module port {} opened at {} baud", path, baud_rate);
        Ok(Self::new(stream, config))
    }
}

impl<S> R30x<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Drive a module over an already open byte stream.
    pub fn new(stream: S, config: R30xConfig) -> Self {
        Self {
            stream,
            config,
            out_of_sync: false,
        }
    }

    /// Verify the module password.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::CommunicationError` when the module rejects
    /// the password, or any transport error.
    pub async fn handshake(&mut self) -> Result<()> {
        let password = self.config.password.to_be_bytes();
        let (code, _) = self.execute(Instruction::VfyPwd, &password).await?;

        if !code.is_ok() {
            return Err(HardwareError::communication(format!(
                "handshake refused: {code}"
            )));
        }

        info!("Fingerprint module at 0x{:08X} ready", self.config.address);
        Ok(())
    }

    /// Number of templates stored on the module.
    pub async fn template_count(&mut self) -> Result<u16> {
        let (code, data) = self.execute(Instruction::TemplateNum, &[]).await?;

        match (code, data.as_slice()) {
            (Confirmation::OK, [hi, lo, ..]) => Ok(u16::from_be_bytes([*hi, *lo])),
            (Confirmation::OK, _) => Err(HardwareError::invalid_data("short template count reply")),
            (code, _) => Err(HardwareError::communication(code.to_string())),
        }
    }

    /// Send one command and wait for its acknowledgement.
    async fn execute(
        &mut self,
        instruction: Instruction,
        params: &[u8],
    ) -> Result<(Confirmation, Vec<u8>)> {
        if self.out_of_sync {
            self.resync().await?;
        }

        let command = Packet::command(self.config.address, instruction, params);
        trace!("Sending {:?} to fingerprint module", instruction);

        self.stream.write_all(&command.encode()).await?;
        self.stream.flush().await?;

        let timeout = self.config.reply_timeout;
        let reply = match tokio::time::timeout(timeout, self.read_packet()).await {
            Ok(Ok(packet)) => packet,
            Ok(Err(e)) => {
                self.out_of_sync = true;
                return Err(e);
            }
            Err(_) => {
                warn!("No reply to {:?} after {}ms", instruction, timeout.as_millis());
                self.out_of_sync = true;
                return Err(HardwareError::timeout(timeout.as_millis() as u64));
            }
        };

        let (code, data) = reply.confirmation()?;
        if code == Confirmation::RECEIVE_ERROR {
            return Err(HardwareError::communication(format!(
                "module could not read {instruction:?}"
            )));
        }

        Ok((code, data.to_vec()))
    }

    /// Discard input until the line stays quiet for one reply timeout, so a
    /// late or half-read acknowledgement is not taken as the next reply.
    async fn resync(&mut self) -> Result<()> {
        let mut scratch = [0u8; 64];
        let mut discarded = 0usize;

        loop {
            let read = self.stream.read(&mut scratch);
            match tokio::time::timeout(self.config.reply_timeout, read).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) => return Err(e.into()),
            }
        }

        debug!("Discarded {} stale bytes from fingerprint module", discarded);
        self.out_of_sync = false;
        Ok(())
    }

    async fn read_packet(&mut self) -> Result<Packet> {
        let mut head = [0u8; HEAD_LEN];
        self.stream.read_exact(&mut head).await?;
        let (address, kind, remaining) = Packet::decode_head(&head)?;

        if address != self.config.address {
            return Err(PacketError::AddressMismatch {
                expected: self.config.address,
                received: address,
            }
            .into());
        }

        let mut body = vec![0u8; remaining];
        self.stream.read_exact(&mut body).await?;
        Ok(Packet::decode_body(address, kind, &body)?)
    }
}

impl<S> BiometricSensor for R30x<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    type Image = ImageBuffer;
    type Template = CharBuffer;
    type Model = ModelBuffer;

    async fn capture(&mut self) -> Result<Capture<ImageBuffer>> {
        let (code, _) = self.execute(Instruction::GenImg, &[]).await?;

        match code {
            Confirmation::OK => Ok(Capture::Image(ImageBuffer(()))),
            Confirmation::NO_FINGER => {
                trace!("No finger on sensor");
                Ok(Capture::NoFinger)
            }
            code => Err(HardwareError::capture(code.to_string())),
        }
    }

    async fn extract_features(
        &mut self,
        _image: ImageBuffer,
        slot: FeatureSlot,
    ) -> Result<CharBuffer> {
        let (code, _) = self.execute(Instruction::Img2Tz, &[slot.as_u8()]).await?;

        if !code.is_ok() {
            return Err(HardwareError::conversion(code.to_string()));
        }
        Ok(CharBuffer(slot))
    }

    async fn search(&mut self, template: &CharBuffer) -> Result<Option<BiometricMatch>> {
        let start = MIN_TEMPLATE_ID.to_be_bytes();
        let count = (MAX_TEMPLATE_ID - MIN_TEMPLATE_ID + 1).to_be_bytes();
        let params = [template.0.as_u8(), start[0], start[1], count[0], count[1]];

        let (code, data) = self.execute(Instruction::Search, &params).await?;

        match (code, data.as_slice()) {
            (Confirmation::OK, [page_hi, page_lo, score_hi, score_lo, ..]) => {
                let page = u16::from_be_bytes([*page_hi, *page_lo]);
                let template_id = TemplateId::new(page)
                    .map_err(|e| HardwareError::invalid_data(e.to_string()))?;
                let confidence = u16::from_be_bytes([*score_hi, *score_lo]);

                debug!("Template {} matched with score {}", template_id, confidence);
                Ok(Some(BiometricMatch {
                    template_id,
                    confidence,
                }))
            }
            (Confirmation::OK, _) => Err(HardwareError::invalid_data("short search reply")),
            (Confirmation::NOT_FOUND, _) => Ok(None),
            (code, _) => Err(HardwareError::search(code.to_string())),
        }
    }

    async fn build_model(
        &mut self,
        first: &CharBuffer,
        second: &CharBuffer,
    ) -> Result<ModelBuffer> {
        if first.0 == second.0 {
            return Err(HardwareError::build_model(
                "both templates are in the same buffer",
            ));
        }

        let (code, _) = self.execute(Instruction::RegModel, &[]).await?;
        if !code.is_ok() {
            return Err(HardwareError::build_model(code.to_string()));
        }
        Ok(ModelBuffer(()))
    }

    async fn store(&mut self, _model: ModelBuffer, id: TemplateId) -> Result<()> {
        let page = id.as_u16().to_be_bytes();
        let params = [FeatureSlot::One.as_u8(), page[0], page[1]];

        let (code, _) = self.execute(Instruction::Store, &params).await?;
        if !code.is_ok() {
            return Err(HardwareError::store(code.to_string()));
        }

        info!("Stored fingerprint template {}", id);
        Ok(())
    }

    /// Probes by loading the page into character buffer 1, which clobbers
    /// whatever features were there.
    async fn probe(&mut self, id: TemplateId) -> Result<SlotStatus> {
        let page = id.as_u16().to_be_bytes();
        let params = [FeatureSlot::One.as_u8(), page[0], page[1]];

        let (code, _) = self.execute(Instruction::LoadChar, &params).await?;
        match code {
            Confirmation::OK => Ok(SlotStatus::Occupied),
            Confirmation::READ_TEMPLATE_FAILED => Ok(SlotStatus::Free),
            code => Err(HardwareError::store(code.to_string())),
        }
    }
}
