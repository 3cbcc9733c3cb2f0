use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::framing::{Frame, FrameEmitter, FrameIo, FrameLimits, FramingError, FRAME_HEADER_LEN};

/// AMQP framing over an async byte stream.
///
/// Frame format:
///   [u32 size][u8 doff][u8 type][u16 channel][extended header][body]
/// `size` counts the whole frame; `doff` is the body offset in 4-byte words.
pub struct AmqpFrameIo<RW> {
    io: RW,
    limits: FrameLimits,
    emitter: FrameEmitter,
}

impl<RW> AmqpFrameIo<RW> {
    pub fn new(io: RW, limits: FrameLimits) -> Self {
        Self::with_emitter(io, limits, FrameEmitter::default())
    }

    pub fn with_emitter(io: RW, limits: FrameLimits, emitter: FrameEmitter) -> Self {
        Self { io, limits, emitter }
    }

    pub fn get_mut(&mut self) -> &mut RW {
        &mut self.io
    }

    pub fn into_inner(self) -> RW {
        self.io
    }
}

/// Map std::io errors into the framing error taxonomy.
fn map_read_err(e: std::io::Error) -> FramingError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        FramingError::UnexpectedEof
    } else {
        FramingError::Read(e.to_string())
    }
}

#[async_trait]
impl<RW> FrameIo for AmqpFrameIo<RW>
where
    RW: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_frame(&mut self) -> Result<Frame, FramingError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        self.io.read_exact(&mut header).await.map_err(map_read_err)?;

        let size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        self.limits.validate_len(size)?;

        let body_offset = header[4] as usize * 4;
        if body_offset < FRAME_HEADER_LEN || body_offset > size as usize {
            return Err(FramingError::MalformedHeader(format!(
                "data offset {} outside frame of {size} bytes",
                header[4]
            )));
        }

        let mut rest = vec![0u8; size as usize - FRAME_HEADER_LEN];
        self.io.read_exact(&mut rest).await.map_err(map_read_err)?;

        // drop the extended header, if any
        let payload = rest.split_off(body_offset - FRAME_HEADER_LEN);

        let frame = Frame {
            frame_type: header[5],
            channel: u16::from_be_bytes([header[6], header[7]]),
            payload,
        };

        if let Some(observer) = self.emitter.observer() {
            observer.on_inbound(&frame);
        }
        Ok(frame)
    }

    async fn write_frame(&mut self, frame: &Frame) -> Result<(), FramingError> {
        self.limits.validate_len(frame.encoded_len()?)?;
        self.emitter.emit(&mut self.io, frame).await
    }
}
