use async_trait::async_trait;

use crate::framing::Frame;

/*
    Frame-level interface to the transport.
      - Implementations own the envelope encoding on the underlying stream.
      - Every read and write suspends until it completes; deadlines belong
        to whoever owns the stream.
*/
#[async_trait]
pub trait FrameIo: Send {
    async fn read_frame(&mut self) -> Result<Frame, FramingError>;
    async fn write_frame(&mut self, frame: &Frame) -> Result<(), FramingError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    #[error("unexpected EOF while reading a frame")]
    UnexpectedEof,

    #[error("frame too large: len={len}, max={max}")]
    FrameTooLarge { len: u32, max: u32 },

    #[error("malformed frame header: {0}")]
    MalformedHeader(String),

    #[error("unexpected frame type: expected {expected:#04x}, got {got:#04x}")]
    UnexpectedFrameType { expected: u8, got: u8 },

    #[error("transport read failed: {0}")]
    Read(String),

    #[error("transport write failed: {0}")]
    Write(String),
}

impl FramingError {
    /// Transport failures. Header and frame-type errors mean the peer does
    /// not speak this protocol and are never transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FramingError::UnexpectedEof | FramingError::Read(_) | FramingError::Write(_)
        )
    }
}
