use tracing::debug;
use zeroize::Zeroize;

use crate::{
    framing::{Frame, FrameIo, FramingError, FRAME_TYPE_SASL},
    negotiation::NegotiationError,
    protocol::{descriptor_name, Composite, SaslChallenge, SaslFrameBody, Symbol},
};

/// What a mechanism step may touch: the connection's frame I/O and the
/// name it was selected under. Borrowed from the driver for one step.
pub struct StepContext<'a> {
    io: &'a mut dyn FrameIo,
    mechanism: &'a Symbol,
}

impl<'a> StepContext<'a> {
    pub fn new(io: &'a mut dyn FrameIo, mechanism: &'a Symbol) -> Self {
        Self { io, mechanism }
    }

    pub fn mechanism(&self) -> &Symbol {
        self.mechanism
    }

    /// Encode `body`, frame it for the SASL phase and write it.
    pub async fn send(&mut self, body: &SaslFrameBody) -> Result<(), NegotiationError> {
        send_body(self.io, body).await
    }

    pub async fn recv_challenge(&mut self) -> Result<SaslChallenge, NegotiationError> {
        recv(self.io).await
    }
}

pub(crate) async fn send_body(io: &mut dyn FrameIo, body: &SaslFrameBody) -> Result<(), NegotiationError> {
    let mut frame = Frame::sasl(body.encode()?);
    debug!(
        performative = descriptor_name(body.descriptor()).unwrap_or("unknown"),
        len = frame.payload.len(),
        "sending sasl frame"
    );

    let written = io.write_frame(&frame).await;
    frame.payload.zeroize();
    written.map_err(NegotiationError::from)
}

/// Read the next frame and decode it as `T`. Channel numbers are ignored
/// for SASL frames.
pub(crate) async fn recv<T: Composite>(io: &mut dyn FrameIo) -> Result<T, NegotiationError> {
    let frame = io.read_frame().await?;
    if frame.frame_type != FRAME_TYPE_SASL {
        return Err(FramingError::UnexpectedFrameType {
            expected: FRAME_TYPE_SASL,
            got: frame.frame_type,
        }
        .into());
    }

    debug!(
        performative = descriptor_name(T::DESCRIPTOR).unwrap_or("unknown"),
        len = frame.payload.len(),
        "received sasl frame"
    );
    Ok(T::decode(&frame.payload)?)
}
