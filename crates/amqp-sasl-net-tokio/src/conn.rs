use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use amqp_sasl_core::{
    framing::{AmqpFrameIo, FrameEmitter, FrameLimits, TracingObserver},
    protocol::{SaslOutcome, Symbol},
    MechanismRegistry, Negotiator,
};

use crate::error::NetError;

/// Protocol header announcing the SASL layer: "AMQP", id 3, version 1.0.0.
pub const SASL_PROTOCOL_HEADER: [u8; 8] = *b"AMQP\x03\x01\x00\x00";

// A stream that has completed SASL authentication.
// The next layer (AMQP open) takes the stream back with into_inner.
pub struct AuthenticatedConn<RW> {
    framer: AmqpFrameIo<RW>,
    mechanism: Symbol,
    outcome: SaslOutcome,
}

impl<RW> AuthenticatedConn<RW> {
    pub fn mechanism(&self) -> &Symbol {
        &self.mechanism
    }

    pub fn outcome(&self) -> &SaslOutcome {
        &self.outcome
    }

    pub fn into_inner(self) -> RW {
        self.framer.into_inner()
    }
}

// Client-side connect + SASL negotiation over TCP.
pub async fn connect_tcp(
    addr: &str,
    registry: MechanismRegistry,
    limits: FrameLimits,
) -> Result<AuthenticatedConn<TcpStream>, NetError> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    negotiate(stream, registry, limits).await
}

// Run the SASL layer on an already connected stream.
pub async fn negotiate<RW>(
    mut io: RW,
    registry: MechanismRegistry,
    limits: FrameLimits,
) -> Result<AuthenticatedConn<RW>, NetError>
where
    RW: AsyncRead + AsyncWrite + Unpin + Send,
{
    exchange_protocol_header(&mut io).await?;

    let emitter = FrameEmitter::default().with_observer(Arc::new(TracingObserver));
    let mut framer = AmqpFrameIo::with_emitter(io, limits, emitter);

    let mut negotiator = Negotiator::new(registry);
    let outcome = negotiator.run(&mut framer).await?;
    let mechanism = negotiator.selected_mechanism().cloned().unwrap_or_default();

    Ok(AuthenticatedConn {
        framer,
        mechanism,
        outcome,
    })
}

async fn exchange_protocol_header<RW>(io: &mut RW) -> Result<(), NetError>
where
    RW: AsyncRead + AsyncWrite + Unpin + Send,
{
    io.write_all(&SASL_PROTOCOL_HEADER).await?;
    io.flush().await?;

    let mut got = [0u8; 8];
    io.read_exact(&mut got).await?;
    if got != SASL_PROTOCOL_HEADER {
        return Err(NetError::ProtocolHeaderMismatch { got });
    }

    debug!("sasl protocol header accepted");
    Ok(())
}
