use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::framing::{BufferPool, Frame, FramingError};

/// Observation hook at the frame boundary, for diagnostics only.
pub trait FrameObserver: Send + Sync {
    fn on_outbound(&self, frame: &Frame);
    fn on_inbound(&self, frame: &Frame);
}

/// Logs frame headers at trace level. Bodies are never logged: a SASL
/// body can hold a cleartext password.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    fn log(direction: &'static str, frame: &Frame) {
        let header = frame
            .encode_header()
            .map(hex::encode)
            .unwrap_or_else(|_| "oversized".to_string());

        trace!(
            direction,
            frame_type = frame.frame_type,
            channel = frame.channel,
            body_len = frame.payload.len(),
            %header,
            "sasl frame"
        );
    }
}

impl FrameObserver for TracingObserver {
    fn on_outbound(&self, frame: &Frame) {
        Self::log("out", frame);
    }

    fn on_inbound(&self, frame: &Frame) {
        Self::log("in", frame);
    }
}

/// Wraps an encoded body in its frame envelope and writes it in one call.
#[derive(Clone)]
pub struct FrameEmitter {
    pool: Arc<BufferPool>,
    observer: Option<Arc<dyn FrameObserver>>,
}

impl FrameEmitter {
    pub fn new(pool: Arc<BufferPool>) -> Self {
        Self { pool, observer: None }
    }

    pub fn with_observer(mut self, observer: Arc<dyn FrameObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn observer(&self) -> Option<&Arc<dyn FrameObserver>> {
        self.observer.as_ref()
    }

    pub async fn emit<W>(&self, out: &mut W, frame: &Frame) -> Result<(), FramingError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let header = frame.encode_header()?;

        let mut buf = self.pool.acquire();
        buf.reserve(header.len() + frame.payload.len());
        buf.extend_from_slice(&header);
        buf.extend_from_slice(&frame.payload);

        if let Some(observer) = &self.observer {
            observer.on_outbound(frame);
        }

        out.write_all(&buf).await.map_err(map_write_err)?;
        out.flush().await.map_err(map_write_err)?;
        Ok(())
    }
}

impl Default for FrameEmitter {
    fn default() -> Self {
        Self::new(BufferPool::shared())
    }
}

impl fmt::Debug for FrameEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameEmitter")
            .field("pool", &self.pool)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

fn map_write_err(e: std::io::Error) -> FramingError {
    FramingError::Write(e.to_string())
}
