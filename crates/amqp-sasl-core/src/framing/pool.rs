use std::ops::{Deref, DerefMut};
use std::sync::{Arc, OnceLock};

use bytes::BytesMut;
use parking_lot::Mutex;
use zeroize::Zeroize;

/// Pool of scratch buffers for frame emission.
///
/// A buffer is held by exactly one [`PooledBuf`] at a time and goes back
/// to the pool when the guard drops, on success and error paths alike.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<BytesMut>>,
    max_idle: usize,
    buf_capacity: usize,
}

impl BufferPool {
    pub const DEFAULT_MAX_IDLE: usize = 16;

    // Handshake frames are small; SASL peers must accept 512-byte frames.
    pub const DEFAULT_BUF_CAPACITY: usize = 512;

    // Buffers that grew past this are dropped instead of pooled.
    const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

    pub fn new(max_idle: usize, buf_capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
            buf_capacity,
        }
    }

    /// Process-wide pool shared by emitters that are not given their own.
    pub fn shared() -> Arc<BufferPool> {
        static SHARED: OnceLock<Arc<BufferPool>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(BufferPool::default())).clone()
    }

    pub fn acquire(self: &Arc<Self>) -> PooledBuf {
        let buf = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buf_capacity));

        PooledBuf {
            buf,
            pool: Arc::clone(self),
        }
    }

    /// Buffers currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn release(&self, mut buf: BytesMut) {
        // frames can carry credentials
        buf[..].zeroize();
        buf.clear();

        if buf.capacity() > Self::MAX_RETAINED_CAPACITY {
            return;
        }

        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_IDLE, Self::DEFAULT_BUF_CAPACITY)
    }
}

/// Exclusive handle on a pooled buffer.
#[derive(Debug)]
pub struct PooledBuf {
    buf: BytesMut,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuf {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        &self.buf
    }
}

impl DerefMut for PooledBuf {
    fn deref_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.release(buf);
    }
}
