use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{self, AsyncReadExt};

use crate::framing::{BufferPool, Frame, FrameEmitter, FrameObserver, FramingError};

#[derive(Default)]
struct RecordingObserver {
    outbound: Mutex<Vec<Frame>>,
}

impl FrameObserver for RecordingObserver {
    fn on_outbound(&self, frame: &Frame) {
        self.outbound.lock().push(frame.clone());
    }

    fn on_inbound(&self, _frame: &Frame) {}
}

#[tokio::test]
async fn emit_writes_header_and_body() {
    let pool = Arc::new(BufferPool::new(4, 64));
    let emitter = FrameEmitter::new(pool.clone());
    let (mut a, mut b) = io::duplex(1024);

    emitter.emit(&mut a, &Frame::sasl(b"abc".to_vec())).await.unwrap();

    let mut wire = [0u8; 11];
    b.read_exact(&mut wire).await.unwrap();
    assert_eq!(&wire[..8], &[0, 0, 0, 11, 2, 1, 0, 0]);
    assert_eq!(&wire[8..], b"abc");
}

#[tokio::test]
async fn buffer_returns_to_pool_after_success_and_failure() {
    let pool = Arc::new(BufferPool::new(4, 64));
    let emitter = FrameEmitter::new(pool.clone());
    assert_eq!(pool.idle(), 0);

    let (mut a, _b) = io::duplex(1024);
    emitter.emit(&mut a, &Frame::sasl(vec![1; 16])).await.unwrap();
    assert_eq!(pool.idle(), 1);

    let (mut closed, peer) = io::duplex(16);
    drop(peer);
    let err = emitter.emit(&mut closed, &Frame::sasl(vec![2; 16])).await.unwrap_err();
    assert!(matches!(err, FramingError::Write(_)));
    assert_eq!(pool.idle(), 1);
}

#[test]
fn released_buffers_are_cleared() {
    let pool = Arc::new(BufferPool::new(1, 32));
    {
        let mut buf = pool.acquire();
        buf.extend_from_slice(b"\x00alice\x00s3cret");
    }
    let buf = pool.acquire();
    assert!(buf.is_empty());
    assert!(buf.capacity() >= 13);
}

#[test]
fn pool_keeps_at_most_max_idle() {
    let pool = Arc::new(BufferPool::new(2, 8));
    let held: Vec<_> = (0..4).map(|_| pool.acquire()).collect();
    drop(held);
    assert_eq!(pool.idle(), 2);
}

#[tokio::test]
async fn observer_sees_outbound_frames() {
    let observer = Arc::new(RecordingObserver::default());
    let emitter = FrameEmitter::new(Arc::new(BufferPool::default())).with_observer(observer.clone());
    let (mut a, _b) = io::duplex(1024);

    let frame = Frame::sasl(vec![9, 9]);
    emitter.emit(&mut a, &frame).await.unwrap();

    assert_eq!(observer.outbound.lock().as_slice(), &[frame]);
}
