use crate::framing::{AmqpFrameIo, Frame, FrameIo, FrameLimits, FramingError, FRAME_TYPE_AMQP, FRAME_TYPE_SASL};
use tokio::io::{self, AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn round_trip_single_frame() {
    let (a, b) = io::duplex(4096);

    let mut writer = AmqpFrameIo::new(a, FrameLimits::DEFAULT);
    let mut reader = AmqpFrameIo::new(b, FrameLimits::DEFAULT);

    let frame = Frame::sasl(b"sasl body".to_vec());

    writer.write_frame(&frame).await.unwrap();
    let got = reader.read_frame().await.unwrap();

    assert_eq!(got, frame);
    assert_eq!(got.frame_type, FRAME_TYPE_SASL);
    assert_eq!(got.channel, 0);
}

#[tokio::test]
async fn writes_standard_header() {
    let (a, mut b) = io::duplex(4096);
    let mut writer = AmqpFrameIo::new(a, FrameLimits::DEFAULT);

    writer.write_frame(&Frame::sasl(vec![0xaa, 0xbb])).await.unwrap();

    let mut wire = [0u8; 10];
    b.read_exact(&mut wire).await.unwrap();
    assert_eq!(wire, [0, 0, 0, 10, 2, FRAME_TYPE_SASL, 0, 0, 0xaa, 0xbb]);
}

#[tokio::test]
async fn skips_extended_header() {
    let (mut a, b) = io::duplex(4096);
    let mut reader = AmqpFrameIo::new(b, FrameLimits::DEFAULT);

    // doff = 3: four bytes of extended header before the body
    a.write_all(&[0, 0, 0, 14, 3, FRAME_TYPE_AMQP, 0, 5, 9, 9, 9, 9, 0x01, 0x02])
        .await
        .unwrap();

    let frame = reader.read_frame().await.unwrap();
    assert_eq!(frame.frame_type, FRAME_TYPE_AMQP);
    assert_eq!(frame.channel, 5);
    assert_eq!(frame.payload, vec![0x01, 0x02]);
}

#[tokio::test]
async fn rejects_oversized_frame_length() {
    let (mut a, b) = io::duplex(4096);

    // Send a crafted size that exceeds the receiver's max.
    let mut reader = AmqpFrameIo::new(b, FrameLimits { max_frame_len: 16 });

    a.write_all(&[0, 0, 0, 17, 2, FRAME_TYPE_SASL, 0, 0]).await.unwrap();
    a.write_all(&[0u8; 9]).await.unwrap();
    a.flush().await.unwrap();

    let err = reader.read_frame().await.unwrap_err();
    match err {
        FramingError::FrameTooLarge { len, max } => {
            assert_eq!(len, 17);
            assert_eq!(max, 16);
        }
        other => panic!("expected FrameTooLarge, got {other:?}"),
    }
}

#[tokio::test]
async fn rejects_bad_data_offset() {
    let (mut a, b) = io::duplex(4096);
    let mut reader = AmqpFrameIo::new(b, FrameLimits::DEFAULT);

    a.write_all(&[0, 0, 0, 8, 1, FRAME_TYPE_SASL, 0, 0]).await.unwrap();

    let err = reader.read_frame().await.unwrap_err();
    assert!(matches!(err, FramingError::MalformedHeader(_)));
}

#[tokio::test]
async fn unexpected_eof_reading_header() {
    let (mut a, b) = io::duplex(4096);
    let mut reader = AmqpFrameIo::new(b, FrameLimits::DEFAULT);

    // Write only part of the header then drop the writer side.
    a.write_all(&[0, 0]).await.unwrap();
    drop(a);

    let err = reader.read_frame().await.unwrap_err();
    assert!(matches!(err, FramingError::UnexpectedEof));
}

#[tokio::test]
async fn unexpected_eof_reading_body() {
    let (mut a, b) = io::duplex(4096);
    let mut reader = AmqpFrameIo::new(b, FrameLimits::DEFAULT);

    // Claim a 5 byte body, only send 2 then drop.
    a.write_all(&[0, 0, 0, 13, 2, FRAME_TYPE_SASL, 0, 0]).await.unwrap();
    a.write_all(&[1, 2]).await.unwrap();
    drop(a);

    let err = reader.read_frame().await.unwrap_err();
    assert!(matches!(err, FramingError::UnexpectedEof));
}

#[tokio::test]
async fn write_to_closed_peer_is_write_error() {
    let (a, b) = io::duplex(64);
    drop(b);

    let mut writer = AmqpFrameIo::new(a, FrameLimits::DEFAULT);
    let err = writer.write_frame(&Frame::sasl(vec![1, 2, 3])).await.unwrap_err();
    assert!(matches!(err, FramingError::Write(_)));
}
