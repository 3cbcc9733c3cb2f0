use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use amqp_sasl_core::{
    framing::{AmqpFrameIo, Frame, FrameIo, FrameLimits, FramingError},
    negotiation::NegotiationError,
    protocol::{Composite, SaslCode, SaslInit, SaslMechanisms, SaslOutcome, Symbol},
    MechanismRegistry, SaslError,
};
use amqp_sasl_net_tokio::{connect_tcp, NetError, SASL_PROTOCOL_HEADER};

// Minimal broker: header exchange, advertise, read one init, answer `code`.
async fn fake_broker(listener: TcpListener, advertised: Vec<&'static str>, code: SaslCode) -> Option<SaslInit> {
    let (mut stream, _) = listener.accept().await.unwrap();

    let mut header = [0u8; 8];
    stream.read_exact(&mut header).await.unwrap();
    assert_eq!(header, SASL_PROTOCOL_HEADER);
    stream.write_all(&SASL_PROTOCOL_HEADER).await.unwrap();

    let mut framer = AmqpFrameIo::new(stream, FrameLimits::DEFAULT);
    let mechanisms = SaslMechanisms {
        mechanisms: advertised.into_iter().map(Symbol::from).collect(),
    };
    framer
        .write_frame(&Frame::sasl(mechanisms.encode().unwrap()))
        .await
        .unwrap();

    let init = match framer.read_frame().await {
        Ok(frame) => SaslInit::decode(&frame.payload).unwrap(),
        Err(FramingError::UnexpectedEof) | Err(FramingError::Read(_)) => return None,
        Err(other) => panic!("unexpected broker read error: {other:?}"),
    };

    let outcome = SaslOutcome {
        code,
        additional_data: Vec::new(),
    };
    framer
        .write_frame(&Frame::sasl(outcome.encode().unwrap()))
        .await
        .unwrap();

    Some(init)
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

#[tokio::test]
async fn tcp_plain_negotiation_succeeds() {
    let (listener, addr) = bind().await;
    let broker = tokio::spawn(fake_broker(listener, vec!["ANONYMOUS", "PLAIN"], SaslCode::Ok));

    let registry = MechanismRegistry::new().with_plain("alice", "s3cret");
    let conn = connect_tcp(&addr, registry, FrameLimits::DEFAULT).await.unwrap();

    assert_eq!(conn.mechanism(), &Symbol::from("PLAIN"));
    assert_eq!(conn.outcome().code, SaslCode::Ok);

    let init = broker.await.unwrap().unwrap();
    assert_eq!(init.mechanism, "PLAIN");
    assert_eq!(init.initial_response, b"\x00alice\x00s3cret".to_vec());
    assert!(init.hostname.is_empty());

    let _stream: TcpStream = conn.into_inner();
}

#[tokio::test]
async fn tcp_rejected_credentials() {
    let (listener, addr) = bind().await;
    let broker = tokio::spawn(fake_broker(listener, vec!["PLAIN"], SaslCode::Auth));

    let registry = MechanismRegistry::new().with_plain("alice", "wrong");
    let err = match connect_tcp(&addr, registry, FrameLimits::DEFAULT).await {
        Ok(_) => panic!("expected rejection"),
        Err(e) => e,
    };

    match &err {
        NetError::Sasl(SaslError::Negotiation(NegotiationError::Rejected { code, .. })) => {
            assert_eq!(*code, SaslCode::Auth);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(!err.is_transient());

    broker.await.unwrap();
}

#[tokio::test]
async fn tcp_no_compatible_mechanism_sends_nothing() {
    let (listener, addr) = bind().await;
    let broker = tokio::spawn(fake_broker(listener, vec!["XOAUTH2"], SaslCode::Ok));

    let registry = MechanismRegistry::new().with_plain("alice", "s3cret");
    let err = match connect_tcp(&addr, registry, FrameLimits::DEFAULT).await {
        Ok(_) => panic!("expected no compatible mechanism"),
        Err(e) => e,
    };
    assert!(matches!(
        err,
        NetError::Sasl(SaslError::Negotiation(NegotiationError::NoCompatibleMechanism { .. }))
    ));

    // The client drops the socket without sending an init frame.
    assert!(broker.await.unwrap().is_none());
}

#[tokio::test]
async fn tcp_protocol_header_mismatch() {
    let (listener, addr) = bind().await;
    let broker = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut header = [0u8; 8];
        stream.read_exact(&mut header).await.unwrap();
        // plain AMQP header: this broker does not do SASL
        stream.write_all(b"AMQP\x00\x01\x00\x00").await.unwrap();
    });

    let registry = MechanismRegistry::new().with_plain("alice", "s3cret");
    let err = match connect_tcp(&addr, registry, FrameLimits::DEFAULT).await {
        Ok(_) => panic!("expected header mismatch"),
        Err(e) => e,
    };
    match err {
        NetError::ProtocolHeaderMismatch { got } => assert_eq!(&got, b"AMQP\x00\x01\x00\x00"),
        other => panic!("expected ProtocolHeaderMismatch, got {other:?}"),
    }

    broker.await.unwrap();
}
