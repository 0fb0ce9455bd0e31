//! Manager link tests against a scripted fake manager on a real socket.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use relay_core::{
    decode_payload, encode_payload, read_frame, write_frame, FrameHeader, Operation, Payload,
    RegisterPayload, ResourceType, Status, MAX_PAYLOAD,
};
use relay_server::{LinkState, ManagerLink};

const FAST_BACKOFF: Duration = Duration::from_millis(50);

async fn wait_for_state(link: &ManagerLink, wanted: LinkState) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if link.state().await == wanted {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("link never reached {wanted:?}"));
}

/// Reads the register request off a fresh manager-side connection and
/// returns the announced payload.
async fn expect_register(stream: &mut TcpStream) -> RegisterPayload {
    let (header, body) = read_frame(stream, MAX_PAYLOAD)
        .await
        .unwrap()
        .expect("register expected");
    assert_eq!(header.resource_type(), Some(ResourceType::System));
    assert_eq!(header.operation_kind(), Some(Operation::Create));
    assert!(!header.is_ack);
    let Payload::Register(announced) =
        decode_payload(ResourceType::System, Operation::Create, &body).unwrap()
    else {
        panic!("register payload expected");
    };
    announced
}

async fn send_register_ack(stream: &mut TcpStream, server_id: u8) {
    let header = FrameHeader::ack(ResourceType::System, Operation::Create, Status::Ok);
    let body = encode_payload(&Payload::Register(RegisterPayload {
        server_ip: 0,
        server_id,
    }));
    write_frame(stream, &header, &body).await.unwrap();
}

#[tokio::test]
async fn test_link_registers_and_adopts_assigned_id() {
    let manager = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let link = ManagerLink::new(
        manager.local_addr().unwrap().to_string(),
        Ipv4Addr::new(10, 0, 0, 2),
        FAST_BACKOFF,
    );
    tokio::spawn(Arc::clone(&link).run());

    let (mut stream, _) = manager.accept().await.unwrap();
    let announced = expect_register(&mut stream).await;
    assert_eq!(announced.server_id, 0, "first registration announces id 0");
    assert_eq!(announced.ip(), Ipv4Addr::new(10, 0, 0, 2));

    send_register_ack(&mut stream, 7).await;

    wait_for_state(&link, LinkState::Registered).await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while link.server_id() != 7 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("assigned id never adopted");
}

#[tokio::test]
async fn test_activation_is_acknowledged_with_address_and_id() {
    let manager = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let link = ManagerLink::new(
        manager.local_addr().unwrap().to_string(),
        Ipv4Addr::new(10, 0, 0, 2),
        FAST_BACKOFF,
    );
    tokio::spawn(Arc::clone(&link).run());

    let (mut stream, _) = manager.accept().await.unwrap();
    expect_register(&mut stream).await;
    send_register_ack(&mut stream, 7).await;

    // Activate the server.
    let header = FrameHeader::request(ResourceType::System, Operation::Update);
    let body = encode_payload(&Payload::Register(RegisterPayload {
        server_ip: 0,
        server_id: 7,
    }));
    write_frame(&mut stream, &header, &body).await.unwrap();

    let (ack, ack_body) = read_frame(&mut stream, MAX_PAYLOAD)
        .await
        .unwrap()
        .expect("activation ack expected");
    assert!(ack.is_ack);
    assert_eq!(ack.resource_type(), Some(ResourceType::System));
    assert_eq!(ack.operation_kind(), Some(Operation::Update));
    let Payload::Register(confirmed) =
        decode_payload(ResourceType::System, Operation::Update, &ack_body).unwrap()
    else {
        panic!("register payload expected");
    };
    assert_eq!(confirmed.server_id, 7);
    assert_eq!(confirmed.ip(), Ipv4Addr::new(10, 0, 0, 2));

    wait_for_state(&link, LinkState::Active).await;
}

#[tokio::test]
async fn test_link_reconnects_and_reannounces_assigned_id() {
    let manager = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let link = ManagerLink::new(
        manager.local_addr().unwrap().to_string(),
        Ipv4Addr::LOCALHOST,
        FAST_BACKOFF,
    );
    tokio::spawn(Arc::clone(&link).run());

    // First connection: assign 7, then drop the link.
    let (mut stream, _) = manager.accept().await.unwrap();
    expect_register(&mut stream).await;
    send_register_ack(&mut stream, 7).await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while link.server_id() != 7 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("assigned id never adopted");
    drop(stream);

    // The link reconnects on its own and re-announces the id it holds.
    let (mut stream, _) = manager.accept().await.unwrap();
    let announced = expect_register(&mut stream).await;
    assert_eq!(announced.server_id, 7);
}

#[tokio::test]
async fn test_unknown_frame_does_not_kill_the_link() {
    let manager = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let link = ManagerLink::new(
        manager.local_addr().unwrap().to_string(),
        Ipv4Addr::LOCALHOST,
        FAST_BACKOFF,
    );
    tokio::spawn(Arc::clone(&link).run());

    let (mut stream, _) = manager.accept().await.unwrap();
    expect_register(&mut stream).await;

    // Something a newer manager might send.
    let odd = FrameHeader::request(ResourceType::Channels, Operation::Read);
    write_frame(&mut stream, &odd, &[]).await.unwrap();

    // The link must still be serving: an activation after the odd frame is
    // answered normally.
    let header = FrameHeader::request(ResourceType::System, Operation::Update);
    let body = encode_payload(&Payload::Register(RegisterPayload {
        server_ip: 0,
        server_id: 3,
    }));
    write_frame(&mut stream, &header, &body).await.unwrap();

    let (ack, _) = read_frame(&mut stream, MAX_PAYLOAD)
        .await
        .unwrap()
        .expect("activation ack expected");
    assert!(ack.is_ack);
    wait_for_state(&link, LinkState::Active).await;
}

#[tokio::test]
async fn test_forwarded_log_reaches_the_manager() {
    let manager = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let link = ManagerLink::new(
        manager.local_addr().unwrap().to_string(),
        Ipv4Addr::LOCALHOST,
        FAST_BACKOFF,
    );
    tokio::spawn(Arc::clone(&link).run());

    let (mut stream, _) = manager.accept().await.unwrap();
    expect_register(&mut stream).await;
    send_register_ack(&mut stream, 5).await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while link.server_id() != 5 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("assigned id never adopted");

    link.forward_log("[LOGIN]  user: alice").await;

    let (header, body) = read_frame(&mut stream, MAX_PAYLOAD)
        .await
        .unwrap()
        .expect("log frame expected");
    assert_eq!(header.resource_type(), Some(ResourceType::Log));
    assert_eq!(header.operation_kind(), Some(Operation::Create));
    let Payload::Log(log) = decode_payload(ResourceType::Log, Operation::Create, &body).unwrap()
    else {
        panic!("log payload expected");
    };
    assert_eq!(log.server_id, 5);
    assert_eq!(log.text, b"[LOGIN]  user: alice");
}

#[tokio::test]
async fn test_forward_log_is_skipped_while_disconnected() {
    // No manager behind this address; forwarding must return without error.
    let link = ManagerLink::new("127.0.0.1:1".to_string(), Ipv4Addr::LOCALHOST, FAST_BACKOFF);
    assert_eq!(link.state().await, LinkState::Disconnected);
    link.forward_log("dropped on the floor").await;
}
