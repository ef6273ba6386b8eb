use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use inkshare_server::{AppState, Config, app};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (SocketAddr, Arc<AppState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let upload_dir = dir.path().to_str().expect("utf-8 path").to_string();
    let config = Config::try_parse_from(["inkshare-server", "--upload-dir", upload_dir.as_str()])
        .expect("config");
    let state = Arc::new(AppState::new(&config));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let router = app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    (addr, state, dir)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("connect");
    ws
}

async fn wait_for_peers(state: &AppState, count: usize) {
    timeout(Duration::from_secs(2), async {
        while state.relay.peer_count() != count {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("peers did not settle");
}

async fn next_text(client: &mut Client) -> String {
    let msg = timeout(Duration::from_secs(2), client.next())
        .await
        .expect("timed out")
        .expect("stream ended")
        .expect("ws error");
    msg.to_text().expect("text frame").to_string()
}

async fn silent(client: &mut Client) -> bool {
    timeout(Duration::from_millis(100), client.next()).await.is_err()
}

#[tokio::test]
async fn frames_reach_everyone_but_the_sender() {
    let (addr, state, _dir) = spawn_server().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let mut c = connect(addr).await;
    wait_for_peers(&state, 3).await;

    let frame = r#"{"event":"rectangle-live","data":{"x":10,"y":10,"width":40,"height":20}}"#;
    a.send(Message::text(frame)).await.expect("send");

    assert_eq!(next_text(&mut b).await, frame);
    assert_eq!(next_text(&mut c).await, frame);
    assert!(silent(&mut a).await);
}

#[tokio::test]
async fn sender_order_is_preserved() {
    let (addr, state, _dir) = spawn_server().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    wait_for_peers(&state, 2).await;

    for i in 0..20 {
        a.send(Message::text(format!("{{\"seq\":{}}}", i)))
            .await
            .expect("send");
    }
    for i in 0..20 {
        assert_eq!(next_text(&mut b).await, format!("{{\"seq\":{}}}", i));
    }
}

#[tokio::test]
async fn binary_frames_are_relayed_verbatim() {
    let (addr, state, _dir) = spawn_server().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    wait_for_peers(&state, 2).await;

    a.send(Message::binary(vec![0u8, 1, 2, 255]))
        .await
        .expect("send");
    let msg = timeout(Duration::from_secs(2), b.next())
        .await
        .expect("timed out")
        .expect("stream ended")
        .expect("ws error");
    match msg {
        Message::Binary(data) => assert_eq!(data.as_ref(), &[0u8, 1, 2, 255]),
        other => panic!("unexpected frame {:?}", other),
    }
}

#[tokio::test]
async fn disconnect_needs_no_cleanup_from_peers() {
    let (addr, state, _dir) = spawn_server().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let c = connect(addr).await;
    wait_for_peers(&state, 3).await;

    drop(c);
    wait_for_peers(&state, 2).await;

    a.send(Message::text("still here")).await.expect("send");
    assert_eq!(next_text(&mut b).await, "still here");
}
