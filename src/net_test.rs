use futures_util::{SinkExt, StreamExt};
use protocol::{Entity, InputEvent, Key, Snapshot, decode_input, encode_snapshot};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_async;

use super::*;

// =============================================================
// Helpers
// =============================================================

fn options() -> WatchOptions {
    WatchOptions { json: false, max_snapshots: None, idle_timeout: Duration::from_secs(5) }
}

fn frame(local: u8) -> Vec<u8> {
    encode_snapshot(&Snapshot::new(
        vec![
            Entity::Platform { sprite: 1, width: 50, height: 3, x: 70, y: 245 },
            Entity::User { sprite: 0, animation: 0, entity_id: local, width: 8, height: 8, x: 10, y: 20 },
        ],
        local,
    ))
}

/// Serve one client: push `messages`, wait for one upstream message, then close.
async fn serve_once(messages: Vec<Vec<u8>>) -> (String, oneshot::Receiver<Option<InputEvent>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (seen_tx, seen_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(tcp).await.expect("handshake");
        for bytes in messages {
            ws.send(Message::Binary(bytes.into())).await.expect("send");
        }
        let seen = match ws.next().await {
            Some(Ok(Message::Binary(bytes))) => decode_input(&bytes).ok(),
            _ => None,
        };
        seen_tx.send(seen).ok();
        ws.close(None).await.ok();
        while let Some(Ok(_)) = ws.next().await {}
    });

    (format!("ws://{addr}"), seen_rx)
}

// =============================================================
// Watch loop
// =============================================================

#[tokio::test]
async fn watch_reports_snapshots_and_forwards_input() {
    let (url, seen) = serve_once(vec![frame(4), vec![0x07, 0x00], frame(4)]).await;
    let (tx, rx) = mpsc::channel(4);
    tx.send(InputEvent::Key { key: Key::D, pressed: true }).await.expect("queue");
    drop(tx);

    let mut out = Vec::new();
    let summary = watch(&url, &options(), rx, &mut out).await.expect("watch");

    assert_eq!(summary, Summary { snapshots: 2, rejected: 1, sent: 1, dropped: 0 });
    assert_eq!(seen.await.expect("server"), Some(InputEvent::Key { key: Key::D, pressed: true }));

    let text = String::from_utf8(out).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "#1 users=1 platforms=1 bullets=0 self=4 at (10, 20)");
}

#[tokio::test]
async fn watch_stops_at_snapshot_limit() {
    let (url, _seen) = serve_once(vec![frame(1), frame(1), frame(1)]).await;
    let (_tx, rx) = mpsc::channel(1);

    let mut out = Vec::new();
    let opts = WatchOptions { max_snapshots: Some(2), ..options() };
    let summary = watch(&url, &opts, rx, &mut out).await.expect("watch");

    assert_eq!(summary.snapshots, 2);
}

#[tokio::test]
async fn watch_prints_json_lines() {
    let (url, _seen) = serve_once(vec![frame(9)]).await;
    let (_tx, rx) = mpsc::channel(1);

    let mut out = Vec::new();
    let opts = WatchOptions { json: true, max_snapshots: Some(1), ..options() };
    watch(&url, &opts, rx, &mut out).await.expect("watch");

    let text = String::from_utf8(out).expect("utf8");
    let decoded: Snapshot = serde_json::from_str(text.trim()).expect("json");
    assert_eq!(decoded.local_entity_id, 9);
    assert_eq!(decoded.len(), 2);
}

#[tokio::test]
async fn watch_times_out_on_silent_server() {
    let (url, _seen) = serve_once(Vec::new()).await;
    let (_tx, rx) = mpsc::channel(1);

    let mut out = Vec::new();
    let opts = WatchOptions { idle_timeout: Duration::from_millis(50), ..options() };
    let err = watch(&url, &opts, rx, &mut out).await.expect_err("silent");
    assert!(matches!(err, ClientError::Timeout));
}

#[tokio::test]
async fn watch_fails_when_nothing_listens() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let (_tx, rx) = mpsc::channel(1);
    let mut out = Vec::new();
    let err = watch(&format!("ws://{addr}"), &options(), rx, &mut out).await.expect_err("refused");
    assert!(matches!(err, ClientError::WsConnect(_)));
}

// =============================================================
// Helpers under test
// =============================================================

#[test]
fn outbound_drops_input_when_not_open() {
    let session = Session::new();
    assert_eq!(outbound(&session, InputEvent::Click { x: 1, y: 2 }), None);
}

#[test]
fn report_marks_absent_local_player() {
    let mut out = Vec::new();
    report(&mut out, 3, &Snapshot::new(Vec::new(), 5), false).expect("report");
    assert_eq!(String::from_utf8(out).expect("utf8"), "#3 users=0 platforms=0 bullets=0 self=5 absent\n");
}

#[tokio::test]
async fn rejected_count_comes_from_session() {
    let (url, _seen) = serve_once(vec![vec![0x07, 0x00], Vec::new()]).await;
    let (tx, rx) = mpsc::channel(1);
    tx.send(InputEvent::Click { x: 5, y: 6 }).await.expect("queue");
    drop(tx);

    let mut out = Vec::new();
    let summary = watch(&url, &options(), rx, &mut out).await.expect("watch");

    assert_eq!(summary, Summary { snapshots: 0, rejected: 2, sent: 1, dropped: 0 });
    assert!(out.is_empty());
}
