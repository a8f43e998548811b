//! WebSocket connection loop for the headless client.
//!
//! DESIGN
//! ======
//! A single task owns the socket and the [`Session`]. It waits on two
//! triggers at once: the next server message, and the next scripted input
//! event. Each server message fully replaces the session snapshot and is
//! reported immediately; each input event passes the session's open-transport
//! gate before it is encoded and sent. Nothing is queued or retried, and a
//! closed socket ends the loop (no reconnection).

use std::io::Write;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use protocol::{InputEvent, Session, Snapshot};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::ClientError;

#[cfg(test)]
#[path = "net_test.rs"]
mod net_test;

/// How the watch loop reports and when it stops.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Print each snapshot as one JSON object per line instead of a summary line.
    pub json: bool,
    /// Stop after this many decoded snapshots.
    pub max_snapshots: Option<u64>,
    /// Give up when the server stays silent this long.
    pub idle_timeout: Duration,
}

/// Totals for one connection, logged when the loop ends.
///
/// `rejected` is copied from [`Session::rejected`] when the loop finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub snapshots: u64,
    pub rejected: u64,
    pub sent: u64,
    pub dropped: u64,
}

/// Connect to `url` and run the watch loop until close, limit or idle timeout.
///
/// # Errors
///
/// Returns [`ClientError::WsConnect`] on handshake or socket failure,
/// [`ClientError::Timeout`] when the server goes quiet, and
/// [`ClientError::Io`] if writing a report fails.
pub async fn watch<W: Write>(
    url: &str,
    options: &WatchOptions,
    mut inputs: mpsc::Receiver<InputEvent>,
    out: &mut W,
) -> Result<Summary, ClientError> {
    let (mut stream, _) = connect_async(url)
        .await
        .map_err(|error| ClientError::WsConnect(Box::new(error)))?;

    let mut session = Session::new();
    session.opened();
    tracing::info!(%url, "connected");

    let mut summary = Summary::default();
    let mut inputs_open = true;
    let idle = tokio::time::sleep(options.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            () = &mut idle => return Err(ClientError::Timeout),

            message = stream.next() => {
                idle.as_mut().reset(Instant::now() + options.idle_timeout);

                let Some(message) = message else {
                    session.closed();
                    break;
                };
                match message.map_err(|error| ClientError::WsConnect(Box::new(error)))? {
                    Message::Binary(bytes) => match session.receive(&bytes) {
                        Ok(snapshot) => {
                            summary.snapshots += 1;
                            report(out, summary.snapshots, snapshot, options.json)?;
                            if options.max_snapshots.is_some_and(|limit| summary.snapshots >= limit) {
                                tracing::info!(limit = summary.snapshots, "snapshot limit reached");
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(%err, len = bytes.len(), "rejected snapshot");
                        }
                    },
                    Message::Close(frame) => {
                        tracing::info!(?frame, "server closed connection");
                        session.closed();
                        break;
                    }
                    _ => {}
                }
            }

            event = inputs.recv(), if inputs_open => {
                let Some(event) = event else {
                    inputs_open = false;
                    continue;
                };
                match outbound(&session, event) {
                    Some(bytes) => {
                        stream
                            .send(Message::Binary(bytes.into()))
                            .await
                            .map_err(|error| ClientError::WsConnect(Box::new(error)))?;
                        summary.sent += 1;
                        tracing::debug!(?event, "sent input");
                    }
                    None => {
                        summary.dropped += 1;
                        tracing::debug!(?event, "dropped input; transport not open");
                    }
                }
            }
        }
    }

    summary.rejected = session.rejected();
    if session.is_open() {
        if let Err(error) = stream.close(None).await {
            tracing::debug!(%error, "close handshake failed");
        }
    }

    Ok(summary)
}

/// Encode an input event if the session allows sending it.
fn outbound(session: &Session, event: InputEvent) -> Option<Vec<u8>> {
    match event {
        InputEvent::Key { key, pressed } => session.key_transition(key, pressed, false).map(Vec::from),
        InputEvent::Click { x, y } => session.click(x, y).map(Vec::from),
    }
}

/// Write one snapshot report line.
fn report<W: Write>(out: &mut W, seq: u64, snapshot: &Snapshot, json: bool) -> Result<(), ClientError> {
    if json {
        serde_json::to_writer(&mut *out, snapshot)?;
        writeln!(out)?;
        return Ok(());
    }

    let counts = [
        ("users", snapshot.count(protocol::EntityKind::User)),
        ("platforms", snapshot.count(protocol::EntityKind::Platform)),
        ("bullets", snapshot.count(protocol::EntityKind::Bullet)),
    ]
    .map(|(name, count)| format!("{name}={count}"))
    .join(" ");

    match snapshot.local_user() {
        Some(protocol::Entity::User { x, y, .. }) => {
            writeln!(out, "#{seq} {counts} self={} at ({x}, {y})", snapshot.local_entity_id)?;
        }
        _ => writeln!(out, "#{seq} {counts} self={} absent", snapshot.local_entity_id)?,
    }
    Ok(())
}
