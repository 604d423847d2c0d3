//! Read/write pumps for a single group WebSocket connection.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::hub::Hub;
use crate::domain::{GroupId, SessionId};

/// A connection is considered dead if nothing arrives for this long.
/// Pong frames count, so the ping cadence below keeps healthy clients
/// alive.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Ping interval, 90% of the client timeout.
const PING_PERIOD: Duration = Duration::from_secs(54);

/// Runs both pumps until either side of the connection gives up, then
/// drops the session from the hub. The caller must have registered the
/// session and passes its queue receiver in.
pub async fn serve(
    socket: WebSocket,
    hub: std::sync::Arc<Hub>,
    group_id: GroupId,
    session_id: SessionId,
    rx: mpsc::Receiver<Utf8Bytes>,
) {
    let (ws_tx, ws_rx) = socket.split();

    let mut write_task = tokio::spawn(write_pump(ws_tx, rx));
    let mut read_task = tokio::spawn(read_pump(ws_rx));

    // Whichever pump exits first takes the whole connection down.
    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    hub.unregister(group_id, session_id);
    tracing::debug!(%group_id, %session_id, "ws session closed");
}

/// Drains the hub queue into the socket, pinging on an interval so an
/// idle but healthy client keeps feeding the read deadline. Exits when
/// the queue closes (eviction) or the socket rejects a write.
async fn write_pump(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Utf8Bytes>,
) {
    let mut ping = tokio::time::interval(PING_PERIOD);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it.
    ping.tick().await;

    loop {
        tokio::select! {
            queued = rx.recv() => {
                match queued {
                    Some(text) => {
                        if ws_tx.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    // Queue closed: the hub evicted this session.
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            _ = ping.tick() => {
                if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Consumes inbound frames under a rolling deadline. Clients have
/// nothing to say on this socket, so payloads are discarded; the pump
/// only exists to notice closes and dead peers.
async fn read_pump(mut ws_rx: SplitStream<WebSocket>) {
    loop {
        match tokio::time::timeout(CLIENT_TIMEOUT, ws_rx.next()).await {
            Err(_elapsed) => {
                tracing::debug!("ws read deadline expired");
                break;
            }
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) => break,
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(err))) => {
                tracing::debug!(error = %err, "ws read error");
                break;
            }
        }
    }
}
