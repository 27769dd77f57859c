//! Per-client WebSocket connection task.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use medlink_hub::{Hub, Notification};

/// Drive one client connection to completion.
///
/// Registers with the hub, then runs two halves concurrently: an outbound
/// loop delivering queued notifications to the socket and an inbound loop
/// draining whatever the client sends. The connection ends when either half
/// stops, and teardown releases only this connection's registration so a
/// replacement that registered in the meantime is left alone.
pub async fn serve_connection(hub: Hub, user_id: u64, socket: WebSocket) {
    let registration = match hub.register(user_id).await {
        Ok(registration) => registration,
        Err(e) => {
            warn!(user_id, error = %e, "registration failed, closing socket");
            let mut socket = socket;
            let _ = socket.close().await;
            return;
        }
    };
    let token = registration.token;
    info!(user_id, "client connected");

    let (sink, stream) = socket.split();
    let mut outbound = tokio::spawn(outbound_loop(registration.queue, sink));

    tokio::select! {
        // Client hung up (or errored): stop delivering.
        _ = inbound_loop(stream) => {
            outbound.abort();
            let _ = outbound.await;
        }
        // Queue closed (evicted, superseded, or disconnected) or the socket
        // rejected a write; nothing left to deliver.
        _ = &mut outbound => {}
    }

    if let Err(e) = hub.release(user_id, token).await {
        debug!(user_id, error = %e, "hub gone during teardown");
    }
    info!(user_id, "client disconnected");
}

/// Deliver queued notifications until the queue closes or the socket fails.
async fn outbound_loop(
    mut queue: mpsc::Receiver<Notification>,
    mut sink: SplitSink<WebSocket, Message>,
) {
    while let Some(notification) = queue.recv().await {
        let text = match serde_json::to_string(&notification) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode notification, skipping");
                continue;
            }
        };
        if sink.send(Message::Text(text.into())).await.is_err() {
            debug!("socket write failed, stopping delivery");
            return;
        }
    }
    // Queue closed: the hub evicted or replaced us. Say goodbye properly.
    let _ = sink.send(Message::Close(None)).await;
}

/// Drain inbound frames until the client closes or the stream errors.
///
/// Clients have nothing to say on this channel; frames are consumed so the
/// protocol keeps flowing (ping/pong in particular) and otherwise ignored.
async fn inbound_loop(mut stream: SplitStream<WebSocket>) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Close(_)) => {
                debug!("client sent close");
                return;
            }
            Ok(other) => {
                debug!(frame = ?other, "ignoring inbound frame");
            }
            Err(e) => {
                debug!(error = %e, "socket read failed");
                return;
            }
        }
    }
}
