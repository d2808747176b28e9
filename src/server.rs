use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, WebSocketUpgrade,
    },
    handler::Handler,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::events::{decode, encode, Decoded, Event};
use crate::manager::ConnectionManager;

pub fn app(manager: Arc<ConnectionManager>) -> Router {
    Router::new()
        .route("/ws/:username", get(ws_handler))
        .fallback(fallback.into_service())
        .layer(Extension(manager))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(username): Path<String>,
    Extension(manager): Extension<Arc<ConnectionManager>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, username, manager))
}

async fn handle_socket(socket: WebSocket, username: String, manager: Arc<ConnectionManager>) {
    let (mut sink, mut stream) = socket.split();

    // per-socket forwarding task so the manager can hand out plain senders
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    let id = manager.register(&username, tx).await;

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => relay_frame(&text, &manager).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(username = %username, error = %err, "websocket error");
                break;
            }
        }
    }

    manager.unregister(id).await;
    let left = encode(&Event::Notification {
        message: format!("{username} left the player!"),
    });
    manager.broadcast(&left).await;

    send_task.abort();
}

/// Relays one inbound frame. Recognized events are re-encoded canonically
/// and recorded; `pause` frames are recorded for replay but not rebroadcast.
/// Frames with an unrecognized type are relayed verbatim; malformed frames
/// are dropped.
async fn relay_frame(text: &str, manager: &ConnectionManager) {
    match decode(text) {
        Decoded::Event(event) => {
            let canonical = encode(&event);
            manager.append_history(canonical.clone()).await;
            if !matches!(event, Event::Pause) {
                manager.broadcast(&canonical).await;
            }
        }
        Decoded::UnknownType(kind) => {
            debug!(kind = %kind, "relaying frame of unrecognized type");
            manager.append_history(text.to_owned()).await;
            manager.broadcast(text).await;
        }
        Decoded::Malformed => {
            warn!(frame = text, "dropping malformed frame");
        }
    }
}

async fn fallback(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("No route for {}", uri))
}
