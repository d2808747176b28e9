use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::events::{encode, Event};

struct Client {
    id: u64,
    username: String,
    sender: mpsc::UnboundedSender<Message>,
}

#[derive(Default)]
struct Inner {
    clients: Vec<Client>,
    history: Vec<String>,
}

/// Server-side registry of connected clients plus the frame history that is
/// replayed to newcomers. Usernames are not unique; clients are told apart
/// by the id handed out at registration.
pub struct ConnectionManager {
    inner: RwLock<Inner>,
    next_id: AtomicU64,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Admits a new client: replays the frame history to it, greets it, and
    /// tells everyone already present that it joined. Returns the id used to
    /// unregister later.
    pub async fn register(&self, username: &str, sender: mpsc::UnboundedSender<Message>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.write().await;

        for frame in &inner.history {
            let _ = sender.send(Message::Text(frame.clone()));
        }

        let welcome = encode(&Event::Notification {
            message: format!("Hello, {username}! Welcome to the player!"),
        });
        let _ = sender.send(Message::Text(welcome));

        let joined = encode(&Event::Notification {
            message: format!("{username} joined the player!"),
        });
        for client in &inner.clients {
            let _ = client.sender.send(Message::Text(joined.clone()));
        }

        inner.clients.push(Client {
            id,
            username: username.to_owned(),
            sender,
        });
        info!(username, id, "client connected");
        id
    }

    /// Removes the client; returns its username if it was still registered.
    pub async fn unregister(&self, id: u64) -> Option<String> {
        let mut inner = self.inner.write().await;
        let position = inner.clients.iter().position(|client| client.id == id)?;
        let client = inner.clients.remove(position);
        info!(username = %client.username, id, "client disconnected");
        Some(client.username)
    }

    /// Records a frame for replay to future clients.
    pub async fn append_history(&self, frame: String) {
        let mut inner = self.inner.write().await;
        debug!(frame = %frame, "frame recorded");
        inner.history.push(frame);
    }

    /// Sends the frame to every connected client, the original sender
    /// included.
    pub async fn broadcast(&self, frame: &str) {
        let inner = self.inner.read().await;
        for client in &inner.clients {
            let _ = client.sender.send(Message::Text(frame.to_owned()));
        }
        debug!(frame, clients = inner.clients.len(), "broadcast");
    }
}
