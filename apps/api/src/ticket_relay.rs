//! WebSocket fan-out of ticket events to the shared tickets room.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use systicket_application::TicketEventPublisher;
use systicket_domain::TicketEvent;
use tokio::sync::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{Receiver, Sender, channel};
use tracing::debug;
use uuid::Uuid;

mod socket;

#[cfg(test)]
mod tests;

pub use socket::tickets_socket_handler;

/// The single room every ticket subscriber joins.
pub const TICKETS_ROOM: &str = "tickets-room";

/// Frames buffered per socket before further events are dropped for it.
pub const OUTBOUND_BUFFER: usize = 64;

/// Command a client sends over its socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    JoinTickets,
    LeaveTickets,
}

impl ClientCommand {
    /// Parses `{"event": "join-tickets"}` or the bare `join-tickets` text.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let name = match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(object)) => object
                .get("event")
                .and_then(Value::as_str)
                .map(str::to_owned)?,
            Ok(Value::String(name)) => name,
            _ => trimmed.to_owned(),
        };

        match name.as_str() {
            "join-tickets" => Some(Self::JoinTickets),
            "leave-tickets" => Some(Self::LeaveTickets),
            _ => None,
        }
    }
}

struct Connection {
    user_id: Uuid,
    sender: Sender<String>,
    joined: bool,
}

/// Registry of open sockets and their room membership.
#[derive(Clone, Default)]
pub struct TicketRelay {
    connections: Arc<Mutex<HashMap<Uuid, Connection>>>,
}

impl TicketRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a socket and returns its id with the receiver of its outbound frames.
    pub async fn connect(&self, user_id: Uuid) -> (Uuid, Receiver<String>) {
        let connection_id = Uuid::new_v4();
        let (sender, receiver) = channel(OUTBOUND_BUFFER);

        self.connections.lock().await.insert(
            connection_id,
            Connection {
                user_id,
                sender,
                joined: false,
            },
        );

        (connection_id, receiver)
    }

    /// Applies a client command and queues its acknowledgement.
    pub async fn handle_command(&self, connection_id: Uuid, command: ClientCommand) {
        let mut connections = self.connections.lock().await;
        let Some(connection) = connections.get_mut(&connection_id) else {
            return;
        };

        let ack = match command {
            ClientCommand::JoinTickets => {
                connection.joined = true;
                "joined"
            }
            ClientCommand::LeaveTickets => {
                connection.joined = false;
                "left"
            }
        };
        debug!(
            %connection_id,
            user_id = %connection.user_id,
            ack,
            "ticket room membership changed"
        );

        let frame = json!({"event": ack, "room": TICKETS_ROOM}).to_string();
        match connection.sender.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(%connection_id, "ticket socket buffer full, dropping acknowledgement");
            }
            Err(TrySendError::Closed(_)) => {
                connections.remove(&connection_id);
            }
        }
    }

    /// Forgets a socket.
    pub async fn disconnect(&self, connection_id: Uuid) {
        self.connections.lock().await.remove(&connection_id);
    }

    /// Number of open sockets.
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Number of sockets in the tickets room.
    pub async fn room_size(&self) -> usize {
        self.connections
            .lock()
            .await
            .values()
            .filter(|connection| connection.joined)
            .count()
    }

    /// Queues `frame` for every joined socket with buffer room.
    ///
    /// A socket whose buffer is full misses this frame; closed sockets are dropped.
    async fn broadcast(&self, frame: &str) -> usize {
        let mut connections = self.connections.lock().await;
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (connection_id, connection) in connections.iter() {
            if !connection.joined {
                continue;
            }

            match connection.sender.try_send(frame.to_owned()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(%connection_id, "ticket socket buffer full, dropping event");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(%connection_id, "skipping closed ticket socket");
                    closed.push(*connection_id);
                }
            }
        }

        for connection_id in closed {
            connections.remove(&connection_id);
        }

        delivered
    }
}

/// Builds the outbound text frame for `event`.
pub fn event_frame(event: &TicketEvent, timestamp: DateTime<Utc>) -> String {
    json!({
        "event": event.event_name(),
        "data": event.to_frame_payload(timestamp),
    })
    .to_string()
}

#[async_trait]
impl TicketEventPublisher for TicketRelay {
    async fn publish(&self, event: &TicketEvent, timestamp: DateTime<Utc>) -> usize {
        let delivered = self.broadcast(&event_frame(event, timestamp)).await;
        debug!(event = event.event_name(), delivered, "relayed ticket event");
        delivered
    }
}
