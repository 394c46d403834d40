//! Ticket domain events as broadcast to real-time subscribers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use systicket_core::{AppError, AppResult};

/// Ticket fields that may leave the server in a broadcast.
pub const TICKET_FIELD_WHITELIST: [&str; 10] = [
    "id",
    "code",
    "title",
    "status",
    "priority",
    "client_id",
    "client_name",
    "assignee_id",
    "created_at",
    "updated_at",
];

/// Ticket payload reduced to whitelisted fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketSnapshot(Map<String, Value>);

impl TicketSnapshot {
    /// Copies the whitelisted fields present in `ticket`.
    pub fn sanitize(ticket: &Value) -> AppResult<Self> {
        let Some(object) = ticket.as_object() else {
            return Err(AppError::Validation(
                "ticket payload must be a JSON object".to_owned(),
            ));
        };

        let fields = TICKET_FIELD_WHITELIST
            .iter()
            .filter_map(|field| {
                object
                    .get(*field)
                    .map(|value| ((*field).to_owned(), value.clone()))
            })
            .collect();

        Ok(Self(fields))
    }

    /// Returns the ticket id, if present.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    /// Returns the sanitized JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// A ticket lifecycle event accepted by the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketEvent {
    /// A ticket was created.
    Created(TicketSnapshot),
    /// A ticket was updated; carries the post-update ticket.
    Updated(TicketSnapshot),
    /// A ticket moved between statuses.
    StatusChanged {
        /// Ticket identifier.
        ticket_id: Value,
        /// Previous status.
        old_status: Value,
        /// New status.
        new_status: Value,
    },
    /// A ticket was assigned.
    Assigned {
        /// Ticket identifier.
        ticket_id: Value,
        /// New assignee.
        assignee_id: Value,
    },
    /// A ticket was deleted.
    Deleted {
        /// Ticket identifier.
        ticket_id: Value,
    },
}

impl TicketEvent {
    /// Builds an event from a domain event name and its payload.
    ///
    /// Accepts both the flat payloads (`ticketId`, `assigneeId`) and the
    /// nested ones emitted by the ticket service (`ticket`, `before`/`after`,
    /// `assignedToId`).
    pub fn from_domain_event(name: &str, payload: &Value) -> AppResult<Self> {
        match name {
            "ticket.created" => Ok(Self::Created(TicketSnapshot::sanitize(payload)?)),
            "ticket.updated" => {
                let ticket = payload.get("after").unwrap_or(payload);
                Ok(Self::Updated(TicketSnapshot::sanitize(ticket)?))
            }
            "ticket.status.changed" => Ok(Self::StatusChanged {
                ticket_id: ticket_id(payload),
                old_status: field(payload, "oldStatus"),
                new_status: field(payload, "newStatus"),
            }),
            "ticket.assigned" => Ok(Self::Assigned {
                ticket_id: ticket_id(payload),
                assignee_id: payload
                    .get("assigneeId")
                    .or_else(|| payload.get("assignedToId"))
                    .cloned()
                    .unwrap_or(Value::Null),
            }),
            "ticket.deleted" => Ok(Self::Deleted {
                ticket_id: payload
                    .get("id")
                    .cloned()
                    .unwrap_or_else(|| ticket_id(payload)),
            }),
            _ => Err(AppError::Validation(format!(
                "unsupported ticket event '{name}'"
            ))),
        }
    }

    /// Returns the short event kind carried in the `type` field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::StatusChanged { .. } => "status-changed",
            Self::Assigned { .. } => "assigned",
            Self::Deleted { .. } => "deleted",
        }
    }

    /// Returns the outbound event name.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Created(_) => "ticket:created",
            Self::Updated(_) => "ticket:updated",
            Self::StatusChanged { .. } => "ticket:status-changed",
            Self::Assigned { .. } => "ticket:assigned",
            Self::Deleted { .. } => "ticket:deleted",
        }
    }

    /// Builds the outbound payload stamped with `timestamp`.
    #[must_use]
    pub fn to_frame_payload(&self, timestamp: DateTime<Utc>) -> Value {
        let timestamp = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        match self {
            Self::Created(ticket) | Self::Updated(ticket) => json!({
                "type": self.kind(),
                "ticket": ticket.to_json(),
                "timestamp": timestamp,
            }),
            Self::StatusChanged {
                ticket_id,
                old_status,
                new_status,
            } => json!({
                "type": self.kind(),
                "ticketId": ticket_id,
                "oldStatus": old_status,
                "newStatus": new_status,
                "timestamp": timestamp,
            }),
            Self::Assigned {
                ticket_id,
                assignee_id,
            } => json!({
                "type": self.kind(),
                "ticketId": ticket_id,
                "assigneeId": assignee_id,
                "timestamp": timestamp,
            }),
            Self::Deleted { ticket_id } => json!({
                "type": self.kind(),
                "ticketId": ticket_id,
                "timestamp": timestamp,
            }),
        }
    }
}

fn field(payload: &Value, key: &str) -> Value {
    payload.get(key).cloned().unwrap_or(Value::Null)
}

fn ticket_id(payload: &Value) -> Value {
    payload
        .get("ticketId")
        .or_else(|| payload.get("ticket").and_then(|ticket| ticket.get("id")))
        .cloned()
        .unwrap_or(Value::Null)
}
