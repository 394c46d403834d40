use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use systicket_application::TicketEventPublisher;
use systicket_domain::{FixedRole, TicketEvent};
use uuid::Uuid;

use super::socket::authorize_subscriber;
use super::{ClientCommand, OUTBOUND_BUFFER, TicketRelay, event_frame};
use crate::handlers::test_support::test_state;

fn deleted_event() -> TicketEvent {
    TicketEvent::Deleted {
        ticket_id: json!("t-42"),
    }
}

fn parse_frame(frame: Option<String>) -> Value {
    let Some(frame) = frame else {
        panic!("a frame should be queued");
    };
    match serde_json::from_str(&frame) {
        Ok(value) => value,
        Err(error) => panic!("frame should be JSON: {error}"),
    }
}

#[test]
fn client_commands_accept_json_and_bare_text() {
    assert_eq!(
        ClientCommand::parse(r#"{"event": "join-tickets"}"#),
        Some(ClientCommand::JoinTickets)
    );
    assert_eq!(
        ClientCommand::parse(" leave-tickets "),
        Some(ClientCommand::LeaveTickets)
    );
    assert_eq!(
        ClientCommand::parse(r#""join-tickets""#),
        Some(ClientCommand::JoinTickets)
    );
    assert_eq!(ClientCommand::parse(r#"{"event": "subscribe"}"#), None);
    assert_eq!(ClientCommand::parse("{}"), None);
}

#[test]
fn event_frame_wraps_payload_under_event_name() {
    let Some(timestamp) = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).single() else {
        panic!("fixture timestamp should be valid");
    };

    let frame: Value = match serde_json::from_str(&event_frame(&deleted_event(), timestamp)) {
        Ok(value) => value,
        Err(error) => panic!("frame should be JSON: {error}"),
    };

    assert_eq!(
        frame,
        json!({
            "event": "ticket:deleted",
            "data": {
                "type": "deleted",
                "ticketId": "t-42",
                "timestamp": "2025-03-04T05:06:07.000Z",
            },
        })
    );
}

#[tokio::test]
async fn only_joined_connections_receive_events() {
    let relay = TicketRelay::new();
    let (joined_id, mut joined_rx) = relay.connect(Uuid::new_v4()).await;
    let (_idle_id, mut idle_rx) = relay.connect(Uuid::new_v4()).await;

    relay
        .handle_command(joined_id, ClientCommand::JoinTickets)
        .await;
    assert_eq!(
        parse_frame(joined_rx.recv().await),
        json!({"event": "joined", "room": "tickets-room"})
    );

    let delivered = relay.publish(&deleted_event(), Utc::now()).await;
    assert_eq!(delivered, 1);

    let frame = parse_frame(joined_rx.recv().await);
    assert_eq!(frame["event"], json!("ticket:deleted"));
    assert!(idle_rx.try_recv().is_err());
}

#[tokio::test]
async fn leaving_stops_delivery_and_is_acknowledged() {
    let relay = TicketRelay::new();
    let (connection_id, mut receiver) = relay.connect(Uuid::new_v4()).await;

    relay
        .handle_command(connection_id, ClientCommand::JoinTickets)
        .await;
    relay
        .handle_command(connection_id, ClientCommand::LeaveTickets)
        .await;

    assert_eq!(parse_frame(receiver.recv().await)["event"], json!("joined"));
    assert_eq!(
        parse_frame(receiver.recv().await),
        json!({"event": "left", "room": "tickets-room"})
    );
    assert_eq!(relay.room_size().await, 0);

    let delivered = relay.publish(&deleted_event(), Utc::now()).await;
    assert_eq!(delivered, 0);
    assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn disconnect_removes_connection_immediately() {
    let relay = TicketRelay::new();
    let (connection_id, _receiver) = relay.connect(Uuid::new_v4()).await;
    relay
        .handle_command(connection_id, ClientCommand::JoinTickets)
        .await;
    assert_eq!(relay.connection_count().await, 1);

    relay.disconnect(connection_id).await;

    assert_eq!(relay.connection_count().await, 0);
    assert_eq!(relay.publish(&deleted_event(), Utc::now()).await, 0);
}

#[tokio::test]
async fn dead_connection_is_skipped_without_failing_others() {
    let relay = TicketRelay::new();
    let (dead_id, dead_rx) = relay.connect(Uuid::new_v4()).await;
    let (live_id, mut live_rx) = relay.connect(Uuid::new_v4()).await;
    relay.handle_command(dead_id, ClientCommand::JoinTickets).await;
    relay.handle_command(live_id, ClientCommand::JoinTickets).await;
    drop(dead_rx);

    let delivered = relay.publish(&deleted_event(), Utc::now()).await;

    assert_eq!(delivered, 1);
    assert_eq!(relay.connection_count().await, 1);
    assert_eq!(parse_frame(live_rx.recv().await)["event"], json!("joined"));
    assert_eq!(
        parse_frame(live_rx.recv().await)["event"],
        json!("ticket:deleted")
    );
}

#[tokio::test]
async fn stalled_connection_misses_events_once_its_buffer_is_full() {
    let relay = TicketRelay::new();
    let (stalled_id, mut stalled_rx) = relay.connect(Uuid::new_v4()).await;
    let (live_id, mut live_rx) = relay.connect(Uuid::new_v4()).await;
    relay
        .handle_command(stalled_id, ClientCommand::JoinTickets)
        .await;
    relay.handle_command(live_id, ClientCommand::JoinTickets).await;
    assert_eq!(parse_frame(live_rx.recv().await)["event"], json!("joined"));

    // The join acknowledgement already occupies one slot.
    for _ in 1..OUTBOUND_BUFFER {
        assert_eq!(relay.publish(&deleted_event(), Utc::now()).await, 2);
        assert_eq!(
            parse_frame(live_rx.recv().await)["event"],
            json!("ticket:deleted")
        );
    }

    for _ in 0..100 {
        assert_eq!(relay.publish(&deleted_event(), Utc::now()).await, 1);
        assert_eq!(
            parse_frame(live_rx.recv().await)["event"],
            json!("ticket:deleted")
        );
    }

    assert_eq!(stalled_rx.len(), OUTBOUND_BUFFER);
    assert_eq!(relay.connection_count().await, 2);
    assert_eq!(relay.room_size().await, 2);

    while stalled_rx.try_recv().is_ok() {}
    assert_eq!(relay.publish(&deleted_event(), Utc::now()).await, 2);
    assert_eq!(
        parse_frame(stalled_rx.recv().await)["event"],
        json!("ticket:deleted")
    );
}

#[tokio::test]
async fn only_ticket_wide_readers_may_subscribe() {
    let (state, stores) = test_state();
    let agent = stores.insert_user("Agent", FixedRole::Agent).await;
    let client = stores.insert_user("Client", FixedRole::Client).await;

    assert!(authorize_subscriber(&state, &agent).await.is_ok());

    let Err(error) = authorize_subscriber(&state, &client).await else {
        panic!("own-ticket readers should not subscribe");
    };
    assert_eq!(error.into_response().status(), StatusCode::FORBIDDEN);
}
