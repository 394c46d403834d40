use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Extension, State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use systicket_core::UserIdentity;
use systicket_domain::Permission;
use tracing::{debug, info};

use super::{ClientCommand, TicketRelay};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn tickets_socket_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    upgrade: WebSocketUpgrade,
) -> ApiResult<Response> {
    authorize_subscriber(&state, &user).await?;

    let relay = state.ticket_relay.clone();
    Ok(upgrade.on_upgrade(move |socket| serve_socket(socket, relay, user)))
}

/// Frames carry every ticket, so own-ticket readers cannot subscribe.
///
/// Suspended or removed users keep their session cookie until it expires,
/// so access is resolved again on every upgrade.
pub(super) async fn authorize_subscriber(
    state: &AppState,
    user: &UserIdentity,
) -> ApiResult<()> {
    state
        .permission_service
        .require_any_permission(user, &[Permission::TicketsRead, Permission::TicketsReadAll])
        .await?;
    Ok(())
}

async fn serve_socket(socket: WebSocket, relay: TicketRelay, user: UserIdentity) {
    let (mut sink, mut stream) = socket.split();
    let (connection_id, mut outbound) = relay.connect(user.user_id()).await;
    info!(%connection_id, user_id = %user.user_id(), "ticket socket connected");

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match ClientCommand::parse(text.as_str()) {
                Some(command) => relay.handle_command(connection_id, command).await,
                None => debug!(%connection_id, "ignoring unknown ticket socket message"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    relay.disconnect(connection_id).await;
    writer.abort();
    info!(%connection_id, "ticket socket disconnected");
}
