use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::{RelayReceiptResponse, TicketEventRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// Accepts a ticket domain event from the ticket service and relays it.
pub async fn ticket_event_intake_handler(
    State(state): State<AppState>,
    Json(payload): Json<TicketEventRequest>,
) -> ApiResult<(StatusCode, Json<RelayReceiptResponse>)> {
    let receipt = state
        .ticket_event_relay_service
        .relay_domain_event(payload.event.as_str(), &payload.payload)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(RelayReceiptResponse::from(receipt)),
    ))
}
