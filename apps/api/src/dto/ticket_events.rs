use serde::{Deserialize, Serialize};
use serde_json::Value;
use systicket_application::RelayReceipt;
use ts_rs::TS;

/// Domain event handed over by the ticket service.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/ticket-event-request.ts"
)]
pub struct TicketEventRequest {
    pub event: String,
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub payload: Value,
}

/// Outcome of relaying one ticket event.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/relay-receipt-response.ts"
)]
pub struct RelayReceiptResponse {
    pub event: String,
    pub delivered: u32,
}

impl From<RelayReceipt> for RelayReceiptResponse {
    fn from(receipt: RelayReceipt) -> Self {
        Self {
            event: receipt.event_name.to_owned(),
            delivered: u32::try_from(receipt.delivered).unwrap_or(u32::MAX),
        }
    }
}
