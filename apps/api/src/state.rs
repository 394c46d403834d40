use systicket_application::{PermissionService, TicketEventRelayService};

use crate::ticket_relay::TicketRelay;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub permission_service: PermissionService,
    pub ticket_event_relay_service: TicketEventRelayService,
    pub ticket_relay: TicketRelay,
    pub bootstrap_token: String,
    pub internal_events_token: String,
}
