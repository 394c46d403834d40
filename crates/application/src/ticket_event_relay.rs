use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use systicket_core::AppResult;
use systicket_domain::TicketEvent;

/// Port that fans ticket events out to subscribers.
///
/// Delivery is best effort: failures for individual recipients are absorbed
/// by the implementation and never reach the caller.
#[async_trait]
pub trait TicketEventPublisher: Send + Sync {
    /// Broadcasts `event` and returns the number of recipients it was queued for.
    async fn publish(&self, event: &TicketEvent, timestamp: DateTime<Utc>) -> usize;
}

/// Summary of one relayed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReceipt {
    /// Outbound event name.
    pub event_name: &'static str,
    /// Recipients the frame was queued for.
    pub delivered: usize,
}

/// Application service turning ticket domain events into broadcasts.
#[derive(Clone)]
pub struct TicketEventRelayService {
    publisher: Arc<dyn TicketEventPublisher>,
}

impl TicketEventRelayService {
    /// Creates a relay service over a publisher.
    #[must_use]
    pub fn new(publisher: Arc<dyn TicketEventPublisher>) -> Self {
        Self { publisher }
    }

    /// Sanitizes a domain event and broadcasts it.
    pub async fn relay_domain_event(
        &self,
        event_name: &str,
        payload: &Value,
    ) -> AppResult<RelayReceipt> {
        let event = TicketEvent::from_domain_event(event_name, payload)?;
        let delivered = self.publisher.publish(&event, Utc::now()).await;

        Ok(RelayReceipt {
            event_name: event.event_name(),
            delivered,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use tokio::sync::Mutex;

    use systicket_core::AppError;
    use systicket_domain::TicketEvent;

    use super::{TicketEventPublisher, TicketEventRelayService};

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<TicketEvent>>,
    }

    #[async_trait]
    impl TicketEventPublisher for RecordingPublisher {
        async fn publish(&self, event: &TicketEvent, _timestamp: DateTime<Utc>) -> usize {
            self.events.lock().await.push(event.clone());
            3
        }
    }

    #[tokio::test]
    async fn relays_recognized_events() {
        let publisher = Arc::new(RecordingPublisher::default());
        let service = TicketEventRelayService::new(publisher.clone());

        let receipt = service
            .relay_domain_event("ticket.deleted", &json!({"id": "t-1"}))
            .await;

        assert!(matches!(
            receipt,
            Ok(ref receipt) if receipt.event_name == "ticket:deleted" && receipt.delivered == 3
        ));
        assert_eq!(
            publisher.events.lock().await.as_slice(),
            &[TicketEvent::Deleted {
                ticket_id: json!("t-1")
            }]
        );
    }

    #[tokio::test]
    async fn rejects_unknown_events_without_publishing() {
        let publisher = Arc::new(RecordingPublisher::default());
        let service = TicketEventRelayService::new(publisher.clone());

        let result = service
            .relay_domain_event("ticket.commented", &json!({}))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(publisher.events.lock().await.is_empty());
    }
}
