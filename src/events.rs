use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::entities::QuoteStatus;

/// Domain events emitted after successful mutations. The processing loop only
/// logs them today; downstream consumers (webhooks, notifications) would hang
/// off the same channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ItemCreated(i32),
    ItemUpdated(i32),
    ItemArchived(i32),
    ItemRestored(i32),
    QuoteCreated { quote_id: i32, number: String },
    QuoteUpdated(i32),
    QuoteArchived(i32),
    QuoteStatusChanged {
        quote_id: i32,
        old_status: QuoteStatus,
        new_status: QuoteStatus,
    },
    QuotesExpired { updated_count: u64 },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failures to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event; a full or closed channel is logged and swallowed so
    /// event delivery never fails the originating request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Creates a bounded event channel pair.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Runs until all senders drop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::QuoteStatusChanged {
                quote_id,
                old_status,
                new_status,
            } => {
                info!(
                    quote_id = *quote_id,
                    old = old_status.as_str(),
                    new = new_status.as_str(),
                    "quote status changed"
                );
            }
            Event::QuotesExpired { updated_count } => {
                info!(updated_count = *updated_count, "expiration sweep completed");
            }
            other => info!("event: {:?}", other),
        }
    }

    info!("Event processing loop stopped");
}
