use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::area::LocationPredicate;
use crate::db::models::{BookingRow, JobRow, ProviderRow};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Count {
    pub count: i64,
}

/// Live change notification. The payload is the full record after the
/// change (or before it, for deletions).
#[derive(Debug, Clone)]
pub enum Event {
    JobAdded(JobRow),
    /// `previous` is set when the job's locations changed, so providers
    /// whose area it just left still hear about it.
    JobUpdated {
        job: JobRow,
        previous: Option<Box<JobRow>>,
    },
    JobDeleted(JobRow),
    BookingUpdated(BookingRow),
    BookingDeleted(BookingRow),
    ProviderAdded(ProviderRow),
    ProviderUpdated(ProviderRow),
    ProviderSuspended(ProviderRow),
    ProviderCount(Count),
    CustomerCount(Count),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::JobAdded(_) => "jobAdded",
            Event::JobUpdated { .. } => "jobUpdated",
            Event::JobDeleted(_) => "jobDeleted",
            Event::BookingUpdated(_) => "bookingUpdated",
            Event::BookingDeleted(_) => "bookingDeleted",
            Event::ProviderAdded(_) => "providerAdded",
            Event::ProviderUpdated(_) => "providerUpdated",
            Event::ProviderSuspended(_) => "providerSuspended",
            Event::ProviderCount(_) => "providerCount",
            Event::CustomerCount(_) => "customerCount",
        }
    }

    pub fn payload_json(&self) -> serde_json::Result<String> {
        match self {
            Event::JobAdded(job) | Event::JobUpdated { job, .. } | Event::JobDeleted(job) => {
                serde_json::to_string(job)
            }
            Event::BookingUpdated(booking) | Event::BookingDeleted(booking) => {
                serde_json::to_string(booking)
            }
            Event::ProviderAdded(provider)
            | Event::ProviderUpdated(provider)
            | Event::ProviderSuspended(provider) => serde_json::to_string(provider),
            Event::ProviderCount(count) | Event::CustomerCount(count) => serde_json::to_string(count),
        }
    }

    /// Server-Sent Events frame
    pub fn to_sse_frame(&self) -> serde_json::Result<String> {
        Ok(format!("event: {}\ndata: {}\n\n", self.name(), self.payload_json()?))
    }

    /// Job and booking events reach a provider only for records in its
    /// area, before or after the change; everything else is broadcast to all.
    pub fn visible_to(&self, predicate: &LocationPredicate) -> bool {
        match self {
            Event::JobAdded(job) | Event::JobDeleted(job) => predicate.admits(job),
            Event::JobUpdated { job, previous } => {
                predicate.admits(job) || previous.as_deref().is_some_and(|before| predicate.admits(before))
            }
            Event::BookingUpdated(booking) | Event::BookingDeleted(booking) => {
                predicate.admits(booking)
            }
            _ => true,
        }
    }
}

/// Broadcast channel handed to every handler that publishes changes
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Fire-and-forget; having no subscribers is not an error.
    pub fn publish(&self, event: Event) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => debug!("Published {} to {} subscribers", name, receivers),
            Err(_) => debug!("Published {} with no subscribers", name),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
