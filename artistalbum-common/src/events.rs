//! Change events and the in-process EventBus
//!
//! Mutations publish a [`ChangeEvent`] on a topic through the
//! [`ChangePublisher`] interface. Delivery is best-effort: publishers never
//! block and callers treat a failed publish as a log line, not an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

/// Topic carrying entity change notifications
pub const UPDATES_TOPIC: &str = "/topic/updates";

/// Entity type tag used for band events
pub const BAND_ENTITY: &str = "banda";

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
    Linked,
    Unlinked,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Created => "created",
            ChangeAction::Updated => "updated",
            ChangeAction::Deleted => "deleted",
            ChangeAction::Linked => "linked",
            ChangeAction::Unlinked => "unlinked",
        }
    }
}

/// Notification payload: `{"entityType", "action", "entityId"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub entity_type: String,
    pub action: ChangeAction,
    pub entity_id: i64,
}

impl ChangeEvent {
    /// Event about a band; link/unlink events carry the band id
    pub fn band(action: ChangeAction, band_id: i64) -> Self {
        Self {
            entity_type: BAND_ENTITY.to_string(),
            action,
            entity_id: band_id,
        }
    }
}

/// An event together with the topic it was published on
#[derive(Debug, Clone)]
pub struct TopicMessage {
    pub topic: String,
    pub event: ChangeEvent,
}

#[derive(Debug, Error)]
pub enum PublishError {
    /// Nobody is listening; the event was dropped
    #[error("No subscribers on topic {0}")]
    NoSubscribers(String),

    #[error("Publish failed: {0}")]
    Failed(String),
}

/// Publish-only side of the change notifier
///
/// No delivery guarantee. Implementations must not block.
pub trait ChangePublisher: Send + Sync {
    fn publish(&self, topic: &str, event: &ChangeEvent) -> Result<(), PublishError>;
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Slow subscribers see `Lagged` and lose the oldest events
///
/// # Examples
///
/// ```
/// use artistalbum_common::events::{ChangeAction, ChangeEvent, ChangePublisher, EventBus, UPDATES_TOPIC};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.publish(UPDATES_TOPIC, &ChangeEvent::band(ChangeAction::Created, 1)).unwrap();
///
/// let message = rx.try_recv().unwrap();
/// assert_eq!(message.topic, UPDATES_TOPIC);
/// assert_eq!(message.event.entity_id, 1);
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TopicMessage>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future messages on every topic
    pub fn subscribe(&self) -> broadcast::Receiver<TopicMessage> {
        self.tx.subscribe()
    }

    /// Send a message to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        message: TopicMessage,
    ) -> Result<usize, broadcast::error::SendError<TopicMessage>> {
        self.tx.send(message)
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ChangePublisher for EventBus {
    fn publish(&self, topic: &str, event: &ChangeEvent) -> Result<(), PublishError> {
        self.emit(TopicMessage {
            topic: topic.to_string(),
            event: event.clone(),
        })
        .map(|_| ())
        .map_err(|_| PublishError::NoSubscribers(topic.to_string()))
    }
}
