//! Live-update fan-out.
//!
//! Delivery is best effort: a subscriber that is not connected, or that falls
//! behind the channel buffer, simply misses the message.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

pub const EVENT_NEW_ORDER: &str = "newOrder";
pub const EVENT_ORDER_UPDATED: &str = "orderUpdated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Admin,
    User(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Admin => f.write_str("admin"),
            Room::User(id) => write!(f, "user:{id}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(skip)]
    pub room: Room,
    pub event: String,
    pub payload: Value,
}

/// Publishing never fails from the caller's point of view.
pub trait Notifier: Send + Sync {
    fn publish_to_admin(&self, event: &str, payload: Value);

    fn publish_to_user(&self, user_id: Uuid, event: &str, payload: Value);
}

#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    fn publish(&self, room: Room, event: &str, payload: Value) {
        let notification = Notification {
            room,
            event: event.to_string(),
            payload,
        };
        if self.sender.send(notification).is_err() {
            tracing::debug!(%room, event, "no live subscribers, notification dropped");
        }
    }
}

impl Notifier for BroadcastNotifier {
    fn publish_to_admin(&self, event: &str, payload: Value) {
        self.publish(Room::Admin, event, payload);
    }

    fn publish_to_user(&self, user_id: Uuid, event: &str, payload: Value) {
        self.publish(Room::User(user_id), event, payload);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn publish_to_admin(&self, _event: &str, _payload: Value) {}

    fn publish_to_user(&self, _user_id: Uuid, _event: &str, _payload: Value) {}
}

/// Serializes `payload` for publishing; a value that cannot be encoded is logged and skipped.
pub fn to_payload<T: Serialize>(payload: &T) -> Option<Value> {
    match serde_json::to_value(payload) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, "notification payload not serializable");
            None
        }
    }
}
