//! Domain event system — structured session events for external observers.
//!
//! The dialogue engine publishes events as turns happen. Loggers, exporters
//! and UIs subscribe without the engine knowing about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A session started running
    SessionStarted {
        session_id: String,
        agents: Vec<String>,
        max_rounds: u32,
        timestamp: DateTime<Utc>,
    },

    /// A turn produced a transcript entry
    TurnCompleted {
        session_id: String,
        round: u32,
        sequence_id: u64,
        speaker: String,
        timestamp: DateTime<Utc>,
    },

    /// A backend attempt failed
    TurnFailed {
        session_id: String,
        round: u32,
        speaker: String,
        attempt: u32,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A failed attempt will be retried after a delay
    RetryScheduled {
        session_id: String,
        speaker: String,
        attempt: u32,
        delay_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A turn was given up on and skipped
    TurnSkipped {
        session_id: String,
        round: u32,
        speaker: String,
        timestamp: DateTime<Utc>,
    },

    /// An agent's memory fell back to truncation
    MemoryDegraded {
        session_id: String,
        agent: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A session reached a terminal state
    SessionFinished {
        session_id: String,
        state: String,
        rounds_completed: u32,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::TurnCompleted {
            session_id: "s1".into(),
            round: 1,
            sequence_id: 1,
            speaker: "Alice".into(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::TurnCompleted { speaker, sequence_id, .. } => {
                assert_eq!(speaker, "Alice");
                assert_eq!(*sequence_id, 1);
            }
            _ => panic!("Expected TurnCompleted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::MemoryDegraded {
            session_id: "s1".into(),
            agent: "Bob".into(),
            reason: "no subscribers".into(),
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_string(&DomainEvent::TurnSkipped {
            session_id: "s1".into(),
            round: 2,
            speaker: "Bob".into(),
            timestamp: Utc::now(),
        })
        .unwrap();
        assert!(json.contains("\"event\":\"turn_skipped\""));
    }
}
