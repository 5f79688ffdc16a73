//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! Workflow transitions publish events here after their atomic unit
//! commits; listeners (notification fan-out, dashboards, the background
//! verifier) subscribe with topic filters.
//!
//! ```text
//! ┌──────────────────┐                    ┌──────────────────┐
//! │ Workflow Engine  │                    │ Host listeners   │
//! │                  │    publish()       │                  │
//! │                  │ ──────┐            │                  │
//! └──────────────────┘       │            └──────────────────┘
//!                            ▼                    ↑
//!                      ┌──────────────┐          │
//!                      │  Event Bus   │          │
//!                      │              │ ─────────┘
//!                      └──────────────┘  subscribe()
//! ```
//!
//! Publishing is strictly post-commit and best-effort: a dropped event can
//! never roll back or block the transition that produced it.

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, WorkflowEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
