//! Domain events emitted by the session authority.
//!
//! Events are handed to an [`EventPublisher`](crate::traits::EventPublisher)
//! on a fire-and-forget basis; delivery success never affects the outcome
//! of the operation that emitted them.

pub mod session;
pub mod user;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use session::{RevocationReason, SessionEvent};
pub use user::UserEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Tenant the event belongs to.
    pub tenant_id: Uuid,
    /// The user who caused the event (if applicable).
    pub actor_id: Option<Uuid>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A session-related event.
    Session(SessionEvent),
    /// A user-related event.
    User(UserEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(tenant_id: Uuid, actor_id: Option<Uuid>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            tenant_id,
            actor_id,
            payload,
        }
    }

    /// Create a session event.
    pub fn session(tenant_id: Uuid, actor_id: Option<Uuid>, event: SessionEvent) -> Self {
        Self::new(tenant_id, actor_id, EventPayload::Session(event))
    }

    /// Create a user event.
    pub fn user(tenant_id: Uuid, actor_id: Option<Uuid>, event: UserEvent) -> Self {
        Self::new(tenant_id, actor_id, EventPayload::User(event))
    }

    /// Stable dotted name of the event, e.g. `session.revoked`.
    pub fn name(&self) -> &'static str {
        match &self.payload {
            EventPayload::Session(e) => e.name(),
            EventPayload::User(e) => e.name(),
        }
    }
}
