//! Fire-and-forget event publication.

use crate::events::DomainEvent;

/// Publishes domain events.
///
/// Publishing never fails from the caller's point of view: implementations
/// log delivery problems and drop the event.
pub trait EventPublisher: Send + Sync + 'static {
    /// Hand an event to the delivery mechanism.
    fn publish(&self, event: DomainEvent);
}
