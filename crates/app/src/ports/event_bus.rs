//! Event bus port: publish/subscribe for device events.

use pharos_domain::event::DeviceEvent;

/// Publishes device events to interested subscribers.
///
/// Publishing is synchronous and infallible: it runs while the dispatcher
/// holds the device lock, so events leave in the order the changes were
/// applied, and a missing subscriber never fails the originating operation.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: DeviceEvent);
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: DeviceEvent) {
        (**self).publish(event);
    }
}
