//! In-process event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use pharos_domain::event::DeviceEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: DeviceEvent) {
        // send fails only when there are zero receivers
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharos_domain::event::EventKind;
    use pharos_domain::state::LaserState;
    use pharos_domain::state_machine::Transition;
    use pharos_domain::value::PropertyValue;

    fn state_changed() -> DeviceEvent {
        DeviceEvent::new(EventKind::StateChanged {
            transition: Transition::TurnOn,
            from: LaserState::Off,
            to: LaserState::StandingBy,
        })
    }

    fn property_changed() -> DeviceEvent {
        DeviceEvent::new(EventKind::PropertyChanged {
            name: "TargetPpDivider".to_string(),
            value: PropertyValue::Int(2),
        })
    }

    #[tokio::test]
    async fn should_deliver_event_to_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();

        let event = state_changed();
        let event_id = event.id;
        bus.publish(event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, event_id);
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = property_changed();
        let event_id = event.id;
        bus.publish(event);

        assert_eq!(rx1.recv().await.unwrap().id, event_id);
        assert_eq!(rx2.recv().await.unwrap().id, event_id);
    }

    #[test]
    fn should_succeed_when_no_subscribers() {
        let bus = InProcessEventBus::new(16);
        bus.publish(state_changed());
    }

    #[tokio::test]
    async fn should_not_deliver_events_published_before_subscription() {
        let bus = InProcessEventBus::new(16);
        bus.publish(state_changed());

        let mut rx = bus.subscribe();
        let later = property_changed();
        let later_id = later.id;
        bus.publish(later);

        assert_eq!(rx.recv().await.unwrap().id, later_id);
    }
}
