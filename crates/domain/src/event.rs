//! Device events: immutable records of a state transition or a committed
//! property write, published after the change is applied.

use serde::Serialize;

use crate::id::EventId;
use crate::state::LaserState;
use crate::state_machine::{StateChange, Transition};
use crate::store::PropertyChange;
use crate::time::{Timestamp, now};
use crate::value::PropertyValue;

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    StateChanged {
        transition: Transition,
        from: LaserState,
        to: LaserState,
    },
    PropertyChanged {
        name: String,
        value: PropertyValue,
    },
}

/// An event stamped with its identity and time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEvent {
    pub id: EventId,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl DeviceEvent {
    /// Stamp `kind` with a fresh id and the current time.
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            timestamp: now(),
            kind,
        }
    }
}

impl From<StateChange> for DeviceEvent {
    fn from(change: StateChange) -> Self {
        Self::new(EventKind::StateChanged {
            transition: change.transition,
            from: change.from,
            to: change.to,
        })
    }
}

impl From<PropertyChange> for DeviceEvent {
    fn from(change: PropertyChange) -> Self {
        Self::new(EventKind::PropertyChanged {
            name: change.name.to_string(),
            value: change.value,
        })
    }
}
