//! Device lifecycle state and the state sets used by permission rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the simulated laser. Exactly one is active at a time.
///
/// Variants are ordered along the power-up path, so `Operational` and later
/// compare greater than `StandingBy`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum LaserState {
    #[default]
    Disconnected,
    Off,
    StandingBy,
    Operational,
    EmissionOn,
}

impl LaserState {
    /// Every state, in power-up order.
    pub const ALL: [Self; 5] = [
        Self::Disconnected,
        Self::Off,
        Self::StandingBy,
        Self::Operational,
        Self::EmissionOn,
    ];

    /// Name reported by `ActualStateName` / `ActualStateName2`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "StateDisconnected",
            Self::Off => "StateOff",
            Self::StandingBy => "StateStandingBy",
            Self::Operational => "StateOperational",
            Self::EmissionOn => "StateEmissionOn",
        }
    }

    /// Name reported by `GeneralStatus`.
    #[must_use]
    pub fn general_status(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Off => "Off",
            Self::StandingBy => "Standby",
            Self::Operational => "Operational",
            Self::EmissionOn => "EmissionOn",
        }
    }

    /// Numeric id reported by `ActualStateId`.
    ///
    /// Emission shares the operational id, as on the real device.
    #[must_use]
    pub fn state_id(self) -> i64 {
        match self {
            Self::Disconnected => 0x800,
            Self::Off => 0x200,
            Self::StandingBy => 0x01,
            Self::Operational | Self::EmissionOn => 0x80,
        }
    }

    /// Whether the controller is connected to the (virtual) laser head.
    #[must_use]
    pub fn is_connected(self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for LaserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no [`LaserState`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown laser state '{0}'")]
pub struct ParseStateError(pub String);

impl FromStr for LaserState {
    type Err = ParseStateError;

    /// Accepts both the short variant name (`Operational`) and the device
    /// name (`StateOperational`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let short = trimmed
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("state"))
            .map_or(trimmed, |_| &trimmed[5..]);
        Self::ALL
            .into_iter()
            .find(|state| format!("{state:?}").eq_ignore_ascii_case(short))
            .ok_or_else(|| ParseStateError(s.to_string()))
    }
}

/// A set of [`LaserState`]s, used for `readable_in` / `writable_in` rules.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateSet(u8);

impl StateSet {
    /// No state at all: the operation is never permitted.
    pub const EMPTY: Self = Self(0);
    /// Every state.
    pub const ALL: Self = Self::of(&LaserState::ALL);
    /// Every state in which the laser head is connected.
    pub const CONNECTED: Self = Self::of(&[
        LaserState::Off,
        LaserState::StandingBy,
        LaserState::Operational,
        LaserState::EmissionOn,
    ]);

    /// Build a set from a slice of states.
    #[must_use]
    pub const fn of(states: &[LaserState]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < states.len() {
            bits |= states[i].bit();
            i += 1;
        }
        Self(bits)
    }

    #[must_use]
    pub const fn contains(self, state: LaserState) -> bool {
        self.0 & state.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate the member states in power-up order.
    pub fn iter(self) -> impl Iterator<Item = LaserState> {
        LaserState::ALL
            .into_iter()
            .filter(move |state| self.contains(*state))
    }
}

impl fmt::Debug for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, state) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(state.name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_disconnected() {
        assert_eq!(LaserState::default(), LaserState::Disconnected);
    }

    #[test]
    fn should_order_states_along_power_up_path() {
        assert!(LaserState::Off < LaserState::StandingBy);
        assert!(LaserState::StandingBy < LaserState::Operational);
        assert!(LaserState::Operational < LaserState::EmissionOn);
    }

    #[test]
    fn should_share_state_id_between_operational_and_emission() {
        assert_eq!(LaserState::Operational.state_id(), 0x80);
        assert_eq!(LaserState::EmissionOn.state_id(), 0x80);
        assert_eq!(LaserState::Off.state_id(), 0x200);
    }

    #[test]
    fn should_display_device_state_name() {
        assert_eq!(LaserState::StandingBy.to_string(), "StateStandingBy");
        assert_eq!(LaserState::StandingBy.general_status(), "Standby");
    }

    #[test]
    fn should_parse_short_and_device_names() {
        assert_eq!("Operational".parse(), Ok(LaserState::Operational));
        assert_eq!("StateEmissionOn".parse(), Ok(LaserState::EmissionOn));
        assert_eq!("standingby".parse(), Ok(LaserState::StandingBy));
    }

    #[test]
    fn should_reject_unknown_state_name() {
        assert!("Warm".parse::<LaserState>().is_err());
    }

    #[test]
    fn should_contain_only_listed_states() {
        let set = StateSet::of(&[LaserState::Off, LaserState::Operational]);
        assert!(set.contains(LaserState::Off));
        assert!(set.contains(LaserState::Operational));
        assert!(!set.contains(LaserState::StandingBy));
    }

    #[test]
    fn should_exclude_disconnected_from_connected_set() {
        assert!(!StateSet::CONNECTED.contains(LaserState::Disconnected));
        assert_eq!(StateSet::CONNECTED.iter().count(), 4);
        assert_eq!(StateSet::ALL.iter().count(), 5);
    }

    #[test]
    fn should_display_state_set_as_names() {
        let set = StateSet::of(&[LaserState::StandingBy, LaserState::Off]);
        assert_eq!(set.to_string(), "StateOff, StateStandingBy");
        assert_eq!(StateSet::EMPTY.to_string(), "none");
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let json = serde_json::to_string(&LaserState::EmissionOn).unwrap();
        assert_eq!(json, "\"EmissionOn\"");
        let parsed: LaserState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, LaserState::EmissionOn);
    }
}
