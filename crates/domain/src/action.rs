//! Named actions invocable with `POST /{tier}/{ActionName}`.

use std::fmt;

use crate::state::{LaserState, StateSet};
use crate::state_machine::Transition;
use crate::tier::Tier;

/// Every registered action, across all tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    TurnOn,
    TurnOff,
    EnableOutput,
    CloseOutput,
    GoToStandby,
    ApplySelectedPreset,
    Connect,
    CompleteWarmUp,
    ExecuteWrapperFunction,
}

impl Action {
    pub const ALL: [Self; 9] = [
        Self::TurnOn,
        Self::TurnOff,
        Self::EnableOutput,
        Self::CloseOutput,
        Self::GoToStandby,
        Self::ApplySelectedPreset,
        Self::Connect,
        Self::CompleteWarmUp,
        Self::ExecuteWrapperFunction,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self.transition() {
            Some(transition) => transition.name(),
            None => match self {
                Self::ApplySelectedPreset => "ApplySelectedPreset",
                _ => "ExecuteWrapperFunction",
            },
        }
    }

    /// The tier that exposes this action.
    #[must_use]
    pub fn tier(self) -> Tier {
        match self {
            Self::Connect | Self::CompleteWarmUp => Tier::Advanced,
            Self::ExecuteWrapperFunction => Tier::Raw,
            _ => Tier::Basic,
        }
    }

    /// The state-machine edge this action drives, if any.
    #[must_use]
    pub fn transition(self) -> Option<Transition> {
        match self {
            Self::TurnOn => Some(Transition::TurnOn),
            Self::TurnOff => Some(Transition::TurnOff),
            Self::EnableOutput => Some(Transition::EnableOutput),
            Self::CloseOutput => Some(Transition::CloseOutput),
            Self::GoToStandby => Some(Transition::GoToStandby),
            Self::Connect => Some(Transition::Connect),
            Self::CompleteWarmUp => Some(Transition::CompleteWarmUp),
            Self::ApplySelectedPreset | Self::ExecuteWrapperFunction => None,
        }
    }

    /// States in which a non-transition action may be invoked.
    ///
    /// Transition actions return [`StateSet::ALL`]: they are gated by the
    /// state machine instead, which reports `InvalidTransition`.
    #[must_use]
    pub fn allowed_in(self) -> StateSet {
        match self {
            Self::ApplySelectedPreset => {
                StateSet::of(&[LaserState::StandingBy, LaserState::Operational])
            }
            _ => StateSet::ALL,
        }
    }

    /// Find the action called `name` in `tier`.
    #[must_use]
    pub fn lookup(tier: Tier, name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.tier() == tier && action.name() == name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
