//! Device state machine: the only owner of the current [`LaserState`].
//!
//! ```text
//! Disconnected -> Off            (Connect)
//! Off -> StandingBy              (TurnOn)
//! StandingBy -> Operational      (CompleteWarmUp)
//! Operational -> EmissionOn      (EnableOutput)
//! EmissionOn -> Operational      (CloseOutput)
//! Operational -> StandingBy      (CloseOutput, GoToStandby)
//! EmissionOn -> StandingBy       (GoToStandby)
//! any -> Off                     (TurnOff)
//! ```
//!
//! Transitions are synchronous: there is no warm-up timer, the
//! `CompleteWarmUp` edge is explicit so that tests stay deterministic while
//! clients still cannot skip `StandingBy`.

use std::fmt;

use serde::Serialize;

use crate::error::{InvalidTransitionError, PharosError};
use crate::state::{LaserState, StateSet};

/// A state-changing control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Transition {
    Connect,
    TurnOn,
    CompleteWarmUp,
    EnableOutput,
    CloseOutput,
    GoToStandby,
    TurnOff,
}

impl Transition {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Connect => "Connect",
            Self::TurnOn => "TurnOn",
            Self::CompleteWarmUp => "CompleteWarmUp",
            Self::EnableOutput => "EnableOutput",
            Self::CloseOutput => "CloseOutput",
            Self::GoToStandby => "GoToStandby",
            Self::TurnOff => "TurnOff",
        }
    }

    /// States from which this transition has an edge.
    #[must_use]
    pub fn valid_from(self) -> StateSet {
        match self {
            Self::Connect => StateSet::of(&[LaserState::Disconnected]),
            Self::TurnOn => StateSet::of(&[LaserState::Off]),
            Self::CompleteWarmUp => StateSet::of(&[LaserState::StandingBy]),
            Self::EnableOutput => StateSet::of(&[LaserState::Operational]),
            Self::CloseOutput | Self::GoToStandby => {
                StateSet::of(&[LaserState::Operational, LaserState::EmissionOn])
            }
            Self::TurnOff => StateSet::ALL,
        }
    }

    /// Destination state when applied from `from`, or `None` if there is no edge.
    #[must_use]
    pub fn target(self, from: LaserState) -> Option<LaserState> {
        use LaserState::{Disconnected, EmissionOn, Off, Operational, StandingBy};

        match (self, from) {
            (Self::Connect, Disconnected) => Some(Off),
            (Self::TurnOn, Off) => Some(StandingBy),
            (Self::CompleteWarmUp, StandingBy) => Some(Operational),
            (Self::EnableOutput, Operational) => Some(EmissionOn),
            (Self::CloseOutput, EmissionOn) => Some(Operational),
            (Self::CloseOutput | Self::GoToStandby, Operational)
            | (Self::GoToStandby, EmissionOn) => Some(StandingBy),
            (Self::TurnOff, _) => Some(Off),
            _ => None,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Record of one applied transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub transition: Transition,
    pub from: LaserState,
    pub to: LaserState,
}

impl StateChange {
    /// Whether the transition actually moved the machine (`TurnOff` from
    /// `Off` does not).
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }
}

/// Owns the current [`LaserState`] and enforces the transition diagram.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: LaserState,
}

impl StateMachine {
    /// A fresh machine, `Disconnected`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> LaserState {
        self.state
    }

    /// Output is enabled exactly while emission is on, so it reverts to
    /// `false` whenever the machine falls below `Operational`.
    #[must_use]
    pub fn is_output_enabled(&self) -> bool {
        self.state == LaserState::EmissionOn
    }

    /// Apply `transition` from the current state.
    ///
    /// # Errors
    ///
    /// Returns [`PharosError::InvalidTransition`] when the diagram has no
    /// edge for `transition` from the current state; the state is unchanged.
    pub fn apply(&mut self, transition: Transition) -> Result<StateChange, PharosError> {
        let from = self.state;
        let to = transition
            .target(from)
            .ok_or_else(|| InvalidTransitionError {
                action: transition.name(),
                state: from,
                valid_from: transition.valid_from(),
            })?;
        self.state = to;
        Ok(StateChange {
            transition,
            from,
            to,
        })
    }

    /// Walk the power-up path until `target` is reached, one legal edge at a
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`PharosError::InvalidTransition`] if `target` lies below the
    /// current state, since the power-up path only moves forward.
    pub fn boot_to(&mut self, target: LaserState) -> Result<Vec<StateChange>, PharosError> {
        if target < self.state {
            return Err(InvalidTransitionError {
                action: "Boot",
                state: self.state,
                valid_from: StateSet::of(&LaserState::ALL[..=target as usize]),
            }
            .into());
        }

        let mut changes = Vec::new();
        while self.state < target {
            let step = match self.state {
                LaserState::Disconnected => Transition::Connect,
                LaserState::Off => Transition::TurnOn,
                LaserState::StandingBy => Transition::CompleteWarmUp,
                LaserState::Operational | LaserState::EmissionOn => Transition::EnableOutput,
            };
            changes.push(self.apply(step)?);
        }
        Ok(changes)
    }
}
