//! Common error types used across the workspace.
//!
//! [`PharosError`] is the single classified failure returned by every core
//! operation. Each variant wraps a typed detail struct (no `String` variants)
//! carrying the target name, the current state, and the allowed states where
//! relevant, so callers can diagnose a rejection without retrying blindly.

use std::fmt;

use crate::state::{LaserState, StateSet};
use crate::tier::Tier;

/// Top-level error for every operation on the virtual laser.
///
/// No variant is fatal: the device instance remains usable after any error.
#[derive(Debug, thiserror::Error)]
pub enum PharosError {
    /// Unknown tier, property, action, or wrapper function.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Wrong type, out-of-range value, or malformed arguments.
    #[error(transparent)]
    BadParameter(#[from] ParameterError),

    /// Legal in principle, but not permitted in the current device state.
    #[error(transparent)]
    StateForbidden(#[from] StateForbiddenError),

    /// The requested state-changing action does not apply from the current state.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),

    /// Preset application referencing an empty or sentinel index.
    #[error(transparent)]
    InvalidPreset(#[from] InvalidPresetError),
}

/// What kind of target could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Tier,
    Property,
    Action,
    WrapperFunction,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tier => "tier",
            Self::Property => "property",
            Self::Action => "action",
            Self::WrapperFunction => "wrapper function",
        })
    }
}

/// A lookup by name failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} '{name}' not found{}", .tier.map(|t| format!(" in {t} tier")).unwrap_or_default())]
pub struct NotFoundError {
    pub kind: TargetKind,
    pub name: String,
    pub tier: Option<Tier>,
}

/// A supplied value or argument was rejected before touching any state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    #[error("{name}: expected {expected}, got '{got}'")]
    TypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    #[error("{name}: value {value} is outside the valid range {range}")]
    OutOfRange {
        name: String,
        value: String,
        range: String,
    },

    #[error("{function}: missing argument '{argument}'")]
    MissingArgument {
        function: String,
        argument: &'static str,
    },

    #[error("malformed request body: {reason}")]
    Malformed { reason: String },
}

/// The kind of access that was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Invoke,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Invoke => "invoke",
        })
    }
}

/// An access refused because of the current device state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {access} {target} in state {state} (allowed in: {allowed})")]
pub struct StateForbiddenError {
    pub target: String,
    pub access: Access,
    pub state: LaserState,
    pub allowed: StateSet,
}

/// A control action that has no edge from the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} in state {state} (valid from: {valid_from})")]
pub struct InvalidTransitionError {
    pub action: &'static str,
    pub state: LaserState,
    pub valid_from: StateSet,
}

/// `ApplySelectedPreset` with a selection that references no cataloged preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPresetError {
    #[error("no preset is selected")]
    NoneSelected,

    #[error("no preset stored at index {0}")]
    EmptySlot(i64),
}
