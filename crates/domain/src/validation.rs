//! Validation engine.
//!
//! [`validate`] is a pure function of the request and the current state. The
//! checks run in a fixed order and the first failure wins:
//!
//! 1. existence of the target in the tier → `NotFound`
//! 2. type coercion of the supplied value → `BadParameter`
//! 3. range / domain check → `BadParameter`
//! 4. state permission → `StateForbidden`
//!
//! The order decides which status code a client sees when several
//! preconditions fail at once (404 before 400 before 403).

use crate::action::Action;
use crate::error::{
    Access, NotFoundError, ParameterError, PharosError, StateForbiddenError, TargetKind,
};
use crate::property::{self, PropertySpec};
use crate::state::{LaserState, StateSet};
use crate::tier::Tier;
use crate::value::{Input, PropertyValue};

/// A request to classify.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    Read { tier: Tier, name: &'a str },
    Write { tier: Tier, name: &'a str, input: &'a Input },
    Invoke { tier: Tier, name: &'a str },
}

/// An accepted request, resolved against the property and action tables.
#[derive(Debug, Clone)]
pub enum Validated {
    Read(&'static PropertySpec),
    Write(&'static PropertySpec, PropertyValue),
    Invoke(Action),
}

/// Classify `operation` in `state`.
///
/// # Errors
///
/// Returns the first failing check, in the order documented on this module.
pub fn validate(operation: &Operation<'_>, state: LaserState) -> Result<Validated, PharosError> {
    match *operation {
        Operation::Read { tier, name } => validate_read(tier, name, state).map(Validated::Read),
        Operation::Write { tier, name, input } => validate_write(tier, name, input, state)
            .map(|(spec, value)| Validated::Write(spec, value)),
        Operation::Invoke { tier, name } => {
            validate_invoke(tier, name, state).map(Validated::Invoke)
        }
    }
}

/// The invoke arm of [`validate`]. Transition edges are left to the state
/// machine.
///
/// # Errors
///
/// `NotFound` or `StateForbidden`.
pub fn validate_invoke(tier: Tier, name: &str, state: LaserState) -> Result<Action, PharosError> {
    let action = Action::lookup(tier, name).ok_or_else(|| NotFoundError {
        kind: TargetKind::Action,
        name: name.to_string(),
        tier: Some(tier),
    })?;
    check_state(action.name(), Access::Invoke, state, action.allowed_in())?;
    Ok(action)
}

/// The read arm of [`validate`].
///
/// # Errors
///
/// `NotFound` or `StateForbidden`.
pub fn validate_read(
    tier: Tier,
    name: &str,
    state: LaserState,
) -> Result<&'static PropertySpec, PharosError> {
    let spec = resolve_property(tier, name)?;
    check_state(spec.name, Access::Read, state, spec.readable_in)?;
    Ok(spec)
}

/// The write arm of [`validate`].
///
/// # Errors
///
/// `NotFound`, `BadParameter` or `StateForbidden`, in that order.
pub fn validate_write(
    tier: Tier,
    name: &str,
    input: &Input,
    state: LaserState,
) -> Result<(&'static PropertySpec, PropertyValue), PharosError> {
    let spec = resolve_property(tier, name)?;
    let value = coerce(spec, input)?;
    check_state(spec.name, Access::Write, state, spec.writable_in)?;
    Ok((spec, value))
}

fn resolve_property(tier: Tier, name: &str) -> Result<&'static PropertySpec, PharosError> {
    property::lookup(tier, name).ok_or_else(|| {
        NotFoundError {
            kind: TargetKind::Property,
            name: name.to_string(),
            tier: Some(tier),
        }
        .into()
    })
}

/// Type coercion, then range check.
fn coerce(spec: &PropertySpec, input: &Input) -> Result<PropertyValue, PharosError> {
    let value = spec
        .value_type
        .coerce(input)
        .ok_or_else(|| ParameterError::TypeMismatch {
            name: spec.name.to_string(),
            expected: spec.value_type.to_string(),
            got: input.to_string(),
        })?;

    if let Some(range) = spec.range
        && !range.contains(&value)
    {
        return Err(ParameterError::OutOfRange {
            name: spec.name.to_string(),
            value: value.to_string(),
            range: range.to_string(),
        }
        .into());
    }
    Ok(value)
}

fn check_state(
    target: &str,
    access: Access,
    state: LaserState,
    allowed: StateSet,
) -> Result<(), PharosError> {
    if allowed.contains(state) {
        return Ok(());
    }
    Err(StateForbiddenError {
        target: target.to_string(),
        access,
        state,
        allowed,
    }
    .into())
}
