//! Property store.
//!
//! Holds the current value of every stored property and evaluates derived
//! read-outs on demand. Every public read or write goes through
//! [`validate`](crate::validation::validate) first, so a rejected write never
//! touches the store.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::PharosError;
use crate::preset::{PresetCatalog, PresetParameters};
use crate::property::{self, Derived, PropertySpec, Source};
use crate::state::LaserState;
use crate::tier::Tier;
use crate::validation::{validate_read, validate_write};
use crate::value::{Input, PropertyValue};
use crate::wrapper::WrapperFunction;

/// Everything outside the store a derived read-out may depend on.
#[derive(Debug, Clone, Copy)]
pub struct ReadContext<'a> {
    pub state: LaserState,
    pub presets: &'a PresetCatalog,
}

/// One committed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyChange {
    pub name: &'static str,
    pub value: PropertyValue,
}

/// Current values of the stored properties.
#[derive(Debug, Clone)]
pub struct PropertyStore {
    values: BTreeMap<&'static str, PropertyValue>,
}

impl Default for PropertyStore {
    fn default() -> Self {
        let values = [
            ("ActualAttenuatorPercentage", PropertyValue::Float(50.0)),
            ("TargetAttenuatorPercentage", PropertyValue::Float(50.0)),
            ("ActualPpDivider", PropertyValue::Int(1)),
            ("TargetPpDivider", PropertyValue::Int(1)),
            ("ActualHarmonic", PropertyValue::Int(1)),
            ("ActualRaFrequency", PropertyValue::Float(100.0)),
            ("ActualRaPower", PropertyValue::Float(5.0)),
            ("SelectedPresetIndex", PropertyValue::Int(1)),
            ("IsShutterUsedToControlOutput", PropertyValue::Bool(true)),
            ("IsRemoteInterlockActive", PropertyValue::Bool(false)),
            ("Errors", PropertyValue::List(Vec::new())),
            ("Warnings", PropertyValue::List(Vec::new())),
        ];
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl PropertyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `name` from `tier`.
    ///
    /// # Errors
    ///
    /// Returns [`PharosError::NotFound`] if the tier has no such property and
    /// [`PharosError::StateForbidden`] if it is not readable in `ctx.state`.
    pub fn get(
        &self,
        tier: Tier,
        name: &str,
        ctx: &ReadContext<'_>,
    ) -> Result<PropertyValue, PharosError> {
        let spec = validate_read(tier, name, ctx.state)?;
        Ok(self.value_of(spec, ctx))
    }

    /// Write `input` to `name` in `tier`. A coupled property also updates
    /// its actual counterpart.
    ///
    /// Returns the committed values, the written property first.
    ///
    /// # Errors
    ///
    /// Returns the first failing validation check; nothing is written.
    pub fn set(
        &mut self,
        tier: Tier,
        name: &str,
        input: &Input,
        state: LaserState,
    ) -> Result<Vec<PropertyChange>, PharosError> {
        let (spec, value) = validate_write(tier, name, input, state)?;
        Ok(self.commit(spec, value))
    }

    /// Every property of `tier` readable in `ctx.state`, by name.
    #[must_use]
    pub fn batch_get(
        &self,
        tier: Tier,
        ctx: &ReadContext<'_>,
    ) -> BTreeMap<&'static str, PropertyValue> {
        property::in_tier(tier)
            .filter(|spec| spec.readable_in.contains(ctx.state))
            .map(|spec| (spec.name, self.value_of(spec, ctx)))
            .collect()
    }

    /// Copy a preset's parameters onto the device.
    ///
    /// The attenuator and PP divider go through the same validated write as
    /// a client `PUT`; the amplifier settings and harmonic are device-side
    /// values with no writable counterpart. Every write is validated before
    /// any is committed.
    ///
    /// # Errors
    ///
    /// Returns the first failing validation; the store is unchanged.
    pub fn apply_preset(
        &mut self,
        parameters: &PresetParameters,
        state: LaserState,
    ) -> Result<Vec<PropertyChange>, PharosError> {
        let writes = [
            (
                "TargetAttenuatorPercentage",
                PropertyValue::Float(parameters.attenuator_percentage),
            ),
            ("TargetPpDivider", PropertyValue::Int(parameters.pp_divider)),
        ];

        let accepted = writes
            .into_iter()
            .map(|(name, value)| validate_write(Tier::Basic, name, &Input::Typed(value), state))
            .collect::<Result<Vec<_>, _>>()?;

        let mut changes: Vec<_> = accepted
            .into_iter()
            .flat_map(|(spec, value)| self.commit(spec, value))
            .collect();
        for (name, value) in [
            (
                "ActualRaFrequency",
                PropertyValue::Float(parameters.pulse_repetition_rate_in_khz),
            ),
            (
                "ActualRaPower",
                PropertyValue::Float(parameters.ra_output_power_setpoint_in_w),
            ),
            ("ActualHarmonic", PropertyValue::Int(parameters.harmonic_number)),
        ] {
            changes.push(self.put(name, value));
        }
        Ok(changes)
    }

    /// Current value of `spec`, with no state check.
    #[must_use]
    pub fn value_of(&self, spec: &PropertySpec, ctx: &ReadContext<'_>) -> PropertyValue {
        match spec.source {
            Source::Stored | Source::Coupled(_) => self
                .values
                .get(spec.name)
                .cloned()
                .unwrap_or_else(|| spec.value_type.zero()),
            Source::Derived(derived) => self.derive(derived, ctx),
        }
    }

    fn derive(&self, derived: Derived, ctx: &ReadContext<'_>) -> PropertyValue {
        let emitting = ctx.state == LaserState::EmissionOn;
        match derived {
            Derived::StateName => PropertyValue::String(ctx.state.name().to_string()),
            Derived::GeneralStatus => {
                PropertyValue::String(ctx.state.general_status().to_string())
            }
            Derived::StateId => PropertyValue::Int(ctx.state.state_id()),
            Derived::OutputEnabled | Derived::PpOpened => PropertyValue::Bool(emitting),
            Derived::OutputPower => PropertyValue::Float(self.output_power(emitting)),
            Derived::OutputFrequency => PropertyValue::Float(self.output_frequency()),
            Derived::OutputEnergy => {
                let frequency = self.output_frequency();
                let energy = if frequency > 0.0 {
                    self.output_power(emitting) * 1e6 / (frequency * 1000.0)
                } else {
                    0.0
                };
                PropertyValue::Float(energy)
            }
            Derived::Presets => PropertyValue::List(ctx.presets.to_json()),
            Derived::WrapperFunctions => PropertyValue::List(WrapperFunction::names_json()),
        }
    }

    /// Watts after the pulse picker and attenuator.
    fn output_power(&self, emitting: bool) -> f64 {
        if !emitting {
            return 0.0;
        }
        self.number("ActualRaPower") * self.number("ActualAttenuatorPercentage")
            / 100.0
            / self.divider()
    }

    /// Kilohertz after the pulse picker.
    fn output_frequency(&self) -> f64 {
        self.number("ActualRaFrequency") / self.divider()
    }

    fn divider(&self) -> f64 {
        self.number("ActualPpDivider").max(1.0)
    }

    fn number(&self, name: &str) -> f64 {
        self.values
            .get(name)
            .and_then(PropertyValue::as_f64)
            .unwrap_or_default()
    }

    fn commit(&mut self, spec: &'static PropertySpec, value: PropertyValue) -> Vec<PropertyChange> {
        let mut changes = vec![self.put(spec.name, value.clone())];
        if let Source::Coupled(actual) = spec.source {
            changes.push(self.put(actual, value));
        }
        changes
    }

    fn put(&mut self, name: &'static str, value: PropertyValue) -> PropertyChange {
        self.values.insert(name, value.clone());
        PropertyChange { name, value }
    }
}
