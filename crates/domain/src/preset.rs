//! Presets: named, immutable bundles of parameter values selectable by index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidPresetError, ParameterError, PharosError};

/// Number of preset slots on the device (indices `0..SLOT_COUNT`).
pub const SLOT_COUNT: i64 = 16;

/// `SelectedPresetIndex` sentinel meaning "none selected".
pub const NONE_SELECTED: i64 = -1;

/// Parameter set stored in a preset slot.
///
/// Only the attenuator, divider, repetition rate, RA power and harmonic are
/// copied onto the device when a preset is applied. The remaining fields are
/// carried so the record matches the one reported by the hardware; `-1`
/// marks a value the virtual device does not calibrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PresetParameters {
    pub attenuator_percentage: f64,
    pub burst_envelope_control_parameter: i64,
    pub burst_mode: i64,
    pub burst_parameter_n: i64,
    pub burst_parameter_p: i64,
    pub cavity_dumping_time_in_ns: i64,
    pub harmonic_number: i64,
    pub optimal_motor_position: i64,
    pub photodiode_correction1: f64,
    pub photodiode_correction2: f64,
    pub photodiode_factor: f64,
    pub photodiode_offset: f64,
    pub pp_divider: i64,
    pub pp_high_voltage_in_volts: f64,
    pub pulse_repetition_rate_in_khz: f64,
    pub ra_high_voltage_in_volts: f64,
    pub ra_ldd_current_in_a: f64,
    pub ra_on_delay_in_ns: f64,
    pub ra_output_power_setpoint_in_w: f64,
}

impl Default for PresetParameters {
    fn default() -> Self {
        Self {
            attenuator_percentage: 100.0,
            burst_envelope_control_parameter: 0,
            burst_mode: 0,
            burst_parameter_n: 1,
            burst_parameter_p: 1,
            cavity_dumping_time_in_ns: -1,
            harmonic_number: 1,
            optimal_motor_position: -1,
            photodiode_correction1: 0.104_465_000_331_401_83,
            photodiode_correction2: -1.686_690_040_969_551_8e-7,
            photodiode_factor: -1.0,
            photodiode_offset: -1.0,
            pp_divider: 1,
            pp_high_voltage_in_volts: -1.0,
            pulse_repetition_rate_in_khz: 100.0,
            ra_high_voltage_in_volts: -1.0,
            ra_ldd_current_in_a: -1.0,
            ra_on_delay_in_ns: -1.0,
            ra_output_power_setpoint_in_w: 5.0,
        }
    }
}

/// A cataloged preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Preset {
    pub index: i64,
    #[serde(rename = "Notes")]
    pub name: String,
    #[serde(flatten)]
    pub parameters: PresetParameters,
    pub is_stored_in_pharos: bool,
}

impl Preset {
    /// Create a builder for constructing a [`Preset`].
    #[must_use]
    pub fn builder() -> PresetBuilder {
        PresetBuilder::default()
    }

    /// Check the preset's parameters against the device limits.
    ///
    /// # Errors
    ///
    /// Returns [`PharosError::BadParameter`] when the index lies outside the
    /// slot range or a parameter lies outside its property's range.
    pub fn validate(&self) -> Result<(), PharosError> {
        let checks: [(&str, bool, String, &str); 5] = [
            (
                "Index",
                (0..SLOT_COUNT).contains(&self.index),
                self.index.to_string(),
                "[0, 15]",
            ),
            (
                "AttenuatorPercentage",
                (0.0..=100.0).contains(&self.parameters.attenuator_percentage),
                self.parameters.attenuator_percentage.to_string(),
                "[0, 100]",
            ),
            (
                "PpDivider",
                (1..=1000).contains(&self.parameters.pp_divider),
                self.parameters.pp_divider.to_string(),
                "[1, 1000]",
            ),
            (
                "HarmonicNumber",
                (1..=4).contains(&self.parameters.harmonic_number),
                self.parameters.harmonic_number.to_string(),
                "[1, 4]",
            ),
            (
                "PulseRepetitionRateInKhz",
                self.parameters.pulse_repetition_rate_in_khz > 0.0,
                self.parameters.pulse_repetition_rate_in_khz.to_string(),
                "(0, inf)",
            ),
        ];

        for (name, ok, value, range) in checks {
            if !ok {
                return Err(ParameterError::OutOfRange {
                    name: name.to_string(),
                    value,
                    range: range.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Preset`].
#[derive(Debug, Default)]
pub struct PresetBuilder {
    index: Option<i64>,
    name: Option<String>,
    parameters: PresetParameters,
}

impl PresetBuilder {
    #[must_use]
    pub fn index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn attenuator_percentage(mut self, value: f64) -> Self {
        self.parameters.attenuator_percentage = value;
        self
    }

    #[must_use]
    pub fn pp_divider(mut self, value: i64) -> Self {
        self.parameters.pp_divider = value;
        self
    }

    #[must_use]
    pub fn pulse_repetition_rate_in_khz(mut self, value: f64) -> Self {
        self.parameters.pulse_repetition_rate_in_khz = value;
        self
    }

    #[must_use]
    pub fn ra_output_power_setpoint_in_w(mut self, value: f64) -> Self {
        self.parameters.ra_output_power_setpoint_in_w = value;
        self
    }

    #[must_use]
    pub fn harmonic_number(mut self, value: i64) -> Self {
        self.parameters.harmonic_number = value;
        self
    }

    /// Consume the builder, validate, and return a [`Preset`].
    ///
    /// # Errors
    ///
    /// Returns [`PharosError::BadParameter`] if the index is missing or any
    /// parameter is out of range.
    pub fn build(self) -> Result<Preset, PharosError> {
        let preset = Preset {
            index: self.index.unwrap_or(NONE_SELECTED),
            name: self.name.unwrap_or_else(|| "Virtual preset".to_string()),
            parameters: self.parameters,
            is_stored_in_pharos: true,
        };
        preset.validate()?;
        Ok(preset)
    }
}

/// The immutable preset catalog, keyed by slot index.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    slots: BTreeMap<i64, Preset>,
}

impl PresetCatalog {
    /// A catalog with every slot empty.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Store `preset` in its slot, replacing any previous occupant.
    #[must_use]
    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.slots.insert(preset.index, preset);
        self
    }

    /// Resolve a `SelectedPresetIndex` value to its preset.
    ///
    /// # Errors
    ///
    /// Returns [`PharosError::InvalidPreset`] for the sentinel or an empty slot.
    pub fn resolve(&self, index: i64) -> Result<&Preset, PharosError> {
        if index == NONE_SELECTED {
            return Err(InvalidPresetError::NoneSelected.into());
        }
        self.slots
            .get(&index)
            .ok_or_else(|| InvalidPresetError::EmptySlot(index).into())
    }

    /// Presets in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.slots.values()
    }

    /// JSON array of every stored preset, as reported by `Presets`.
    #[must_use]
    pub fn to_json(&self) -> Vec<serde_json::Value> {
        self.iter()
            .filter_map(|preset| serde_json::to_value(preset).ok())
            .collect()
    }
}

/// Attenuator setting of each factory preset, by slot.
const FACTORY_ATTENUATORS: [f64; 3] = [50.0, 75.0, 25.0];

impl Default for PresetCatalog {
    /// Slots 0-2 hold the factory defaults; the rest are empty.
    fn default() -> Self {
        (0_i64..)
            .zip(FACTORY_ATTENUATORS)
            .map(|(index, attenuator_percentage)| Preset {
                index,
                name: format!("Default preset {}", index + 1),
                parameters: PresetParameters {
                    attenuator_percentage,
                    ..PresetParameters::default()
                },
                is_stored_in_pharos: true,
            })
            .fold(Self::empty(), Self::with_preset)
    }
}
