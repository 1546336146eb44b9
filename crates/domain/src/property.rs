//! Declarative property table.
//!
//! Every simulated attribute is described once here (type, range, and the
//! states in which it may be read or written) and every read or write is
//! checked against this table by [`crate::validation`].

use crate::state::{LaserState, StateSet};
use crate::tier::Tier;
use crate::value::{ValueRange, ValueType};

/// Where a property's current value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Held in the [`PropertyStore`](crate::store::PropertyStore).
    Stored,
    /// Held in the store; a successful write also copies the value to the
    /// named property (target → actual coupling).
    Coupled(&'static str),
    /// Computed on read from the state machine, the store, or the catalogs.
    Derived(Derived),
}

/// Read-outs computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derived {
    StateName,
    GeneralStatus,
    StateId,
    OutputEnabled,
    PpOpened,
    OutputPower,
    OutputFrequency,
    OutputEnergy,
    Presets,
    WrapperFunctions,
}

/// Metadata for one property.
#[derive(Debug, Clone, Copy)]
pub struct PropertySpec {
    pub name: &'static str,
    pub tier: Tier,
    pub value_type: ValueType,
    pub range: Option<ValueRange>,
    pub readable_in: StateSet,
    pub writable_in: StateSet,
    pub source: Source,
}

impl PropertySpec {
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.writable_in.is_empty()
    }
}

/// Variants reported by `GeneralStatus`.
pub const GENERAL_STATUSES: &[&str] = &[
    "Disconnected",
    "Off",
    "Standby",
    "Operational",
    "EmissionOn",
];

const ATTENUATOR_RANGE: Option<ValueRange> = Some(ValueRange::Float {
    min: 0.0,
    max: 100.0,
});
const PP_DIVIDER_RANGE: Option<ValueRange> = Some(ValueRange::Integer { min: 1, max: 1000 });

const SETTLED: StateSet = StateSet::of(&[
    LaserState::Off,
    LaserState::StandingBy,
    LaserState::Operational,
]);

const fn read_only(
    name: &'static str,
    tier: Tier,
    value_type: ValueType,
    readable_in: StateSet,
    source: Source,
) -> PropertySpec {
    PropertySpec {
        name,
        tier,
        value_type,
        range: None,
        readable_in,
        writable_in: StateSet::EMPTY,
        source,
    }
}

/// The full property table, grouped by tier.
pub static PROPERTIES: &[PropertySpec] = &[
    // Basic
    PropertySpec {
        range: ATTENUATOR_RANGE,
        ..read_only(
            "ActualAttenuatorPercentage",
            Tier::Basic,
            ValueType::Float,
            StateSet::CONNECTED,
            Source::Stored,
        )
    },
    PropertySpec {
        range: Some(ValueRange::Integer { min: 1, max: 4 }),
        ..read_only(
            "ActualHarmonic",
            Tier::Basic,
            ValueType::Integer,
            StateSet::CONNECTED,
            Source::Stored,
        )
    },
    read_only(
        "ActualOutputEnergy",
        Tier::Basic,
        ValueType::Float,
        StateSet::CONNECTED,
        Source::Derived(Derived::OutputEnergy),
    ),
    read_only(
        "ActualOutputFrequency",
        Tier::Basic,
        ValueType::Float,
        StateSet::CONNECTED,
        Source::Derived(Derived::OutputFrequency),
    ),
    read_only(
        "ActualOutputPower",
        Tier::Basic,
        ValueType::Float,
        StateSet::CONNECTED,
        Source::Derived(Derived::OutputPower),
    ),
    PropertySpec {
        range: PP_DIVIDER_RANGE,
        ..read_only(
            "ActualPpDivider",
            Tier::Basic,
            ValueType::Integer,
            StateSet::CONNECTED,
            Source::Stored,
        )
    },
    read_only(
        "ActualRaFrequency",
        Tier::Basic,
        ValueType::Float,
        StateSet::CONNECTED,
        Source::Stored,
    ),
    read_only(
        "ActualRaPower",
        Tier::Basic,
        ValueType::Float,
        StateSet::CONNECTED,
        Source::Stored,
    ),
    read_only(
        "ActualStateName",
        Tier::Basic,
        ValueType::String,
        StateSet::ALL,
        Source::Derived(Derived::StateName),
    ),
    read_only(
        "ActualStateName2",
        Tier::Basic,
        ValueType::String,
        StateSet::ALL,
        Source::Derived(Derived::StateName),
    ),
    read_only(
        "Errors",
        Tier::Basic,
        ValueType::List,
        StateSet::ALL,
        Source::Stored,
    ),
    read_only(
        "GeneralStatus",
        Tier::Basic,
        ValueType::Enum(GENERAL_STATUSES),
        StateSet::ALL,
        Source::Derived(Derived::GeneralStatus),
    ),
    read_only(
        "IsOutputEnabled",
        Tier::Basic,
        ValueType::Bool,
        StateSet::CONNECTED,
        Source::Derived(Derived::OutputEnabled),
    ),
    PropertySpec {
        name: "SelectedPresetIndex",
        tier: Tier::Basic,
        value_type: ValueType::Integer,
        range: Some(ValueRange::Integer {
            min: crate::preset::NONE_SELECTED,
            max: crate::preset::SLOT_COUNT - 1,
        }),
        readable_in: StateSet::CONNECTED,
        writable_in: StateSet::CONNECTED,
        source: Source::Stored,
    },
    PropertySpec {
        name: "TargetAttenuatorPercentage",
        tier: Tier::Basic,
        value_type: ValueType::Float,
        range: ATTENUATOR_RANGE,
        readable_in: StateSet::CONNECTED,
        writable_in: StateSet::CONNECTED,
        source: Source::Coupled("ActualAttenuatorPercentage"),
    },
    PropertySpec {
        name: "TargetPpDivider",
        tier: Tier::Basic,
        value_type: ValueType::Integer,
        range: PP_DIVIDER_RANGE,
        readable_in: StateSet::CONNECTED,
        writable_in: SETTLED,
        source: Source::Coupled("ActualPpDivider"),
    },
    read_only(
        "Warnings",
        Tier::Basic,
        ValueType::List,
        StateSet::ALL,
        Source::Stored,
    ),
    // Advanced
    read_only(
        "ActualStateId",
        Tier::Advanced,
        ValueType::Integer,
        StateSet::ALL,
        Source::Derived(Derived::StateId),
    ),
    read_only(
        "IsPpOpened",
        Tier::Advanced,
        ValueType::Bool,
        StateSet::CONNECTED,
        Source::Derived(Derived::PpOpened),
    ),
    read_only(
        "IsRemoteInterlockActive",
        Tier::Advanced,
        ValueType::Bool,
        StateSet::CONNECTED,
        Source::Stored,
    ),
    PropertySpec {
        name: "IsShutterUsedToControlOutput",
        tier: Tier::Advanced,
        value_type: ValueType::Bool,
        range: None,
        readable_in: StateSet::CONNECTED,
        writable_in: SETTLED,
        source: Source::Stored,
    },
    read_only(
        "Presets",
        Tier::Advanced,
        ValueType::List,
        StateSet::CONNECTED,
        Source::Derived(Derived::Presets),
    ),
    // Raw
    read_only(
        "AvailableWrapperFunctions",
        Tier::Raw,
        ValueType::List,
        StateSet::ALL,
        Source::Derived(Derived::WrapperFunctions),
    ),
];

/// Find the property called `name` in `tier`.
#[must_use]
pub fn lookup(tier: Tier, name: &str) -> Option<&'static PropertySpec> {
    PROPERTIES
        .iter()
        .find(|spec| spec.tier == tier && spec.name == name)
}

/// Find the property called `name` in any tier.
#[must_use]
pub fn find(name: &str) -> Option<&'static PropertySpec> {
    PROPERTIES.iter().find(|spec| spec.name == name)
}

/// Every property of `tier`, in table order.
pub fn in_tier(tier: Tier) -> impl Iterator<Item = &'static PropertySpec> {
    PROPERTIES.iter().filter(move |spec| spec.tier == tier)
}
