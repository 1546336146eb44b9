//! Command dispatcher: the single entry point to the simulated device.
//!
//! Resolves a `(tier, name)` pair to a property read or write, a state
//! transition, a preset application, or a raw wrapper call. The state
//! machine, property store, preset catalog, and register bank sit behind one
//! mutex so every operation is linearizable; events are published while the
//! lock is held so subscribers see them in commit order.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use pharos_domain::action::Action;
use pharos_domain::error::{
    Access, NotFoundError, PharosError, StateForbiddenError, TargetKind,
};
use pharos_domain::event::DeviceEvent;
use pharos_domain::preset::PresetCatalog;
use pharos_domain::property;
use pharos_domain::state::{LaserState, StateSet};
use pharos_domain::state_machine::{StateChange, StateMachine, Transition};
use pharos_domain::store::{PropertyChange, PropertyStore, ReadContext};
use pharos_domain::tier::Tier;
use pharos_domain::validation::validate_invoke;
use pharos_domain::value::{Input, PropertyValue};
use pharos_domain::wrapper::{Primitive, RegisterBank, WrapperCall};

use crate::ports::EventPublisher;

/// Snapshot used by the info endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    pub state: LaserState,
    pub output_enabled: bool,
}

/// Result of a successful `POST /{tier}/{action}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Transition { action: Action, change: StateChange },
    PresetApplied { index: i64 },
    Wrapper { function: String, result: Value },
}

impl ActionOutcome {
    /// Human-readable confirmation.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Transition { action, .. } => match action {
                Action::TurnOn => "Laser turned on successfully".to_string(),
                Action::TurnOff => "Laser turned off successfully".to_string(),
                Action::EnableOutput => "Output enabled successfully".to_string(),
                Action::CloseOutput => "Output closed successfully".to_string(),
                Action::GoToStandby => "Transitioned to standby successfully".to_string(),
                Action::Connect => "Laser connected successfully".to_string(),
                Action::CompleteWarmUp => "Warm-up completed successfully".to_string(),
                other => format!("{other} completed successfully"),
            },
            Self::PresetApplied { index } => format!("Preset {index} applied successfully"),
            Self::Wrapper { function, .. } => format!("{function} executed"),
        }
    }
}

/// Everything one simulated laser owns.
#[derive(Debug)]
struct Device {
    machine: StateMachine,
    store: PropertyStore,
    presets: PresetCatalog,
    registers: RegisterBank,
}

impl Device {
    fn context(&self) -> ReadContext<'_> {
        ReadContext {
            state: self.machine.state(),
            presets: &self.presets,
        }
    }
}

/// Application service owning the device.
pub struct CommandDispatcher<P> {
    device: Mutex<Device>,
    publisher: P,
}

impl<P: EventPublisher> CommandDispatcher<P> {
    /// Create a dispatcher for a fresh, `Disconnected` device.
    pub fn new(presets: PresetCatalog, publisher: P) -> Self {
        Self {
            device: Mutex::new(Device {
                machine: StateMachine::new(),
                store: PropertyStore::new(),
                presets,
                registers: RegisterBank::default(),
            }),
            publisher,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Device> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_state(&self, change: StateChange) {
        if change.is_change() {
            tracing::info!(
                transition = %change.transition,
                from = %change.from,
                to = %change.to,
                "state changed"
            );
            self.publisher.publish(change.into());
        }
    }

    fn publish_properties(&self, changes: &[PropertyChange]) {
        for change in changes {
            tracing::debug!(property = change.name, value = %change.value, "property changed");
            self.publisher.publish(DeviceEvent::from(change.clone()));
        }
    }

    /// Walk the power-up path to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`PharosError::InvalidTransition`] if the device is already
    /// past `target`.
    #[tracing::instrument(skip(self))]
    pub fn boot(&self, target: LaserState) -> Result<LaserState, PharosError> {
        let mut device = self.lock();
        let changes = device.machine.boot_to(target)?;
        for change in changes {
            self.publish_state(change);
        }
        Ok(device.machine.state())
    }

    /// Current state and output flag.
    #[must_use]
    pub fn status(&self) -> DeviceStatus {
        let device = self.lock();
        DeviceStatus {
            state: device.machine.state(),
            output_enabled: device.machine.is_output_enabled(),
        }
    }

    /// Read one property.
    ///
    /// # Errors
    ///
    /// `NotFound` if the tier has no such property, `StateForbidden` if it is
    /// not readable in the current state.
    #[tracing::instrument(skip(self))]
    pub fn get(&self, tier: Tier, name: &str) -> Result<PropertyValue, PharosError> {
        let device = self.lock();
        device
            .store
            .get(tier, name, &device.context())
            .inspect(|value| tracing::debug!(%value, "property read"))
            .inspect_err(|err| tracing::warn!(error = %err, "read rejected"))
    }

    /// Write one property. Returns the committed values, the written
    /// property first and its coupled counterpart after.
    ///
    /// # Errors
    ///
    /// The first failing validation check; nothing is written.
    #[tracing::instrument(skip(self, input), fields(input = %input))]
    pub fn set(
        &self,
        tier: Tier,
        name: &str,
        input: &Input,
    ) -> Result<Vec<PropertyChange>, PharosError> {
        let mut device = self.lock();
        let state = device.machine.state();
        let changes = device
            .store
            .set(tier, name, input, state)
            .inspect_err(|err| tracing::warn!(error = %err, "write rejected"))?;
        self.publish_properties(&changes);
        Ok(changes)
    }

    /// Every property of `tier` readable in the current state.
    #[must_use]
    #[tracing::instrument(skip(self))]
    pub fn batch_get(&self, tier: Tier) -> BTreeMap<&'static str, PropertyValue> {
        let device = self.lock();
        device.store.batch_get(tier, &device.context())
    }

    /// Invoke the action `name` of `tier`. `body` is only read by
    /// `ExecuteWrapperFunction`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown action or wrapper function, `StateForbidden`
    /// outside an action's state gate, `InvalidTransition` when the state
    /// machine has no matching edge, `InvalidPreset` when the selected slot
    /// is empty, and `BadParameter` for malformed wrapper arguments.
    #[tracing::instrument(skip(self, body))]
    pub fn invoke(&self, tier: Tier, name: &str, body: &str) -> Result<ActionOutcome, PharosError> {
        let mut device = self.lock();
        let state = device.machine.state();
        let result = validate_invoke(tier, name, state).and_then(|action| {
            match (action, action.transition()) {
                (_, Some(transition)) => self.transition(&mut device, action, transition),
                (Action::ApplySelectedPreset, None) => self.apply_selected_preset(&mut device),
                (_, None) => self.execute_wrapper(&mut device, body),
            }
        });
        result.inspect_err(|err| tracing::warn!(error = %err, "action rejected"))
    }

    fn transition(
        &self,
        device: &mut Device,
        action: Action,
        transition: Transition,
    ) -> Result<ActionOutcome, PharosError> {
        let change = device.machine.apply(transition)?;
        self.publish_state(change);
        Ok(ActionOutcome::Transition { action, change })
    }

    fn apply_selected_preset(&self, device: &mut Device) -> Result<ActionOutcome, PharosError> {
        let ctx = device.context();
        let index = device
            .store
            .get(Tier::Basic, "SelectedPresetIndex", &ctx)?
            .as_i64()
            .unwrap_or(pharos_domain::preset::NONE_SELECTED);
        let parameters = device.presets.resolve(index)?.parameters.clone();

        let state = device.machine.state();
        let changes = device.store.apply_preset(&parameters, state)?;
        tracing::info!(index, "preset applied");
        self.publish_properties(&changes);
        Ok(ActionOutcome::PresetApplied { index })
    }

    fn execute_wrapper(&self, device: &mut Device, body: &str) -> Result<ActionOutcome, PharosError> {
        let call = WrapperCall::parse(body)?;
        let primitive = call.resolve()?;
        let state = device.machine.state();

        let result = match primitive {
            Primitive::Ping => Value::from("pong"),
            Primitive::GetStateId => Value::from(state.state_id()),
            Primitive::ReadRegister { address } => Value::from(device.registers.read(address)),
            Primitive::WriteRegister { address, value } => {
                if !state.is_connected() {
                    return Err(StateForbiddenError {
                        target: "WriteRegister".to_string(),
                        access: Access::Invoke,
                        state,
                        allowed: StateSet::CONNECTED,
                    }
                    .into());
                }
                let previous = device.registers.write(address, value);
                tracing::debug!(address, value, previous, "register written");
                Value::from(previous)
            }
            Primitive::ReadProperty { name } => {
                let spec = find_property(&name)?;
                let value = device.store.get(spec.tier, spec.name, &device.context())?;
                to_json(&value)
            }
            Primitive::WriteProperty { name, value } => {
                let spec = find_property(&name)?;
                let changes = device.store.set(spec.tier, spec.name, &value, state)?;
                self.publish_properties(&changes);
                changes
                    .first()
                    .map_or(Value::Null, |change| to_json(&change.value))
            }
        };

        tracing::info!(function = %call.function_name, "wrapper function executed");
        Ok(ActionOutcome::Wrapper {
            function: call.function_name,
            result,
        })
    }
}

/// Resolve a property name across every tier.
fn find_property(name: &str) -> Result<&'static property::PropertySpec, PharosError> {
    property::find(name).ok_or_else(|| {
        NotFoundError {
            kind: TargetKind::Property,
            name: name.to_string(),
            tier: None,
        }
        .into()
    })
}

fn to_json(value: &PropertyValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharos_domain::error::{InvalidPresetError, ParameterError};
    use pharos_domain::event::EventKind;
    use pharos_domain::preset::Preset;

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<DeviceEvent>>,
    }

    impl RecordingPublisher {
        fn kinds(&self) -> Vec<EventKind> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.kind.clone())
                .collect()
        }

        fn clear(&self) {
            self.events.lock().unwrap().clear();
        }
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: DeviceEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn dispatcher_in(
        state: LaserState,
    ) -> CommandDispatcher<std::sync::Arc<RecordingPublisher>> {
        let publisher = std::sync::Arc::new(RecordingPublisher::default());
        let dispatcher = CommandDispatcher::new(PresetCatalog::default(), publisher);
        dispatcher.boot(state).unwrap();
        dispatcher.publisher.clear();
        dispatcher
    }

    fn text(raw: &str) -> Input {
        Input::Text(raw.to_string())
    }

    #[test]
    fn should_boot_through_legal_edges_and_publish_each_step() {
        let publisher = std::sync::Arc::new(RecordingPublisher::default());
        let dispatcher = CommandDispatcher::new(PresetCatalog::default(), publisher.clone());

        assert_eq!(
            dispatcher.boot(LaserState::Operational).unwrap(),
            LaserState::Operational
        );
        let transitions: Vec<_> = publisher
            .kinds()
            .into_iter()
            .filter_map(|kind| match kind {
                EventKind::StateChanged { transition, .. } => Some(transition),
                EventKind::PropertyChanged { .. } => None,
            })
            .collect();
        assert_eq!(
            transitions,
            vec![
                Transition::Connect,
                Transition::TurnOn,
                Transition::CompleteWarmUp
            ]
        );
    }

    #[test]
    fn should_reject_enable_output_until_warm_up_completes() {
        let dispatcher = dispatcher_in(LaserState::Off);

        dispatcher.invoke(Tier::Basic, "TurnOn", "").unwrap();
        let result = dispatcher.invoke(Tier::Basic, "EnableOutput", "");
        assert!(matches!(result, Err(PharosError::InvalidTransition(_))));
        assert_eq!(dispatcher.status().state, LaserState::StandingBy);

        dispatcher.invoke(Tier::Advanced, "CompleteWarmUp", "").unwrap();
        let outcome = dispatcher.invoke(Tier::Basic, "EnableOutput", "").unwrap();
        assert_eq!(outcome.message(), "Output enabled successfully");
        assert_eq!(
            dispatcher.status(),
            DeviceStatus {
                state: LaserState::EmissionOn,
                output_enabled: true
            }
        );
    }

    #[test]
    fn should_turn_off_idempotently_from_every_state() {
        for state in LaserState::ALL {
            let dispatcher = dispatcher_in(state);
            for _ in 0..3 {
                dispatcher.invoke(Tier::Basic, "TurnOff", "").unwrap();
            }
            assert_eq!(
                dispatcher.status(),
                DeviceStatus {
                    state: LaserState::Off,
                    output_enabled: false
                }
            );
            assert_eq!(
                dispatcher.get(Tier::Basic, "IsOutputEnabled").unwrap(),
                PropertyValue::Bool(false)
            );
        }
    }

    #[test]
    fn should_publish_no_event_for_turn_off_while_off() {
        let dispatcher = dispatcher_in(LaserState::Off);
        dispatcher.invoke(Tier::Basic, "TurnOff", "").unwrap();
        assert!(dispatcher.publisher.kinds().is_empty());
    }

    #[test]
    fn should_write_target_and_publish_coupled_actual() {
        let dispatcher = dispatcher_in(LaserState::Operational);
        let changes = dispatcher
            .set(Tier::Basic, "TargetAttenuatorPercentage", &text("75.5"))
            .unwrap();

        assert_eq!(changes[0].value, PropertyValue::Float(75.5));
        assert_eq!(
            dispatcher
                .get(Tier::Basic, "ActualAttenuatorPercentage")
                .unwrap(),
            PropertyValue::Float(75.5)
        );
        assert_eq!(dispatcher.publisher.kinds().len(), 2);
    }

    #[test]
    fn should_publish_nothing_for_rejected_write() {
        let dispatcher = dispatcher_in(LaserState::Operational);
        let result = dispatcher.set(Tier::Basic, "TargetAttenuatorPercentage", &text("150"));
        assert!(matches!(result, Err(PharosError::BadParameter(_))));
        assert!(dispatcher.publisher.kinds().is_empty());
    }

    #[test]
    fn should_apply_selected_preset() {
        let dispatcher = dispatcher_in(LaserState::Operational);
        dispatcher
            .set(Tier::Basic, "SelectedPresetIndex", &text("2"))
            .unwrap();

        let outcome = dispatcher
            .invoke(Tier::Basic, "ApplySelectedPreset", "")
            .unwrap();
        assert_eq!(outcome, ActionOutcome::PresetApplied { index: 2 });
        assert_eq!(
            dispatcher
                .get(Tier::Basic, "ActualAttenuatorPercentage")
                .unwrap(),
            PropertyValue::Float(25.0)
        );
    }

    #[test]
    fn should_report_invalid_preset_for_empty_slot_and_sentinel() {
        let dispatcher = dispatcher_in(LaserState::Operational);

        dispatcher
            .set(Tier::Basic, "SelectedPresetIndex", &text("9"))
            .unwrap();
        assert!(matches!(
            dispatcher.invoke(Tier::Basic, "ApplySelectedPreset", ""),
            Err(PharosError::InvalidPreset(InvalidPresetError::EmptySlot(9)))
        ));

        dispatcher
            .set(Tier::Basic, "SelectedPresetIndex", &text("-1"))
            .unwrap();
        assert!(matches!(
            dispatcher.invoke(Tier::Basic, "ApplySelectedPreset", ""),
            Err(PharosError::InvalidPreset(InvalidPresetError::NoneSelected))
        ));
    }

    #[test]
    fn should_forbid_preset_application_during_emission() {
        let dispatcher = dispatcher_in(LaserState::EmissionOn);
        let result = dispatcher.invoke(Tier::Basic, "ApplySelectedPreset", "");
        assert!(matches!(result, Err(PharosError::StateForbidden(_))));
    }

    #[test]
    fn should_apply_custom_catalog_preset() {
        let preset = Preset::builder()
            .index(7)
            .pp_divider(5)
            .build()
            .unwrap();
        let dispatcher = CommandDispatcher::new(
            PresetCatalog::empty().with_preset(preset),
            std::sync::Arc::new(RecordingPublisher::default()),
        );
        dispatcher.boot(LaserState::StandingBy).unwrap();
        dispatcher
            .set(Tier::Basic, "SelectedPresetIndex", &text("7"))
            .unwrap();
        dispatcher
            .invoke(Tier::Basic, "ApplySelectedPreset", "")
            .unwrap();
        assert_eq!(
            dispatcher.get(Tier::Basic, "ActualPpDivider").unwrap(),
            PropertyValue::Int(5)
        );
    }

    #[test]
    fn should_return_not_found_for_action_of_other_tier() {
        let dispatcher = dispatcher_in(LaserState::Disconnected);
        assert!(matches!(
            dispatcher.invoke(Tier::Basic, "Connect", ""),
            Err(PharosError::NotFound(_))
        ));
        dispatcher.invoke(Tier::Advanced, "Connect", "").unwrap();
        assert_eq!(dispatcher.status().state, LaserState::Off);
    }

    #[test]
    fn should_execute_ping_and_state_id() {
        let dispatcher = dispatcher_in(LaserState::Operational);
        let ping = dispatcher
            .invoke(Tier::Raw, "ExecuteWrapperFunction", r#"{"function_name":"Ping"}"#)
            .unwrap();
        assert_eq!(
            ping,
            ActionOutcome::Wrapper {
                function: "Ping".to_string(),
                result: Value::from("pong")
            }
        );

        let id = dispatcher
            .invoke(
                Tier::Raw,
                "ExecuteWrapperFunction",
                r#"{"function_name":"GetStateId"}"#,
            )
            .unwrap();
        assert!(matches!(id, ActionOutcome::Wrapper { result, .. } if result == 128));
    }

    #[test]
    fn should_round_trip_registers() {
        let dispatcher = dispatcher_in(LaserState::Off);
        let write = r#"{"function_name":"WriteRegister","args":{"address":16,"value":99}}"#;
        let read = r#"{"function_name":"ReadRegister","args":[16]}"#;

        dispatcher.invoke(Tier::Raw, "ExecuteWrapperFunction", write).unwrap();
        let outcome = dispatcher.invoke(Tier::Raw, "ExecuteWrapperFunction", read).unwrap();
        assert!(matches!(outcome, ActionOutcome::Wrapper { result, .. } if result == 99));
    }

    #[test]
    fn should_forbid_register_write_while_disconnected() {
        let dispatcher = dispatcher_in(LaserState::Disconnected);
        let result = dispatcher.invoke(
            Tier::Raw,
            "ExecuteWrapperFunction",
            r#"{"function_name":"WriteRegister","args":[1, 2]}"#,
        );
        assert!(matches!(result, Err(PharosError::StateForbidden(_))));
    }

    #[test]
    fn should_read_and_write_properties_across_tiers_through_wrapper() {
        let dispatcher = dispatcher_in(LaserState::Operational);
        dispatcher
            .invoke(
                Tier::Raw,
                "ExecuteWrapperFunction",
                r#"{"function_name":"WriteProperty","args":["TargetPpDivider", 3]}"#,
            )
            .unwrap();
        let outcome = dispatcher
            .invoke(
                Tier::Raw,
                "ExecuteWrapperFunction",
                r#"{"function_name":"ReadProperty","args":["ActualPpDivider"]}"#,
            )
            .unwrap();
        assert!(matches!(outcome, ActionOutcome::Wrapper { result, .. } if result == 3));
    }

    #[test]
    fn should_return_not_found_for_unknown_wrapper_function() {
        let dispatcher = dispatcher_in(LaserState::Operational);
        let result = dispatcher.invoke(
            Tier::Raw,
            "ExecuteWrapperFunction",
            r#"{"function_name":"Overclock"}"#,
        );
        assert!(matches!(result, Err(PharosError::NotFound(_))));
    }

    #[test]
    fn should_reject_malformed_wrapper_body() {
        let dispatcher = dispatcher_in(LaserState::Operational);
        let result = dispatcher.invoke(Tier::Raw, "ExecuteWrapperFunction", "not json");
        assert!(matches!(
            result,
            Err(PharosError::BadParameter(ParameterError::Malformed { .. }))
        ));
    }

    #[test]
    fn should_omit_unreadable_properties_from_batch() {
        let dispatcher = dispatcher_in(LaserState::Disconnected);
        let batch = dispatcher.batch_get(Tier::Advanced);
        assert_eq!(batch.keys().copied().collect::<Vec<_>>(), vec!["ActualStateId"]);
    }
}
