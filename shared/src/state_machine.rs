//! Device dispatch state machine
//!
//! Tracks the single most recently activated device and turns each
//! classification event into the commands needed to show it.

use crate::device::{CommandSequence, DeviceCommand, DeviceKind};
use crate::mapping::{DeviceMapping, DeviceTarget};
use crate::ClassificationEvent;

/// Dispatch memory carried between polling cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherState {
    previous_active_device: Option<DeviceKind>,
}

impl DispatcherState {
    /// Start with no device active
    pub fn new() -> Self {
        Self::default()
    }

    /// Device the dispatcher last switched to
    pub fn previous_active_device(&self) -> Option<DeviceKind> {
        self.previous_active_device
    }
}

/// Maps classification events to device commands
#[derive(Debug, Clone, Default)]
pub struct DeviceDispatch {
    mapping: DeviceMapping,
}

impl DeviceDispatch {
    pub fn new(mapping: DeviceMapping) -> Self {
        Self { mapping }
    }

    /// Resolve the event's detection against the mapping table
    pub fn resolve(&self, event: &ClassificationEvent) -> Option<DeviceTarget> {
        event.class_label().and_then(|label| self.mapping.resolve(label))
    }

    /// Process one event, returning the commands to run in order.
    ///
    /// Returns `None` and leaves `state` untouched when the event has no
    /// detection or its label is not in the table. Otherwise the sequence
    /// always ends with an activation of the target, even if it was already
    /// active; a deactivation of the previous device comes first when the
    /// target kind changed.
    pub fn process_event(
        &self,
        event: &ClassificationEvent,
        state: &mut DispatcherState,
    ) -> Option<CommandSequence> {
        let target = self.resolve(event)?;
        let mut commands = CommandSequence::with_capacity(2);

        if state.previous_active_device != Some(target.kind) {
            if let Some(off) = state.previous_active_device.and_then(DeviceCommand::deactivate) {
                commands.push(off);
            }
            state.previous_active_device = Some(target.kind);
        }

        commands.push(DeviceCommand::activate(target.kind, target.value));
        Some(commands)
    }
}
