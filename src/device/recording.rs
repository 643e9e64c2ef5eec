//! In-memory runner for exercising the dispatch loop

use super::{CommandOutcome, DeviceCommandRunner};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use fpga_dispatch_shared::{DeviceCommand, DeviceKind};
use std::sync::Mutex;

/// Records every command and fails the ones for `failing` devices
#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<DeviceCommand>>,
    failing: Vec<DeviceKind>,
    missing: Vec<DeviceKind>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devices whose program exits non-zero
    pub fn failing(mut self, kinds: &[DeviceKind]) -> Self {
        self.failing = kinds.to_vec();
        self
    }

    /// Devices whose program cannot be started
    pub fn missing(mut self, kinds: &[DeviceKind]) -> Self {
        self.missing = kinds.to_vec();
        self
    }

    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DeviceCommandRunner for RecordingRunner {
    async fn run(&self, command: &DeviceCommand) -> Result<CommandOutcome> {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command.clone());
        }

        if self.missing.contains(&command.kind) {
            return Err(anyhow!("No such file: {}", command.kind));
        }
        if self.failing.contains(&command.kind) {
            return Ok(CommandOutcome::ExitedWith { code: Some(1) });
        }
        Ok(CommandOutcome::Succeeded)
    }
}
