//! Device dispatcher - runs the polling loop

use crate::detector::EventSource;
use crate::device::{CommandOutcome, DeviceCommandRunner, ExecutableTable};
use anyhow::Result;
use fpga_dispatch_shared::{
    timing, ClassificationEvent, CommandAction, DeviceCommand, DeviceDispatch, DeviceMapping,
    DispatcherState,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the dispatch loop
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Delay after each processed event
    pub poll_delay: Duration,
    /// Used to render commands in log lines
    pub executables: ExecutableTable,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_delay: Duration::from_millis(timing::POLL_DELAY_MS),
            executables: ExecutableTable::default(),
        }
    }
}

/// Counters for one run of the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub events: u64,
    /// Events with no detection or an unmapped label
    pub ignored: u64,
    pub commands: u64,
    pub command_failures: u64,
    pub switches: u64,
}

/// Drives device commands from a stream of classification events
pub struct DeviceDispatcher<R> {
    config: DispatchConfig,
    dispatch: DeviceDispatch,
    runner: R,
    state: DispatcherState,
    summary: RunSummary,
}

impl<R: DeviceCommandRunner> DeviceDispatcher<R> {
    pub fn new(config: DispatchConfig, mapping: DeviceMapping, runner: R) -> Self {
        Self {
            config,
            dispatch: DeviceDispatch::new(mapping),
            runner,
            state: DispatcherState::new(),
            summary: RunSummary::default(),
        }
    }

    /// Get the current dispatch state
    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Counters so far
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run until the source is exhausted.
    ///
    /// Device failures are logged and never stop the loop; only an error from
    /// the source itself is returned.
    pub async fn run<S: EventSource>(&mut self, source: &mut S) -> Result<RunSummary> {
        info!(
            "[DISPATCH] Polling {} detector every {:?}",
            source.name(),
            self.config.poll_delay
        );

        while let Some(event) = source.next_event().await? {
            self.handle_event(&event).await;
            tokio::time::sleep(self.config.poll_delay).await;
        }

        info!(
            "[DISPATCH] Detector stream ended: {} events, {} commands ({} failed), {} switches",
            self.summary.events,
            self.summary.commands,
            self.summary.command_failures,
            self.summary.switches
        );
        Ok(self.summary)
    }

    /// Process one event and run its commands in order
    pub async fn handle_event(&mut self, event: &ClassificationEvent) {
        self.summary.events += 1;
        let previous = self.state.previous_active_device();

        let commands = match self.dispatch.process_event(event, &mut self.state) {
            Some(commands) => commands,
            None => {
                self.summary.ignored += 1;
                match event.class_label() {
                    Some(label) => debug!("[DISPATCH] Frame {}: unmapped label {:?}", event.frame_id, label),
                    None => debug!("[DISPATCH] Frame {}: nothing detected", event.frame_id),
                }
                return;
            }
        };

        let current = self.state.previous_active_device();
        if current != previous {
            self.summary.switches += 1;
            if let Some(kind) = current {
                info!(
                    "[DISPATCH] Frame {}: switching {} -> {}",
                    event.frame_id,
                    previous.map_or_else(|| "none".to_string(), |k| k.to_string()),
                    kind
                );
            }
        }

        for command in &commands {
            self.execute(command).await;
        }
    }

    async fn execute(&mut self, command: &DeviceCommand) {
        self.summary.commands += 1;
        let verb = match command.action {
            CommandAction::Activate => "on",
            CommandAction::Deactivate => "off",
        };

        match self.runner.run(command).await {
            Ok(CommandOutcome::Succeeded) => {
                debug!(
                    "[DEVICE] {} {}: {:?}",
                    command.kind,
                    verb,
                    self.config.executables.argv(command)
                );
            }
            Ok(CommandOutcome::ExitedWith { code }) => {
                self.summary.command_failures += 1;
                warn!(
                    "[DEVICE] {} {} exited with {}: {:?}",
                    command.kind,
                    verb,
                    code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                    self.config.executables.argv(command)
                );
            }
            Err(e) => {
                self.summary.command_failures += 1;
                warn!("[DEVICE] {} {} failed: {:#}", command.kind, verb, e);
            }
        }
    }
}
