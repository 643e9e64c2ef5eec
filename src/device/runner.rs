//! Device command runner - invokes the FPGA test programs

use anyhow::{Context, Result};
use async_trait::async_trait;
use fpga_dispatch_shared::{DeviceCommand, DeviceKind};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Result of running one device command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Program exited with status 0
    Succeeded,
    /// Program exited non-zero, or was killed by a signal (`code` is `None`)
    ExitedWith { code: Option<i32> },
}

/// Executes device commands
#[async_trait]
pub trait DeviceCommandRunner: Send + Sync {
    /// Run `command` to completion. `Err` means the program could not be started.
    async fn run(&self, command: &DeviceCommand) -> Result<CommandOutcome>;
}

/// Control program for each device
#[derive(Debug, Clone)]
pub struct ExecutableTable {
    pub dot_matrix: PathBuf,
    pub led: PathBuf,
    pub text_lcd: PathBuf,
    pub fnd: PathBuf,
    pub buzzer: PathBuf,
}

impl ExecutableTable {
    /// Table with every program under one directory, using the board's file names
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            dot_matrix: dir.join("fpga_test_dot"),
            led: dir.join("fpga_test_led"),
            text_lcd: dir.join("fpga_test_text_lcd"),
            fnd: dir.join("fpga_test_fnd"),
            buzzer: dir.join("fpga_test_buzzer"),
        }
    }

    pub fn path_for(&self, kind: DeviceKind) -> &Path {
        match kind {
            DeviceKind::DotMatrix => &self.dot_matrix,
            DeviceKind::Led => &self.led,
            DeviceKind::TextLcd => &self.text_lcd,
            DeviceKind::Fnd => &self.fnd,
            DeviceKind::Buzzer => &self.buzzer,
        }
    }

    /// Full argv for a command, program first
    pub fn argv(&self, command: &DeviceCommand) -> Vec<String> {
        let mut argv = Vec::with_capacity(command.args.len() + 1);
        argv.push(self.path_for(command.kind).display().to_string());
        argv.extend(command.args.iter().cloned());
        argv
    }
}

impl Default for ExecutableTable {
    fn default() -> Self {
        Self::in_dir("/home/kjh/Modules")
    }
}

/// Runs device commands as child processes
pub struct ProcessRunner {
    executables: ExecutableTable,
}

impl ProcessRunner {
    pub fn new(executables: ExecutableTable) -> Self {
        Self { executables }
    }
}

#[async_trait]
impl DeviceCommandRunner for ProcessRunner {
    async fn run(&self, command: &DeviceCommand) -> Result<CommandOutcome> {
        let program = self.executables.path_for(command.kind);

        let status = Command::new(program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .with_context(|| format!("Failed to run {}", program.display()))?;

        if status.success() {
            Ok(CommandOutcome::Succeeded)
        } else {
            Ok(CommandOutcome::ExitedWith {
                code: status.code(),
            })
        }
    }
}
