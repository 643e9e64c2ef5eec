//! Device command execution
//!
//! This module handles:
//! - Resolving each FPGA peripheral to its control program
//! - Running device commands as child processes, one at a time
//! - Reporting exit status back to the dispatch loop

mod runner;

#[cfg(test)]
pub mod recording;

pub use runner::{CommandOutcome, DeviceCommandRunner, ExecutableTable, ProcessRunner};
