//! Polling loop tying the detector to the devices
//!
//! This module handles:
//! - Pulling one classification event per cycle
//! - Turning it into device commands through the dispatch state machine
//! - Running those commands in order and logging their outcome
//! - Pacing the loop with the fixed poll delay

mod dispatcher;

pub use dispatcher::{DeviceDispatcher, DispatchConfig, RunSummary};
