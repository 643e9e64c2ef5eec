//! FPGA Dispatch Shared Types
//!
//! Runtime-free core of the FPGA device dispatcher: the peripheral model,
//! the label to device table, the dispatch state machine and the framing
//! used by the detector stream.

pub mod codec;
pub mod device;
pub mod event;
pub mod mapping;
pub mod state_machine;

use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at crate root
pub use device::{CommandAction, CommandSequence, DeviceCommand, DeviceKind};
pub use event::{ClassificationEvent, Detection};
pub use mapping::{ClassLabel, DeviceMapping, DeviceTarget, MappingError};
pub use state_machine::{DeviceDispatch, DispatcherState};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Timing parameters for the dispatch loop and detector link
pub mod timing {
    /// Delay after each processed event before polling the next one
    pub const POLL_DELAY_MS: u64 = 300;

    /// Initial delay before reconnecting to the detector
    pub const RECONNECT_DELAY_MS: u64 = 1000;

    /// Upper bound for the reconnect backoff
    pub const MAX_RECONNECT_DELAY_MS: u64 = 30_000;

    /// Timeout for a single detector connection attempt
    pub const CONNECT_TIMEOUT_MS: u64 = 5000;

    /// Detector silence that drops the connection; well above the frame cadence
    pub const READ_TIMEOUT_MS: u64 = 15_000;
}
