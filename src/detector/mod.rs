//! Detector event sources
//!
//! This module handles:
//! - The `EventSource` seam between the detector sidecar and the dispatcher
//! - Length-prefixed protobuf events over TCP, with automatic reconnection
//! - Line-oriented text events on stdin

mod line;
mod source;
mod tcp;

pub use line::LineEventSource;
pub use source::{DetectorConfig, DetectorInput, EventSource};
pub use tcp::TcpEventSource;
