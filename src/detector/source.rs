//! Event source trait and detector configuration

use anyhow::Result;
use async_trait::async_trait;
use fpga_dispatch_shared::{timing, ClassificationEvent};
use std::time::Duration;

/// A lazy sequence of classification events
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next event; `Ok(None)` means the detector is gone for good
    async fn next_event(&mut self) -> Result<Option<ClassificationEvent>>;

    /// Human-readable name for this source
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<S: EventSource + ?Sized> EventSource for Box<S> {
    async fn next_event(&mut self) -> Result<Option<ClassificationEvent>> {
        (**self).next_event().await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Where detector events come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorInput {
    /// Detector sidecar serving framed events (e.g. "127.0.0.1:7070")
    Tcp { address: String },
    /// One event per line on standard input
    Stdin,
}

impl Default for DetectorInput {
    fn default() -> Self {
        Self::Tcp {
            address: "127.0.0.1:7070".into(),
        }
    }
}

impl DetectorInput {
    /// Pick the input from the first command-line argument
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Self::default(),
            Some("stdin") | Some("-") => Self::Stdin,
            Some(address) => Self::Tcp {
                address: address.to_string(),
            },
        }
    }
}

/// Configuration for the detector link
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub input: DetectorInput,
    /// Reconnection delay (initial)
    pub reconnect_delay: Duration,
    /// Maximum reconnection delay
    pub max_reconnect_delay: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Silence after which the link is considered dead
    pub read_timeout: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input: DetectorInput::default(),
            reconnect_delay: Duration::from_millis(timing::RECONNECT_DELAY_MS),
            max_reconnect_delay: Duration::from_millis(timing::MAX_RECONNECT_DELAY_MS),
            connect_timeout: Duration::from_millis(timing::CONNECT_TIMEOUT_MS),
            read_timeout: Duration::from_millis(timing::READ_TIMEOUT_MS),
        }
    }
}
