//! Detector output messages
//!
//! The detector sidecar emits one `ClassificationEvent` per inference cycle.

use crate::now_ms;
use prost::Message;

/// A single detected object
#[derive(Clone, PartialEq, Message)]
pub struct Detection {
    #[prost(string, tag = "1")]
    pub class_label: String,

    /// Model confidence in [0, 1]; carried for logging only
    #[prost(float, tag = "2")]
    pub confidence: f32,
}

/// One inference cycle's result
#[derive(Clone, PartialEq, Message)]
pub struct ClassificationEvent {
    #[prost(uint64, tag = "1")]
    pub frame_id: u64,

    #[prost(uint64, tag = "2")]
    pub timestamp_ms: u64,

    #[prost(message, optional, tag = "3")]
    pub detection: Option<Detection>,
}

impl ClassificationEvent {
    /// Event for a frame with nothing detected
    pub fn empty(frame_id: u64) -> Self {
        Self {
            frame_id,
            timestamp_ms: now_ms(),
            detection: None,
        }
    }

    /// Event for a frame with one detected object
    pub fn detected(frame_id: u64, class_label: impl Into<String>, confidence: f32) -> Self {
        Self {
            frame_id,
            timestamp_ms: now_ms(),
            detection: Some(Detection {
                class_label: class_label.into(),
                confidence,
            }),
        }
    }

    /// Label of the detected object, if any
    pub fn class_label(&self) -> Option<&str> {
        self.detection.as_ref().map(|d| d.class_label.as_str())
    }
}
