//! LaMetric frame schema and the mapping from upstream numbers into it.
//!
//! The device binds icons to slot positions, so the layout is fixed at
//! startup and every response carries exactly one frame per slot.

pub mod format;
pub mod layout;

use serde::{Deserialize, Serialize};

pub use format::{format_count, format_frames, PLACEHOLDER_DISABLED, PLACEHOLDER_UNAVAILABLE};
pub use layout::{FrameLayout, FrameSlot, RepoField, SlotSource};

/// One display unit rendered by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFrame {
    /// LaMetric icon id (e.g. "i1234").
    pub icon: String,
    /// Text shown next to the icon.
    pub text: String,
}

impl DisplayFrame {
    /// Create a frame.
    pub fn new(icon: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            text: text.into(),
        }
    }

    /// Whether the frame carries a placeholder instead of a real value.
    pub fn is_placeholder(&self) -> bool {
        self.text == PLACEHOLDER_UNAVAILABLE || self.text == PLACEHOLDER_DISABLED
    }
}

/// Body of the polling endpoint, in the shape the device expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameResponse {
    /// Frames in slot order.
    pub frames: Vec<DisplayFrame>,
}

impl FrameResponse {
    /// Number of frames holding a placeholder.
    pub fn placeholder_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_placeholder()).count()
    }
}
