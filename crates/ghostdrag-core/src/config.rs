//! Configuration for the engine and its adapters.

use crate::error::DragResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default pixel displacement before a pressed source starts dragging.
pub const DEFAULT_START_THRESHOLD: f64 = 10.0;

/// Engine-wide tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Minimum time between two processed pointer moves.
    pub sample_interval_ms: u64,
    /// Quiet period after the last resize before the viewport is measured again.
    pub resize_debounce_ms: u64,
    /// Delay between two auto-scroll nudges (0 = every tick).
    pub scroll_interval_ms: u64,
    /// Pixels scrolled per auto-scroll nudge.
    pub scroll_step: f64,
    /// Extra pixels on the far edges that already count as "at the edge".
    pub scroll_edge_bias: f64,
    /// Stacking order given to ghost elements.
    pub ghost_z_index: i32,
    /// Viewport cursor while an item is dragged.
    pub drag_cursor: String,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 16,
            resize_debounce_ms: 100,
            scroll_interval_ms: 0,
            scroll_step: 1.0,
            scroll_edge_bias: 2.0,
            ghost_z_index: 10000,
            drag_cursor: "move".to_string(),
        }
    }
}

impl DragConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> DragResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_interval_ms)
    }
}

/// Per-registration settings supplied by a drag source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSourceConfig {
    /// Selector of the container drags are confined to.
    pub viewport: Option<String>,
    /// Space-separated classes put on the source element while it is dragged.
    pub dragged_class: Option<String>,
    /// Space-separated classes put on the ghost element.
    pub dragging_class: Option<String>,
    /// Pixels the pointer must travel on either axis before the drag starts.
    pub start_threshold: f64,
}

impl Default for DragSourceConfig {
    fn default() -> Self {
        Self {
            viewport: None,
            dragged_class: None,
            dragging_class: None,
            start_threshold: DEFAULT_START_THRESHOLD,
        }
    }
}

impl DragSourceConfig {
    pub fn from_json(json: &str) -> DragResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Per-drop-target settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropTargetConfig {
    /// Classes applied on hover when the host accepts the dragged item.
    pub droppable_class: Option<String>,
    /// Classes applied on hover when the host rejects the dragged item.
    pub not_droppable_class: Option<String>,
    /// Delay before hover classes are applied, to limit flicker.
    pub hover_delay_ms: u64,
}

impl DropTargetConfig {
    pub fn from_json(json: &str) -> DragResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }
}
