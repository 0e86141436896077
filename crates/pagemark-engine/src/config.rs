// Imports
use crate::annotation::GeometryLimits;
use pagemark_compose::Viewport;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The eraser style.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    num_derive::FromPrimitive,
    num_derive::ToPrimitive,
)]
#[serde(rename = "eraser_style")]
pub enum EraserStyle {
    /// Trash every annotation near the pointer.
    #[serde(rename = "whole_object")]
    WholeObject,
    /// Cut ink strokes along the eraser circle.
    #[serde(rename = "split_strokes")]
    SplitStrokes,
}

impl Default for EraserStyle {
    fn default() -> Self {
        Self::WholeObject
    }
}

impl TryFrom<u32> for EraserStyle {
    type Error = anyhow::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        num_traits::FromPrimitive::from_u32(value).ok_or_else(|| {
            anyhow::anyhow!("EraserStyle try_from::<u32>() for value {} failed", value)
        })
    }
}

/// The eraser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "eraser_config")]
pub struct EraserConfig {
    /// The eraser width in pen units.
    #[serde(rename = "width")]
    pub width: f64,
    #[serde(rename = "style")]
    pub style: EraserStyle,
    /// The pixel tolerance of the whole-object eraser.
    #[serde(rename = "tolerance")]
    pub tolerance: f64,
    /// The window in milliseconds sampled pointer positions of the stroke eraser are coalesced over.
    #[serde(rename = "sample_window_ms")]
    pub sample_window_ms: u64,
}

impl Default for EraserConfig {
    fn default() -> Self {
        Self {
            width: Self::WIDTH_DEFAULT,
            style: EraserStyle::default(),
            tolerance: Self::TOLERANCE_DEFAULT,
            sample_window_ms: Self::SAMPLE_WINDOW_MS_DEFAULT,
        }
    }
}

impl EraserConfig {
    pub const WIDTH_MIN: f64 = 1.0;
    pub const WIDTH_MAX: f64 = 500.0;
    pub const WIDTH_DEFAULT: f64 = 12.0;
    pub const TOLERANCE_DEFAULT: f64 = 15.0;
    pub const SAMPLE_WINDOW_MS_DEFAULT: u64 = 16;

    /// The eraser width, clamped to the allowed range.
    pub fn width(&self) -> f64 {
        self.width.clamp(Self::WIDTH_MIN, Self::WIDTH_MAX)
    }

    /// The radius of the stroke eraser circle for a stroke with the given pixel width.
    pub fn circle_radius(&self, viewport: &Viewport, pixel_stroke_width: f64) -> f64 {
        self.width() * viewport.scale + pixel_stroke_width * 0.5
    }

    pub fn sample_window(&self) -> Duration {
        Duration::from_millis(self.sample_window_ms)
    }
}

/// The selector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "selector_config")]
pub struct SelectorConfig {
    /// Lock the aspect ratio when resizing, as if the proportional modifier was always pressed.
    #[serde(rename = "resize_lock_aspectratio")]
    pub resize_lock_aspectratio: bool,
    /// Pixel tolerance when hit testing annotations and handles.
    #[serde(rename = "hit_tolerance")]
    pub hit_tolerance: f64,
    /// Pixel margin of the snap pass at gesture end. Zero derives it per annotation from its safe margin.
    #[serde(rename = "snap_margin")]
    pub snap_margin: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            resize_lock_aspectratio: false,
            hit_tolerance: 4.0,
            snap_margin: 0.0,
        }
    }
}

/// The engine configuration. Used when loading/saving the current configuration from/into persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "engine_config")]
pub struct EngineConfig {
    #[serde(rename = "eraser_config")]
    pub eraser_config: EraserConfig,
    #[serde(rename = "selector_config")]
    pub selector_config: SelectorConfig,
    /// Edits within this many milliseconds of each other are committed as one undo entry.
    #[serde(rename = "commit_debounce_ms")]
    pub commit_debounce_ms: u64,
    #[serde(rename = "history_max_len")]
    pub history_max_len: usize,
    /// Lower bound of the safe margin in pixels, for annotations without a stroke.
    #[serde(rename = "min_safe_margin")]
    pub min_safe_margin: f64,
    /// Minimum width and height in pixels of resized annotations.
    #[serde(rename = "min_size")]
    pub min_size: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eraser_config: EraserConfig::default(),
            selector_config: SelectorConfig::default(),
            commit_debounce_ms: 300,
            history_max_len: 100,
            min_safe_margin: 1.0,
            min_size: 8.0,
        }
    }
}

impl EngineConfig {
    /// Load the config from a JSON string.
    pub fn load_from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save the config as a JSON string.
    pub fn save_as_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn commit_debounce(&self) -> Duration {
        Duration::from_millis(self.commit_debounce_ms)
    }

    /// The geometric limits annotations are mutated with for the viewport.
    pub fn geometry_limits(&self, viewport: Viewport) -> GeometryLimits {
        GeometryLimits {
            viewport,
            min_safe_margin: self.min_safe_margin,
            min_size: self.min_size,
        }
    }
}
