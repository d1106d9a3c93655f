//! Scene configuration.

use crate::lights::{default_lights, Light};
use animator::{AnimatorTuning, FloatParams, FrameTiming};
use common::{SceneError, SceneResult, Size};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Asset node names the scene resolves at mount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeNames {
    /// Animated hand. Excluded from the stencil mask.
    pub hand_right: String,
    pub hand_left: String,
    /// Phone body parts, cloned into the phone group.
    pub phone_parts: Vec<String>,
    /// Node whose geometry is the phone screen.
    pub screen: String,
}

impl Default for NodeNames {
    fn default() -> Self {
        Self {
            hand_right: "hand-r".to_string(),
            hand_left: "hand-l".to_string(),
            phone_parts: vec![
                "Rectangle 4".to_string(),
                "Rectangle 3".to_string(),
                "Boolean 2".to_string(),
            ],
            screen: "screen".to_string(),
        }
    }
}

/// Local transforms of the composition groups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub root_position: Vec3,
    /// Y rotation of the right hand inside the animated group.
    pub hand_right_rotation_y: f32,
    pub inner_position: Vec3,
    pub inner_rotation_x: f32,
    pub hand_left_position: Vec3,
    pub phone_position: Vec3,
    /// Offset of the mask surface in front of the screen mesh.
    pub mask_position: Vec3,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root_position: Vec3::new(0.0, -50.0, 0.0),
            hand_right_rotation_y: 0.35,
            inner_position: Vec3::new(0.0, -50.0, 0.0),
            inner_rotation_x: -0.15,
            hand_left_position: Vec3::new(80.0, 100.0, -150.0),
            phone_position: Vec3::new(-50.0, 0.0, -68.0),
            mask_position: Vec3::new(0.0, 0.0, 9.89),
        }
    }
}

/// Camera setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            near: -100_000.0,
            far: 100_000.0,
            position: Vec3::new(0.0, 0.0, 1000.0),
        }
    }
}

/// Stencil mask around the phone screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    pub id: u32,
    /// Masked parts draw everywhere except inside the mask.
    pub inverse: bool,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self { id: 1, inverse: true }
    }
}

/// Embedded HTML overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Host container ID.
    pub portal: String,
    pub class_name: String,
    pub scale: f32,
    pub z_index_range: (i32, i32),
    /// Content size in CSS pixels. Defaults to the screen geometry size.
    pub content_size: Option<Size>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            portal: "dom-content".to_string(),
            class_name: "content-embed".to_string(),
            scale: 40.0,
            z_index_range: (-1, 0),
            content_size: None,
        }
    }
}

/// Scene configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Viewport size in CSS pixels.
    pub viewport: Size,
    /// Asset path, resolved by the asset source.
    pub asset_path: String,
    pub nodes: NodeNames,
    pub layout: LayoutConfig,
    pub tuning: AnimatorTuning,
    pub timing: FrameTiming,
    /// Scroll velocity reset delay in milliseconds.
    pub scroll_decay_ms: u64,
    pub camera: CameraConfig,
    pub mask: MaskConfig,
    pub overlay: OverlayConfig,
    pub float: FloatParams,
    pub lights: Vec<Light>,
    /// Opacity of the interactive screen surface.
    pub screen_opacity: f32,
}

impl SceneConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lerp factors scaled by frame time, tuned at 60 Hz.
    pub fn frame_rate_independent() -> Self {
        Self {
            timing: FrameTiming::delta_scaled(),
            ..Self::default()
        }
    }

    /// Read a configuration from a JSON file. Missing fields keep their
    /// defaults.
    pub fn from_file(path: impl AsRef<Path>) -> SceneResult<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or poison the animation.
    pub fn validate(&self) -> SceneResult<()> {
        if !self.timing.is_valid() {
            return Err(SceneError::invalid(format!("unusable frame timing: {:?}", self.timing)));
        }
        Ok(())
    }

    /// Set viewport size.
    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Size::new(width, height);
        self
    }

    /// Set asset path.
    pub fn with_asset_path(mut self, path: &str) -> Self {
        self.asset_path = path.to_string();
        self
    }

    /// Set frame timing.
    pub fn with_timing(mut self, timing: FrameTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Set animator tuning.
    pub fn with_tuning(mut self, tuning: AnimatorTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Set float motion parameters.
    pub fn with_float(mut self, float: FloatParams) -> Self {
        self.float = float;
        self
    }

    /// Set the overlay content size.
    pub fn with_content_size(mut self, size: Size) -> Self {
        self.overlay.content_size = Some(size);
        self
    }

    pub fn scroll_decay(&self) -> Duration {
        Duration::from_millis(self.scroll_decay_ms)
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            viewport: Size::new(1280.0, 720.0),
            asset_path: "/assets/scroll.json".to_string(),
            nodes: NodeNames::default(),
            layout: LayoutConfig::default(),
            tuning: AnimatorTuning::default(),
            timing: FrameTiming::Fixed,
            scroll_decay_ms: 100,
            camera: CameraConfig::default(),
            mask: MaskConfig::default(),
            overlay: OverlayConfig::default(),
            float: FloatParams::default(),
            lights: default_lights(),
            screen_opacity: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SceneConfig::default();
        assert_eq!(config.nodes.hand_right, "hand-r");
        assert_eq!(config.scroll_decay(), Duration::from_millis(100));
        assert_eq!(config.timing, FrameTiming::Fixed);
        assert_eq!(config.overlay.scale, 40.0);
        assert_eq!(config.mask, MaskConfig { id: 1, inverse: true });
    }

    #[test]
    fn test_frame_rate_independent_config() {
        let config = SceneConfig::frame_rate_independent();
        assert_eq!(config.timing, FrameTiming::DeltaScaled { reference_hz: 60.0 });
    }

    #[test]
    fn test_config_builder() {
        let config = SceneConfig::new()
            .with_viewport(800.0, 600.0)
            .with_asset_path("/phone.json");

        assert_eq!(config.viewport, Size::new(800.0, 600.0));
        assert_eq!(config.asset_path, "/phone.json");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SceneConfig = serde_json::from_str(
            r#"{ "viewport": { "width": 400, "height": 300 }, "timing": { "mode": "delta_scaled", "reference_hz": 120 } }"#,
        )
        .unwrap();

        assert_eq!(config.viewport, Size::new(400.0, 300.0));
        assert_eq!(config.timing, FrameTiming::DeltaScaled { reference_hz: 120.0 });
        assert_eq!(config.nodes, NodeNames::default());
        assert_eq!(config.camera.far, 100_000.0);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("phone-scene-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "scroll_decay_ms": 250 }"#).unwrap();

        let config = SceneConfig::from_file(&path).unwrap();
        assert_eq!(config.scroll_decay(), Duration::from_millis(250));

        std::fs::remove_file(&path).ok();
        assert!(SceneConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_from_file_rejects_bad_reference_rate() {
        let path = std::env::temp_dir().join(format!("phone-scene-timing-{}.json", std::process::id()));

        for reference_hz in ["0", "-60"] {
            let json = format!(r#"{{ "timing": {{ "mode": "delta_scaled", "reference_hz": {} }} }}"#, reference_hz);
            std::fs::write(&path, json).unwrap();
            let err = SceneConfig::from_file(&path).unwrap_err();
            assert!(matches!(err, SceneError::InvalidOperation(_)));
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_validate_rejects_nan_reference_rate() {
        let config = SceneConfig::new().with_timing(FrameTiming::DeltaScaled { reference_hz: f32::NAN });
        assert!(config.validate().is_err());
        assert!(SceneConfig::frame_rate_independent().validate().is_ok());
    }
}
