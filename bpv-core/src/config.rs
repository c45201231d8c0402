/// Viewer configuration
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::ConfigError;
use crate::metadata::Dimensions;
use crate::views::ViewName;

/// Size of the drawable target in pixels (or character cells for terminal hosts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Base URL of the blueprint API, without trailing slash
    pub api_base_url: String,
    pub surface: SurfaceSize,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub damping_factor: f32,
    pub auto_rotate: bool,
    /// 2.0 means one revolution every 30 seconds at 60 frames per second
    pub auto_rotate_speed: f32,
    pub default_color: Rgb,
    /// Solid size used until dimensions are known
    pub default_dimensions: Dimensions,
    pub label_color: Rgb,
    pub label_offset: [f32; 3],
    pub label_size: f32,
    pub initial_view: ViewName,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            surface: SurfaceSize::default(),
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            damping_factor: 0.05,
            auto_rotate: true,
            auto_rotate_speed: 2.0,
            default_color: Rgb::DEFAULT_SOLID,
            default_dimensions: Dimensions::new(10.0, 20.0, 30.0),
            label_color: Rgb::WHITE,
            label_offset: [-5.0, 25.0, 0.0],
            label_size: 2.0,
            initial_view: ViewName::Front,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let config =
            ViewerConfig::from_json_str(r#"{"auto_rotate_speed": 4.0, "initial_view": "top"}"#)
                .unwrap();
        assert_eq!(config.auto_rotate_speed, 4.0);
        assert_eq!(config.initial_view, ViewName::Top);
        assert_eq!(config.surface, SurfaceSize::default());
        assert_eq!(config.default_color, Rgb(0x00ff00));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            ViewerConfig::from_json_str(r#"{"autorotate": false}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
