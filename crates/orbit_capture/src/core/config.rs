//! # Unified Capture Configuration
//!
//! This module gathers every setting a dataset run needs into a single,
//! serializable value. It replaces module-level constants: a `CaptureConfig`
//! is built (or loaded), validated once, and then passed by reference into the
//! capture pipeline, which never mutates it mid-run.
//!
//! ## Configuration Categories
//!
//! - **Orbit**: view count, radius, height and look-at target
//! - **Intrinsics**: pinhole focal lengths and principal point
//! - **Image**: output resolution
//! - **Policy**: renderer failure handling and translation convention
//! - **Materials**: the material variants, one dataset scene each

use serde::{Serialize, Deserialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::capture::extrinsics::TranslationConvention;
use crate::capture::intrinsics::Intrinsics;
use crate::foundation::math::Vec3;
use crate::scene::material::MaterialVariant;

pub use crate::config::{Config, ConfigError};

/// # Orbit Configuration
///
/// Parameters of the closed circular camera path. Cameras sit on a circle of
/// `radius` around the world Z axis at elevation `height` and all look at
/// `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Number of views on the orbit
    pub view_count: usize,
    /// Distance from the vertical axis to the camera, in scene units
    pub radius: f64,
    /// Camera elevation
    pub height: f64,
    /// Fixed look-at point shared by every view
    pub target: Vec3,
}

impl OrbitConfig {
    /// Create an orbit around the origin
    pub fn new(view_count: usize, radius: f64, height: f64) -> Self {
        Self {
            view_count,
            radius,
            height,
            target: Vec3::zeros(),
        }
    }

    /// Set the look-at target
    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Validate the orbit parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.view_count == 0 {
            return Err(ConfigError::Invalid("view count must be at least 1".to_string()));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ConfigError::Invalid(format!("orbit radius must be positive, got {}", self.radius)));
        }
        if !self.height.is_finite() {
            return Err(ConfigError::Invalid(format!("orbit height must be finite, got {}", self.height)));
        }
        if !self.target.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::Invalid(format!("orbit target must be finite, got {:?}", self.target)));
        }

        // A target on the orbit itself would leave some camera without a view direction
        let axis_distance = self.target.x.hypot(self.target.y);
        if (self.target.z - self.height).abs() < 1e-9 && (axis_distance - self.radius).abs() < 1e-9 {
            return Err(ConfigError::Invalid("orbit target lies on the camera path".to_string()));
        }

        Ok(())
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self::new(50, 4.5, 2.2)
    }
}

/// # Image Configuration
///
/// Raster settings shared by every view of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageConfig {
    /// Validate the image settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "image resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self { width: 512, height: 512 }
    }
}

/// What to do when the renderer fails to produce a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Abort the scene; records already written cover only the views before the failure
    #[default]
    Abort,
    /// Log the failure, drop the view's image and record, and continue
    SkipAndLog,
}

/// # Complete Capture Configuration
///
/// Top-level configuration for a dataset run. This is the main configuration
/// structure the pipeline and the command-line front end share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Root directory; each material variant gets a sub-directory
    pub output_root: PathBuf,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Camera orbit
    pub orbit: OrbitConfig,
    /// Pinhole intrinsics written to every scene
    pub intrinsics: Intrinsics,
    /// Output raster settings
    pub image: ImageConfig,
    /// Renderer failure handling
    pub failure_policy: FailurePolicy,
    /// Meaning of the values in the translation file
    pub translation_convention: TranslationConvention,
    /// Material variants, one dataset scene each
    pub materials: Vec<MaterialVariant>,
}

impl CaptureConfig {
    /// Create a configuration with default orbit, intrinsics and materials
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            log_level: "info".to_string(),
            orbit: OrbitConfig::default(),
            intrinsics: Intrinsics::default(),
            image: ImageConfig::default(),
            failure_policy: FailurePolicy::default(),
            translation_convention: TranslationConvention::default(),
            materials: MaterialVariant::default_set(),
        }
    }

    /// Set the orbit
    pub fn with_orbit(mut self, orbit: OrbitConfig) -> Self {
        self.orbit = orbit;
        self
    }

    /// Set the number of views
    pub fn with_view_count(mut self, view_count: usize) -> Self {
        self.orbit.view_count = view_count;
        self
    }

    /// Set the pinhole intrinsics
    pub fn with_intrinsics(mut self, intrinsics: Intrinsics) -> Self {
        self.intrinsics = intrinsics;
        self
    }

    /// Set the output resolution
    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image = ImageConfig { width, height };
        self
    }

    /// Set the renderer failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the translation convention
    pub fn with_translation_convention(mut self, convention: TranslationConvention) -> Self {
        self.translation_convention = convention;
        self
    }

    /// Replace the material variants
    pub fn with_materials(mut self, materials: Vec<MaterialVariant>) -> Self {
        self.materials = materials;
        self
    }

    /// Keep only the named material variants
    ///
    /// Returns an error naming the first requested variant that does not exist.
    pub fn retain_materials(&mut self, names: &[String]) -> Result<(), ConfigError> {
        if let Some(missing) = names.iter().find(|name| !self.materials.iter().any(|m| &m.name == *name)) {
            return Err(ConfigError::Invalid(format!("unknown material variant '{missing}'")));
        }
        self.materials.retain(|m| names.contains(&m.name));
        Ok(())
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output root cannot be empty".to_string()));
        }

        self.orbit.validate()?;
        self.intrinsics.validate()?;
        self.image.validate()?;

        if self.materials.is_empty() {
            return Err(ConfigError::Invalid("at least one material variant is required".to_string()));
        }

        let mut seen = HashSet::new();
        for material in &self.materials {
            material.validate()?;
            if !seen.insert(material.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate material variant '{}'", material.name)));
            }
        }

        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::new("dataset")
    }
}

impl Config for CaptureConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.orbit.view_count, 50);
        assert_eq!(config.materials.len(), 3);
    }

    #[test]
    fn test_rejects_zero_views() {
        let config = CaptureConfig::default().with_view_count(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        for radius in [0.0, -1.0, f64::NAN] {
            let config = CaptureConfig::default().with_orbit(OrbitConfig::new(8, radius, 1.0));
            assert!(config.validate().is_err(), "radius {radius} accepted");
        }
    }

    #[test]
    fn test_rejects_target_on_orbit() {
        let orbit = OrbitConfig::new(4, 2.0, 1.0).with_target(Vec3::new(0.0, 2.0, 1.0));
        assert!(orbit.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_materials() {
        let glass = MaterialVariant::glass();
        let config = CaptureConfig::default().with_materials(vec![glass.clone(), glass]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retain_materials() {
        let mut config = CaptureConfig::default();
        config.retain_materials(&["metal".to_string()]).unwrap();
        assert_eq!(config.materials.len(), 1);
        assert_eq!(config.materials[0].name, "metal");

        assert!(config.retain_materials(&["wood".to_string()]).is_err());
    }

    #[test]
    fn test_ron_roundtrip() {
        let config = CaptureConfig::new("out").with_view_count(12);
        let text = config.to_format_string(crate::config::ConfigFormat::Ron).unwrap();
        let parsed: CaptureConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = CaptureConfig::new("out").with_failure_policy(FailurePolicy::SkipAndLog);
        let text = config.to_format_string(crate::config::ConfigFormat::Toml).unwrap();
        let parsed: CaptureConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: CaptureConfig = toml::from_str("output_root = \"renders\"\n\n[orbit]\nview_count = 8\n").unwrap();
        assert_eq!(parsed.output_root, PathBuf::from("renders"));
        assert_eq!(parsed.orbit.view_count, 8);
        assert_eq!(parsed.orbit.radius, 4.5);
        assert_eq!(parsed.materials.len(), 3);
    }
}
