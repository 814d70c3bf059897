//! Material variant definitions
//!
//! A material variant is a named bag of principled shading parameters. The
//! capture core never interprets these values; renderers translate them into
//! their own material representation.

use serde::{Serialize, Deserialize};

use crate::config::ConfigError;

/// Principled (metallic-roughness) shading parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingParams {
    /// Base color (albedo) - RGBA values
    pub base_color: [f64; 4],
    /// Metallic factor (0.0 = dielectric, 1.0 = metallic)
    pub metallic: f64,
    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness: f64,
    /// Transmission weight (0.0 = opaque, 1.0 = fully transmissive)
    pub transmission: f64,
    /// Index of refraction for transmissive and specular lobes
    pub ior: f64,
    /// Specular intensity scale for dielectrics
    pub specular_ior_level: f64,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            transmission: 0.0,
            ior: 1.5,
            specular_ior_level: 0.5,
        }
    }
}

impl ShadingParams {
    /// Validate parameter ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_values = [
            ("metallic", self.metallic),
            ("roughness", self.roughness),
            ("transmission", self.transmission),
            ("specular_ior_level", self.specular_ior_level),
        ];
        for (field, value) in unit_values {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{field} must be within [0, 1], got {value}")));
            }
        }
        if self.base_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::Invalid(format!("base color components must be within [0, 1], got {:?}", self.base_color)));
        }
        if !self.ior.is_finite() || self.ior < 1.0 {
            return Err(ConfigError::Invalid(format!("ior must be at least 1.0, got {}", self.ior)));
        }
        Ok(())
    }
}

/// One surface-material assignment for the subject, producing one dataset scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialVariant {
    /// Identifier, also used as the scene directory name
    pub name: String,
    /// Shading parameters handed to the renderer
    #[serde(default)]
    pub shading: ShadingParams,
}

impl MaterialVariant {
    /// Create a variant from a name and shading parameters
    pub fn new(name: impl Into<String>, shading: ShadingParams) -> Self {
        Self {
            name: name.into(),
            shading,
        }
    }

    /// Clear, fully transmissive glass
    pub fn glass() -> Self {
        Self::new("glass", ShadingParams {
            transmission: 1.0,
            roughness: 0.0,
            ior: 1.5,
            ..Default::default()
        })
    }

    /// Warm off-white glazed ceramic
    pub fn ceramic() -> Self {
        Self::new("ceramic", ShadingParams {
            base_color: [0.72, 0.68, 0.6, 1.0],
            roughness: 0.4,
            ..Default::default()
        })
    }

    /// Dark brushed metal
    pub fn metal() -> Self {
        Self::new("metal", ShadingParams {
            base_color: [0.3, 0.3, 0.3, 1.0],
            metallic: 1.0,
            roughness: 0.2,
            transmission: 0.0,
            specular_ior_level: 0.5,
            ..Default::default()
        })
    }

    /// The glass, ceramic and metal variants in capture order
    pub fn default_set() -> Vec<Self> {
        vec![Self::glass(), Self::ceramic(), Self::metal()]
    }

    /// Validate the name and shading parameters
    ///
    /// The name becomes a directory under the output root, so it must be a
    /// single plain path component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!("material name '{name}' is not a valid directory name")));
        }
        self.shading.validate()
            .map_err(|e| ConfigError::Invalid(format!("material '{name}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_is_valid() {
        let names: Vec<_> = MaterialVariant::default_set().into_iter().map(|m| {
            assert!(m.validate().is_ok(), "{} failed validation", m.name);
            m.name
        }).collect();
        assert_eq!(names, ["glass", "ceramic", "metal"]);
    }

    #[test]
    fn test_rejects_path_like_names() {
        for name in ["", "..", "a/b", "a\\b"] {
            let variant = MaterialVariant::new(name, ShadingParams::default());
            assert!(variant.validate().is_err(), "name {name:?} accepted");
        }
    }

    #[test]
    fn test_rejects_out_of_range_params() {
        let variant = MaterialVariant::new("odd", ShadingParams { roughness: 1.5, ..Default::default() });
        assert!(variant.validate().is_err());

        let variant = MaterialVariant::new("odd", ShadingParams { ior: 0.5, ..Default::default() });
        assert!(variant.validate().is_err());
    }
}
