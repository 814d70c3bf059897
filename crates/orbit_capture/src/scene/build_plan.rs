//! Declarative scene description for one dataset scene
//!
//! A [`SceneBuildPlan`] lists everything a renderer needs to stage before the
//! first view is captured: the subject with its material variant, the ground,
//! the key light, the world background and render settings. The plan is data
//! only; renderers build their own scene graph from it.

use serde::{Serialize, Deserialize};

use crate::core::config::CaptureConfig;
use crate::foundation::math::{Mat3, Mat3Ext, Vec3, FALLBACK_UP, WORLD_UP};
use super::material::MaterialVariant;

/// Regular prism standing on the ground, centred on the world Z axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMesh {
    /// Number of sides of the prism
    pub sides: u32,
    /// Circumradius of the cross-section
    pub radius: f64,
    /// Height of the prism
    pub depth: f64,
    /// Centre of the prism
    pub location: Vec3,
}

impl SubjectMesh {
    /// Z coordinate of the bottom face
    pub fn bottom(&self) -> f64 {
        self.location.z - self.depth * 0.5
    }

    /// Z coordinate of the top face
    pub fn top(&self) -> f64 {
        self.location.z + self.depth * 0.5
    }
}

impl Default for SubjectMesh {
    fn default() -> Self {
        Self {
            sides: 6,
            radius: 0.6,
            depth: 1.2,
            location: Vec3::new(0.0, 0.0, 0.6),
        }
    }
}

/// Square diffuse ground plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    /// Edge length
    pub size: f64,
    /// Elevation of the plane
    pub elevation: f64,
    /// Diffuse color (RGB)
    pub color: [f64; 3],
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self {
            size: 10.0,
            elevation: -0.01,
            color: [1.0, 1.0, 1.0],
        }
    }
}

/// Rectangular area light aimed at the capture target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaLight {
    /// Light centre in world space
    pub location: Vec3,
    /// Point the light faces
    pub target: Vec3,
    /// Extent along the light's local X axis
    pub size_x: f64,
    /// Extent along the light's local Y axis
    pub size_y: f64,
    /// Emitted power in watts
    pub energy: f64,
}

impl AreaLight {
    /// Light-to-world rotation; the light emits along its local -Z axis
    pub fn orientation(&self) -> Option<Mat3> {
        Mat3::look_at_rotation(&self.location, &self.target, &WORLD_UP, &FALLBACK_UP)
    }
}

impl Default for AreaLight {
    fn default() -> Self {
        Self {
            location: Vec3::new(5.0, -5.0, 5.0),
            target: Vec3::zeros(),
            size_x: 2.0,
            size_y: 0.3,
            energy: 1500.0,
        }
    }
}

/// Uniform environment lighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldBackground {
    /// Background color (RGB)
    pub color: [f64; 3],
    /// Emission strength
    pub strength: f64,
}

impl Default for WorldBackground {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            strength: 2.0,
        }
    }
}

/// Renderer-facing output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Samples per pixel for path-traced engines
    pub samples: u32,
    /// Whether area lights cast soft shadows
    pub soft_shadows: bool,
    /// Whether the background is rendered transparent
    pub film_transparent: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            samples: 128,
            soft_shadows: true,
            film_transparent: false,
        }
    }
}

/// Complete description of one dataset scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBuildPlan {
    /// Material assigned to the subject
    pub material: MaterialVariant,
    /// The object being captured
    pub subject: SubjectMesh,
    /// Ground under the subject
    pub ground: GroundPlane,
    /// Key light
    pub light: AreaLight,
    /// Environment lighting
    pub world: WorldBackground,
    /// Output settings
    pub render: RenderSettings,
}

impl SceneBuildPlan {
    /// Stage the default subject, ground and lighting for a material variant
    ///
    /// The light aims at the orbit target and the output resolution follows the
    /// capture configuration.
    pub fn for_variant(material: MaterialVariant, config: &CaptureConfig) -> Self {
        Self {
            material,
            subject: SubjectMesh::default(),
            ground: GroundPlane::default(),
            light: AreaLight {
                target: config.orbit.target,
                ..Default::default()
            },
            world: WorldBackground::default(),
            render: RenderSettings {
                width: config.image.width,
                height: config.image.height,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plan_follows_config() {
        let config = CaptureConfig::default().with_image_size(320, 240);
        let plan = SceneBuildPlan::for_variant(MaterialVariant::metal(), &config);

        assert_eq!(plan.material.name, "metal");
        assert_eq!((plan.render.width, plan.render.height), (320, 240));
        assert_eq!(plan.light.target, config.orbit.target);
    }

    #[test]
    fn test_subject_rests_on_origin() {
        let subject = SubjectMesh::default();
        assert_relative_eq!(subject.bottom(), 0.0);
        assert_relative_eq!(subject.top(), 1.2);
    }

    #[test]
    fn test_light_faces_target() {
        let light = AreaLight::default();
        let emit_dir = light.orientation().unwrap() * Vec3::new(0.0, 0.0, -1.0);
        assert_relative_eq!(emit_dir, (light.target - light.location).normalize(), epsilon = 1e-12);
    }
}
