//! CPU preview renderer
//!
//! Ray casts the staged scene through the same pinhole intrinsics the capture
//! pipeline writes to `intrinsic.txt`, so every frame agrees with its exported
//! calibration. Output is an 8-bit sRGB PNG.

pub mod geometry;
pub mod shading;

use image::{ImageFormat, Rgb, RgbImage};
use serde::{Serialize, Deserialize};
use std::path::Path;

use crate::capture::intrinsics::Intrinsics;
use crate::capture::pose_sampler::CameraPose;
use crate::foundation::math::{utils, Mat3, Vec3};
use crate::scene::SceneBuildPlan;
use super::api::{CaptureRenderer, RenderResult};
use super::RenderError;
use geometry::Ray;
use shading::PreviewScene;

/// Quality settings for the preview renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSettings {
    /// Samples per pixel along each axis (total samples = n²)
    pub supersampling: u32,
    /// Maximum reflection/refraction depth
    pub max_bounces: u32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            supersampling: 2,
            max_bounces: 3,
        }
    }
}

/// Ray-casting renderer implementing [`CaptureRenderer`]
pub struct PreviewRenderer {
    inverse_k: Mat3,
    settings: PreviewSettings,
    scene: Option<PreviewScene>,
    resolution: (u32, u32),
    camera: Option<CameraPose>,
    frames_rendered: u64,
}

impl PreviewRenderer {
    /// Create a renderer projecting through `intrinsics`
    ///
    /// Fails when the camera matrix cannot be inverted.
    pub fn new(intrinsics: Intrinsics, settings: PreviewSettings) -> RenderResult<Self> {
        let inverse_k = intrinsics
            .camera_matrix()
            .try_inverse()
            .filter(|k| k.iter().all(|v| v.is_finite()))
            .ok_or_else(|| RenderError::InitializationFailed(format!("singular camera matrix for {intrinsics:?}")))?;

        Ok(Self {
            inverse_k,
            settings,
            scene: None,
            resolution: (0, 0),
            camera: None,
            frames_rendered: 0,
        })
    }

    /// Frames written since creation
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// World-space ray through image coordinates `(u, v)` (pixels, origin top-left)
    ///
    /// `K⁻¹·(u, v, 1)` gives the direction in the image-convention frame
    /// (+Y down, looking down +Z). Camera space has +X right, +Y up and looks
    /// down -Z, hence the flipped Y and Z.
    pub fn primary_ray(&self, pose: &CameraPose, u: f64, v: f64) -> Ray {
        let image_dir = self.inverse_k * Vec3::new(u, v, 1.0);
        let camera_dir = Vec3::new(image_dir.x, -image_dir.y, -image_dir.z);
        Ray::new(pose.position, pose.orientation * camera_dir)
    }

    fn render_image(&self, scene: &PreviewScene, pose: &CameraPose) -> RgbImage {
        let (width, height) = self.resolution;
        let n = self.settings.supersampling.max(1);
        let inv_samples = 1.0 / f64::from(n * n);

        RgbImage::from_fn(width, height, |x, y| {
            let mut radiance = Vec3::zeros();
            for sy in 0..n {
                for sx in 0..n {
                    let u = f64::from(x) + (f64::from(sx) + 0.5) / f64::from(n);
                    let v = f64::from(y) + (f64::from(sy) + 0.5) / f64::from(n);
                    radiance += scene.shade(&self.primary_ray(pose, u, v), self.settings.max_bounces);
                }
            }
            to_srgb(&(radiance * inv_samples))
        })
    }
}

/// Clamp linear radiance and encode with a 2.2 gamma
fn to_srgb(linear: &Vec3) -> Rgb<u8> {
    let encode = |c: f64| (utils::clamp(c, 0.0, 1.0).powf(1.0 / 2.2) * 255.0).round() as u8;
    Rgb([encode(linear.x), encode(linear.y), encode(linear.z)])
}

impl CaptureRenderer for PreviewRenderer {
    fn build_scene(&mut self, plan: &SceneBuildPlan) -> RenderResult<()> {
        if plan.render.width == 0 || plan.render.height == 0 {
            return Err(RenderError::InitializationFailed(format!(
                "invalid resolution {}x{}",
                plan.render.width, plan.render.height
            )));
        }
        self.scene = Some(PreviewScene::from_plan(plan));
        self.resolution = (plan.render.width, plan.render.height);
        self.camera = None;
        log::info!(
            "Preview scene staged for '{}' at {}x{}",
            plan.material.name, plan.render.width, plan.render.height
        );
        Ok(())
    }

    fn set_camera_pose(&mut self, pose: &CameraPose) -> RenderResult<()> {
        self.camera = Some(*pose);
        log::trace!("Camera moved to {:?}", pose.position);
        Ok(())
    }

    fn render_to_file(&mut self, path: &Path) -> RenderResult<()> {
        let scene = self.scene.as_ref()
            .ok_or_else(|| RenderError::InitializationFailed("no scene staged".to_string()))?;
        let pose = self.camera
            .ok_or_else(|| RenderError::RenderingFailed("camera pose not set".to_string()))?;

        let image = self.render_image(scene, &pose);
        image.save_with_format(path, ImageFormat::Png)?;
        self.frames_rendered += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::pose_sampler::sample;
    use crate::core::config::CaptureConfig;
    use crate::scene::MaterialVariant;
    use approx::assert_relative_eq;

    #[test]
    fn test_principal_point_ray_hits_target() {
        let renderer = PreviewRenderer::new(Intrinsics::default(), PreviewSettings::default()).unwrap();
        let pose = sample(5, 50, 4.5, 2.2, &Vec3::zeros()).unwrap();
        let ray = renderer.primary_ray(&pose, 256.0, 256.0);
        assert_relative_eq!(ray.direction, (Vec3::zeros() - pose.position).normalize(), epsilon = 1e-12);
    }

    #[test]
    fn test_off_centre_pixel_matches_pinhole_projection() {
        let intrinsics = Intrinsics::new(400.0, 300.0, 320.0, 240.0);
        let renderer = PreviewRenderer::new(intrinsics, PreviewSettings::default()).unwrap();
        let pose = sample(2, 7, 4.5, 2.2, &Vec3::zeros()).unwrap();

        // Project a point on the ray back through K and recover the pixel
        let ray = renderer.primary_ray(&pose, 100.0, 50.0);
        let local = pose.world_to_camera() * (ray.at(3.0) - pose.position);
        let projected = intrinsics.camera_matrix() * Vec3::new(local.x, -local.y, -local.z);
        assert_relative_eq!(projected.x / projected.z, 100.0, epsilon = 1e-9);
        assert_relative_eq!(projected.y / projected.z, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_degenerate_intrinsics() {
        let intrinsics = Intrinsics::new(0.0, 512.0, 256.0, 256.0);
        assert!(matches!(
            PreviewRenderer::new(intrinsics, PreviewSettings::default()),
            Err(RenderError::InitializationFailed(_))
        ));
    }

    #[test]
    fn test_image_top_row_looks_up() {
        let renderer = PreviewRenderer::new(Intrinsics::default(), PreviewSettings::default()).unwrap();
        let pose = sample(0, 4, 4.0, 0.0, &Vec3::zeros()).unwrap();
        let top = renderer.primary_ray(&pose, 256.0, 0.0);
        let bottom = renderer.primary_ray(&pose, 256.0, 511.0);
        assert!(top.direction.z > 0.0);
        assert!(bottom.direction.z < 0.0);
    }

    #[test]
    fn test_render_requires_scene_and_pose() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.png");
        let mut renderer = PreviewRenderer::new(Intrinsics::default(), PreviewSettings::default()).unwrap();
        assert!(matches!(renderer.render_to_file(&path), Err(RenderError::InitializationFailed(_))));

        let config = CaptureConfig::default().with_image_size(16, 16);
        renderer.build_scene(&SceneBuildPlan::for_variant(MaterialVariant::ceramic(), &config)).unwrap();
        assert!(matches!(renderer.render_to_file(&path), Err(RenderError::RenderingFailed(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_renders_png_at_plan_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view_000.png");
        let config = CaptureConfig::default().with_image_size(24, 16);

        let mut renderer = PreviewRenderer::new(
            Intrinsics::from_horizontal_fov(24, 16, 50.0),
            PreviewSettings { supersampling: 1, max_bounces: 1 },
        )
        .unwrap();
        renderer.build_scene(&SceneBuildPlan::for_variant(MaterialVariant::metal(), &config)).unwrap();
        renderer.set_camera_pose(&sample(0, 8, 4.5, 2.2, &Vec3::zeros()).unwrap()).unwrap();
        renderer.render_to_file(&path).unwrap();

        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (24, 16));
        assert_eq!(renderer.frames_rendered(), 1);
    }
}
