//! Circular orbit pose sampling
//!
//! Maps a view index to a camera pose on a closed circular orbit. Sampling is
//! a pure function of its inputs: the same arguments always produce
//! bit-identical poses.
//!
//! # Camera frame
//! Camera space is right-handed with local +X = right, +Y = up, and the camera
//! looking down local -Z. The up reference is world +Z; when a camera looks
//! straight up or down, world +Y is used instead. Changing either axis changes
//! every rotation written to `R_matrix.txt`.

use crate::config::ConfigError;
use crate::core::config::OrbitConfig;
use crate::foundation::math::{constants, Mat3, Mat3Ext, Vec3, FALLBACK_UP, WORLD_UP};
use super::error::{CaptureError, CaptureResult};

/// Camera placement for one view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// View index on the orbit
    pub index: usize,
    /// Camera centre in world coordinates
    pub position: Vec3,
    /// Camera-to-world rotation; columns are the camera's right, up and back axes
    pub orientation: Mat3,
}

impl CameraPose {
    /// World-space direction the camera looks along
    pub fn view_direction(&self) -> Vec3 {
        -self.orientation.column(2).into_owned()
    }

    /// Rotation taking world coordinates into camera space
    pub fn world_to_camera(&self) -> Mat3 {
        self.orientation.transpose()
    }
}

/// Sample the pose of view `index` out of `view_count` on a circular orbit
///
/// `θ = 2π·index/view_count`, the camera sits at `(r·cos θ, r·sin θ, height)`
/// and looks at `target` without roll. A non-positive or non-finite radius, or
/// a non-finite height or target, is a configuration error.
pub fn sample(index: usize, view_count: usize, radius: f64, height: f64, target: &Vec3) -> CaptureResult<CameraPose> {
    if view_count == 0 || index >= view_count {
        return Err(CaptureError::IndexOutOfRange { index, view_count });
    }
    if !radius.is_finite() || radius <= 0.0 {
        return Err(ConfigError::Invalid(format!("orbit radius must be positive, got {radius}")).into());
    }
    if !height.is_finite() || !target.iter().all(|v| v.is_finite()) {
        return Err(ConfigError::Invalid(format!(
            "orbit height and target must be finite, got height={height} target={target:?}"
        ))
        .into());
    }

    let theta = constants::TAU * index as f64 / view_count as f64;
    let position = Vec3::new(radius * theta.cos(), radius * theta.sin(), height);
    let orientation = Mat3::look_at_rotation(&position, target, &WORLD_UP, &FALLBACK_UP)
        .ok_or(CaptureError::DegeneratePose { index })?;

    Ok(CameraPose { index, position, orientation })
}

/// Pose sampler bound to a validated orbit
#[derive(Debug, Clone)]
pub struct PoseSampler {
    orbit: OrbitConfig,
}

impl PoseSampler {
    /// Create a sampler, rejecting invalid orbit parameters
    pub fn new(orbit: OrbitConfig) -> CaptureResult<Self> {
        orbit.validate()?;
        Ok(Self { orbit })
    }

    /// Number of views on the orbit
    pub fn view_count(&self) -> usize {
        self.orbit.view_count
    }

    /// Orbit parameters
    pub fn orbit(&self) -> &OrbitConfig {
        &self.orbit
    }

    /// Pose of a single view
    pub fn sample(&self, index: usize) -> CaptureResult<CameraPose> {
        sample(index, self.orbit.view_count, self.orbit.radius, self.orbit.height, &self.orbit.target)
    }

    /// Poses of every view in index order
    pub fn poses(&self) -> impl Iterator<Item = CaptureResult<CameraPose>> + '_ {
        (0..self.orbit.view_count).map(move |index| self.sample(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_four_view_orbit_positions() {
        let expected = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
        ];
        for (index, expected) in expected.iter().enumerate() {
            let pose = sample(index, 4, 1.0, 0.0, &Vec3::zeros()).unwrap();
            assert_relative_eq!(pose.position, *expected, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let target = Vec3::new(0.1, -0.2, 0.5);
        for index in 0..50 {
            let a = sample(index, 50, 4.5, 2.2, &target).unwrap();
            let b = sample(index, 50, 4.5, 2.2, &target).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_orbit_is_closed_and_uniform() {
        let sampler = PoseSampler::new(OrbitConfig::new(50, 4.5, 2.2)).unwrap();
        let poses: Vec<_> = sampler.poses().map(Result::unwrap).collect();
        assert_eq!(poses.len(), 50);

        let step = constants::TAU / 50.0;
        for (i, pose) in poses.iter().enumerate() {
            assert_relative_eq!(pose.position.xy().norm(), 4.5, epsilon = 1e-12);
            assert_relative_eq!(pose.position.z, 2.2);

            let next = &poses[(i + 1) % poses.len()];
            let angle = pose.position.xy().angle(&next.position.xy());
            assert_relative_eq!(angle, step, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_camera_looks_at_target() {
        let target = Vec3::new(0.0, 0.0, 0.6);
        let sampler = PoseSampler::new(OrbitConfig::new(12, 3.0, 2.0).with_target(target)).unwrap();
        for pose in sampler.poses() {
            let pose = pose.unwrap();
            assert_relative_eq!(pose.view_direction(), (target - pose.position).normalize(), epsilon = EPSILON);
            assert!(pose.orientation.is_rotation(1e-12));
        }
    }

    #[test]
    fn test_world_to_camera_maps_target_onto_optical_axis() {
        let pose = sample(3, 8, 2.0, 1.0, &Vec3::zeros()).unwrap();
        let in_camera = pose.world_to_camera() * (Vec3::zeros() - pose.position);
        assert_relative_eq!(in_camera.x, 0.0, epsilon = EPSILON);
        assert_relative_eq!(in_camera.y, 0.0, epsilon = EPSILON);
        assert!(in_camera.z < 0.0);
    }

    #[test]
    fn test_overhead_camera_is_finite() {
        // Target directly below view 0
        let target = Vec3::new(1.0, 0.0, -3.0);
        let pose = sample(0, 4, 1.0, 0.0, &target).unwrap();
        assert!(pose.orientation.iter().all(|v| v.is_finite()));
        assert!(pose.orientation.is_rotation(1e-12));
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        assert!(matches!(
            sample(4, 4, 1.0, 0.0, &Vec3::zeros()),
            Err(CaptureError::IndexOutOfRange { index: 4, view_count: 4 })
        ));
        assert!(sample(0, 0, 1.0, 0.0, &Vec3::zeros()).is_err());
    }

    #[test]
    fn test_camera_on_target_is_degenerate() {
        let target = Vec3::new(1.0, 0.0, 0.0);
        assert!(matches!(
            sample(0, 4, 1.0, 0.0, &target),
            Err(CaptureError::DegeneratePose { index: 0 })
        ));
    }

    #[test]
    fn test_rejects_invalid_orbit_parameters() {
        let origin = Vec3::zeros();
        for radius in [f64::NAN, f64::INFINITY, 0.0, -1.0] {
            assert!(
                matches!(sample(1, 4, radius, 0.0, &origin), Err(CaptureError::Config(_))),
                "radius {radius} accepted"
            );
        }
        assert!(matches!(sample(1, 4, 1.0, f64::NAN, &origin), Err(CaptureError::Config(_))));
        assert!(matches!(
            sample(1, 4, 1.0, 0.0, &Vec3::new(0.0, f64::INFINITY, 0.0)),
            Err(CaptureError::Config(_))
        ));
    }
}
