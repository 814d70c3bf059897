//! Math utilities and types
//!
//! Provides the double precision linear algebra types used by the pose and
//! calibration code. Calibration files are written with six decimals, so all
//! pose math runs in `f64` to keep the written digits exact.

pub use nalgebra::{Matrix3, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f64>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f64 = std::f64::consts::PI;

    /// 2 * Pi
    pub const TAU: f64 = std::f64::consts::TAU;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f64 = PI / 180.0;

    /// Below this cross-product magnitude two directions are treated as parallel
    pub const PARALLEL_EPSILON: f64 = 1e-9;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * constants::DEG_TO_RAD
    }

    /// Clamp a value between min and max
    pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
        if value < min { min } else if value > max { max } else { value }
    }

    /// Linear interpolation
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }
}

/// World axis used as the up reference for camera orientation
pub const WORLD_UP: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// Secondary up reference used when the view direction is parallel to [`WORLD_UP`]
pub const FALLBACK_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Extension trait for Mat3 with camera-frame helpers
pub trait Mat3Ext: Sized {
    /// Build a roll-free camera-to-world rotation that looks from `eye` toward `target`
    ///
    /// The camera frame is right-handed with local +X = right, +Y = up and the
    /// view direction along local -Z. The columns of the returned matrix are the
    /// camera axes expressed in world coordinates: `[right, up, -forward]`.
    ///
    /// `up` is the preferred up reference. When the view direction is parallel
    /// to it, `fallback_up` is used instead so the result is always finite.
    ///
    /// Returns `None` when `eye` and `target` coincide (no view direction) or
    /// when any input is non-finite.
    fn look_at_rotation(eye: &Vec3, target: &Vec3, up: &Vec3, fallback_up: &Vec3) -> Option<Self>;

    /// Whether the matrix is a proper rotation within `epsilon`
    ///
    /// Checks `M·Mᵗ ≈ I` and `det(M) ≈ 1`.
    fn is_rotation(&self, epsilon: f64) -> bool;
}

impl Mat3Ext for Mat3 {
    fn look_at_rotation(eye: &Vec3, target: &Vec3, up: &Vec3, fallback_up: &Vec3) -> Option<Mat3> {
        let forward = (target - eye).try_normalize(f64::EPSILON)?;

        let mut right = forward.cross(up);
        if right.norm() < constants::PARALLEL_EPSILON {
            log::trace!("View direction {:?} parallel to up reference, using fallback {:?}", forward, fallback_up);
            right = forward.cross(fallback_up);
        }
        let right = right.try_normalize(f64::EPSILON)?;
        let camera_up = right.cross(&forward);

        let rotation = Mat3::from_columns(&[right, camera_up, -forward]);
        rotation.iter().all(|v| v.is_finite()).then_some(rotation)
    }

    fn is_rotation(&self, epsilon: f64) -> bool {
        let identity_error = (self * self.transpose() - Mat3::identity()).amax();
        identity_error <= epsilon && (self.determinant() - 1.0).abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_look_at_points_negative_z_at_target() {
        let eye = Vec3::new(3.0, -2.0, 1.5);
        let target = Vec3::new(0.0, 0.0, 0.5);
        let rotation = Mat3::look_at_rotation(&eye, &target, &WORLD_UP, &FALLBACK_UP).unwrap();

        let view_dir = rotation * Vec3::new(0.0, 0.0, -1.0);
        assert_relative_eq!(view_dir, (target - eye).normalize(), epsilon = EPSILON);
        assert!(rotation.is_rotation(1e-12));
    }

    #[test]
    fn test_look_at_has_no_roll() {
        let eye = Vec3::new(4.0, 1.0, 2.0);
        let rotation = Mat3::look_at_rotation(&eye, &Vec3::zeros(), &WORLD_UP, &FALLBACK_UP).unwrap();

        // Camera right axis stays horizontal
        assert_relative_eq!(rotation[(2, 0)], 0.0, epsilon = EPSILON);

        // Camera up axis leans toward world up
        assert!(rotation.column(1).dot(&WORLD_UP) > 0.0);
    }

    #[test]
    fn test_look_at_straight_down_uses_fallback() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let rotation = Mat3::look_at_rotation(&eye, &Vec3::zeros(), &WORLD_UP, &FALLBACK_UP).unwrap();

        assert!(rotation.iter().all(|v| v.is_finite()));
        assert!(rotation.is_rotation(1e-12));
        assert_relative_eq!(rotation * Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_look_at_coincident_points() {
        let eye = Vec3::new(1.0, 1.0, 1.0);
        assert!(Mat3::look_at_rotation(&eye, &eye, &WORLD_UP, &FALLBACK_UP).is_none());
    }

    #[test]
    fn test_look_at_non_finite_input() {
        let nan_eye = Vec3::new(f64::NAN, 0.0, 1.0);
        assert!(Mat3::look_at_rotation(&nan_eye, &Vec3::zeros(), &WORLD_UP, &FALLBACK_UP).is_none());

        let far_target = Vec3::new(f64::INFINITY, 0.0, 0.0);
        assert!(Mat3::look_at_rotation(&Vec3::new(1.0, 2.0, 3.0), &far_target, &WORLD_UP, &FALLBACK_UP).is_none());
    }

    #[test]
    fn test_is_rotation_rejects_reflection() {
        let reflection = Mat3::from_diagonal(&Vec3::new(1.0, 1.0, -1.0));
        assert!(!reflection.is_rotation(1e-9));
        assert!(Mat3::identity().is_rotation(1e-12));
    }
}
