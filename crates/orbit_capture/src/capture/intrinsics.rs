//! Pinhole intrinsics and the `intrinsic.txt` artifact

use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::foundation::math::{utils, Mat3};
use super::error::{CaptureError, CaptureResult, ParseError};

/// File holding the scene's intrinsics
pub const INTRINSICS_FILE: &str = "intrinsic.txt";

/// Header line naming the intrinsic fields
pub const INTRINSICS_HEADER: &str = "fx fy cx cy";

/// Pinhole camera intrinsics in pixels, no distortion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    /// Focal length along X
    pub fx: f64,
    /// Focal length along Y
    pub fy: f64,
    /// Principal point X
    pub cx: f64,
    /// Principal point Y
    pub cy: f64,
}

impl Intrinsics {
    /// Create intrinsics from focal lengths and principal point
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Square-pixel intrinsics for an image with the given horizontal field of view
    ///
    /// The principal point is placed at the image centre.
    pub fn from_horizontal_fov(width: u32, height: u32, fov_degrees: f64) -> Self {
        let focal = f64::from(width) * 0.5 / (utils::deg_to_rad(fov_degrees) * 0.5).tan();
        Self::new(focal, focal, f64::from(width) * 0.5, f64::from(height) * 0.5)
    }

    /// 3x3 camera matrix `K`
    pub fn camera_matrix(&self) -> Mat3 {
        Mat3::new(
            self.fx, 0.0, self.cx,
            0.0, self.fy, self.cy,
            0.0, 0.0, 1.0,
        )
    }

    /// Validate the intrinsic values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fx.is_finite() && self.fy.is_finite() && self.fx > 0.0 && self.fy > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "focal lengths must be positive, got fx={} fy={}",
                self.fx, self.fy
            )));
        }
        if !(self.cx.is_finite() && self.cy.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "principal point must be finite, got cx={} cy={}",
                self.cx, self.cy
            )));
        }
        Ok(())
    }

    /// Contents of `intrinsic.txt`
    ///
    /// Header line, then the four values in shortest round-trip notation. There
    /// is no trailing newline.
    pub fn to_file_string(&self) -> String {
        format!(
            "{INTRINSICS_HEADER}\n{:?} {:?} {:?} {:?}",
            self.fx, self.fy, self.cx, self.cy
        )
    }

    /// Parse the contents of `intrinsic.txt`
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut lines = text.lines();

        let header = lines.next().unwrap_or_default();
        if header.split_whitespace().ne(INTRINSICS_HEADER.split_whitespace()) {
            return Err(ParseError::Malformed {
                line: 1,
                reason: format!("expected header '{INTRINSICS_HEADER}', found '{header}'"),
            });
        }

        let values = lines
            .next()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ParseError::Malformed { line: 2, reason: e.to_string() })?;

        match values.as_slice() {
            [fx, fy, cx, cy] => Ok(Self::new(*fx, *fy, *cx, *cy)),
            _ => Err(ParseError::Malformed {
                line: 2,
                reason: format!("expected 4 values, found {}", values.len()),
            }),
        }
    }
}

impl Default for Intrinsics {
    fn default() -> Self {
        Self::new(512.0, 512.0, 256.0, 256.0)
    }
}

/// Writes the per-scene intrinsics artifact
pub struct IntrinsicsWriter;

impl IntrinsicsWriter {
    /// Write `intrinsic.txt` into `scene_dir`, replacing any previous file
    pub fn write(scene_dir: &Path, intrinsics: &Intrinsics) -> CaptureResult<PathBuf> {
        let path = scene_dir.join(INTRINSICS_FILE);
        std::fs::write(&path, intrinsics.to_file_string()).map_err(CaptureError::io(&path))?;
        log::debug!("Wrote intrinsics to {}", path.display());
        Ok(path)
    }

    /// Read `intrinsic.txt` back from `scene_dir`
    pub fn read(scene_dir: &Path) -> CaptureResult<Intrinsics> {
        let path = scene_dir.join(INTRINSICS_FILE);
        let text = std::fs::read_to_string(&path).map_err(CaptureError::io(&path))?;
        Intrinsics::parse(&text).map_err(CaptureError::parse(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_file_contents() {
        let text = Intrinsics::new(512.0, 512.0, 256.0, 256.0).to_file_string();
        assert_eq!(text, "fx fy cx cy\n512.0 512.0 256.0 256.0");
    }

    #[test]
    fn test_fractional_values_roundtrip_exactly() {
        let intrinsics = Intrinsics::new(593.21, 591.04, 339.5, 242.7);
        assert_eq!(Intrinsics::parse(&intrinsics.to_file_string()).unwrap(), intrinsics);
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        assert!(matches!(
            Intrinsics::parse("f c\n1 2 3 4"),
            Err(ParseError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            Intrinsics::parse("fx fy cx cy\n1 2 3"),
            Err(ParseError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_from_horizontal_fov() {
        // 90 degrees across 512 pixels puts the focal length at half the width
        let intrinsics = Intrinsics::from_horizontal_fov(512, 256, 90.0);
        assert_relative_eq!(intrinsics.fx, 256.0, epsilon = 1e-9);
        assert_relative_eq!(intrinsics.cy, 128.0);
    }

    #[test]
    fn test_rejects_non_positive_focal_length() {
        assert!(Intrinsics::new(0.0, 512.0, 256.0, 256.0).validate().is_err());
        assert!(Intrinsics::new(512.0, f64::INFINITY, 256.0, 256.0).validate().is_err());
        assert!(Intrinsics::default().validate().is_ok());
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        IntrinsicsWriter::write(dir.path(), &Intrinsics::new(1.0, 1.0, 0.5, 0.5)).unwrap();
        IntrinsicsWriter::write(dir.path(), &Intrinsics::default()).unwrap();

        let text = std::fs::read_to_string(dir.path().join(INTRINSICS_FILE)).unwrap();
        assert_eq!(text, "fx fy cx cy\n512.0 512.0 256.0 256.0");
        assert_eq!(IntrinsicsWriter::read(dir.path()).unwrap(), Intrinsics::default());
    }
}
