//! Per-scene `scene.ron` manifest
//!
//! Records what the plain-text calibration files cannot: which translation
//! convention `T_matrix.txt` uses, the camera frame, the orbit the views were
//! sampled from and the image belonging to each record.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::core::config::{CaptureConfig, ImageConfig, OrbitConfig};
use crate::scene::MaterialVariant;
use super::error::{CaptureError, CaptureResult};
use super::extrinsics::TranslationConvention;
use super::intrinsics::Intrinsics;
use super::orchestrator::{view_filename, CaptureReport};

/// File holding the scene manifest
pub const MANIFEST_FILE: &str = "scene.ron";

/// Camera frame every rotation in `R_matrix.txt` refers to
pub const CAMERA_FRAME: &str = "right-handed; +X right, +Y up, looking down -Z; world up +Z, fallback +Y";

/// One rendered view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEntry {
    /// View index on the orbit
    pub index: usize,
    /// Image filename relative to the scene directory
    pub image: String,
}

/// Description of one captured scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneManifest {
    /// When the capture finished
    pub created_at: DateTime<Utc>,
    /// Material variant rendered
    pub material: MaterialVariant,
    /// Orbit the poses were sampled from
    pub orbit: OrbitConfig,
    /// Intrinsics written to `intrinsic.txt`
    pub intrinsics: Intrinsics,
    /// Output resolution
    pub image: ImageConfig,
    /// Meaning of `T_matrix.txt`
    pub translation_convention: TranslationConvention,
    /// Camera frame convention
    pub camera_frame: String,
    /// Views with an image and a record, in record order
    pub views: Vec<ViewEntry>,
    /// Views dropped after a renderer failure
    #[serde(default)]
    pub skipped: Vec<usize>,
}

impl SceneManifest {
    /// Describe a finished capture
    pub fn new(config: &CaptureConfig, material: &MaterialVariant, report: &CaptureReport) -> Self {
        let views = report
            .rendered
            .iter()
            .map(|&index| ViewEntry {
                index,
                image: view_filename(index, &report.image_extension),
            })
            .collect();

        Self {
            created_at: Utc::now(),
            material: material.clone(),
            orbit: config.orbit.clone(),
            intrinsics: config.intrinsics,
            image: config.image.clone(),
            translation_convention: config.translation_convention,
            camera_frame: CAMERA_FRAME.to_string(),
            views,
            skipped: report.skipped.clone(),
        }
    }

    /// Write `scene.ron` into `scene_dir`
    pub fn write(&self, scene_dir: &Path) -> CaptureResult<PathBuf> {
        let path = scene_dir.join(MANIFEST_FILE);
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(&path, text).map_err(CaptureError::io(&path))?;
        log::debug!("Wrote manifest to {}", path.display());
        Ok(path)
    }

    /// Read `scene.ron` from `scene_dir`
    pub fn read(scene_dir: &Path) -> CaptureResult<Self> {
        let path = scene_dir.join(MANIFEST_FILE);
        let text = std::fs::read_to_string(&path).map_err(CaptureError::io(&path))?;
        let manifest = ron::from_str(&text)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_manifest_lists_rendered_views() {
        let config = CaptureConfig::default().with_view_count(4);
        let report = CaptureReport {
            scene_dir: PathBuf::from("dataset/glass"),
            rendered: vec![0, 1, 3],
            skipped: vec![2],
            image_extension: "png".to_string(),
            elapsed: Duration::from_millis(10),
        };
        let manifest = SceneManifest::new(&config, &MaterialVariant::glass(), &report);

        assert_eq!(manifest.views.len(), 3);
        assert_eq!(manifest.views[2], ViewEntry { index: 3, image: "view_003.png".to_string() });
        assert_eq!(manifest.skipped, vec![2]);
        assert_eq!(manifest.translation_convention, TranslationConvention::CameraCenter);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let config = CaptureConfig::default()
            .with_view_count(2)
            .with_translation_convention(TranslationConvention::WorldToCamera);
        let report = CaptureReport {
            scene_dir: dir.path().to_path_buf(),
            rendered: vec![0, 1],
            skipped: vec![],
            image_extension: "png".to_string(),
            elapsed: Duration::ZERO,
        };
        let manifest = SceneManifest::new(&config, &MaterialVariant::metal(), &report);
        manifest.write(dir.path()).unwrap();

        let loaded = SceneManifest::read(dir.path()).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_read_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(SceneManifest::read(dir.path()), Err(CaptureError::Io { .. })));
    }
}
