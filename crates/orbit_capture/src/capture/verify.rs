//! Read-back checks for captured scenes
//!
//! A scene is consistent when `R_matrix.txt` holds 3N lines, `T_matrix.txt`
//! holds N lines, every rotation is orthonormal and exactly N view images
//! exist. When `scene.ron` is present its view list and orbit are checked too.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::foundation::math::{Mat3Ext, Vec3};
use super::error::{CaptureError, CaptureResult};
use super::extrinsics::{parse_rotations, parse_translations, ExtrinsicRecord, ROTATION_FILE, TRANSLATION_FILE};
use super::intrinsics::{Intrinsics, IntrinsicsWriter};
use super::manifest::{SceneManifest, MANIFEST_FILE};
use super::orchestrator::view_filename;

/// Tolerance for rotations read back from six-decimal text
pub const ROTATION_TOLERANCE: f64 = 1e-5;

/// Tolerance for camera positions and view directions read back from text
const POSE_TOLERANCE: f64 = 1e-4;

/// What a verified scene contains
#[derive(Debug, Clone)]
pub struct SceneSummary {
    /// Scene directory
    pub scene_dir: PathBuf,
    /// Number of aligned views
    pub view_count: usize,
    /// Parsed intrinsics
    pub intrinsics: Intrinsics,
    /// Image filenames in record order
    pub images: Vec<String>,
    /// Manifest, if the scene has one
    pub manifest: Option<SceneManifest>,
}

/// Check a scene directory for image/record alignment
pub fn verify_scene(scene_dir: &Path) -> CaptureResult<SceneSummary> {
    let misaligned = |reason: String| CaptureError::Misaligned {
        path: scene_dir.to_path_buf(),
        reason,
    };

    let intrinsics = IntrinsicsWriter::read(scene_dir)?;

    let rotation_path = scene_dir.join(ROTATION_FILE);
    let translation_path = scene_dir.join(TRANSLATION_FILE);
    let rotation_text = std::fs::read_to_string(&rotation_path).map_err(CaptureError::io(&rotation_path))?;
    let translation_text = std::fs::read_to_string(&translation_path).map_err(CaptureError::io(&translation_path))?;
    let rotations = parse_rotations(&rotation_text).map_err(CaptureError::parse(&rotation_path))?;
    let translations = parse_translations(&translation_text).map_err(CaptureError::parse(&translation_path))?;

    if rotations.len() != translations.len() {
        return Err(misaligned(format!(
            "{} rotation records ({} lines) but {} translation records",
            rotations.len(),
            rotations.len() * 3,
            translations.len()
        )));
    }
    let view_count = rotations.len();

    if let Some(i) = rotations.iter().position(|r| !r.is_rotation(ROTATION_TOLERANCE)) {
        return Err(misaligned(format!("rotation record {i} is not orthonormal")));
    }

    let manifest = if scene_dir.join(MANIFEST_FILE).is_file() {
        Some(SceneManifest::read(scene_dir)?)
    } else {
        None
    };

    let found = view_images(scene_dir)?;
    let images: Vec<String> = match &manifest {
        Some(manifest) => manifest.views.iter().map(|v| v.image.clone()).collect(),
        None => {
            let extension = found
                .iter()
                .find_map(|name| Path::new(name).extension().and_then(|e| e.to_str()))
                .unwrap_or("png");
            (0..view_count).map(|i| view_filename(i, extension)).collect()
        }
    };

    if images.len() != view_count {
        return Err(misaligned(format!(
            "manifest lists {} views but {} records exist",
            images.len(),
            view_count
        )));
    }
    if let Some(missing) = images.iter().find(|name| !found.contains(*name)) {
        return Err(misaligned(format!("missing image {missing}")));
    }
    if let Some(extra) = found.iter().find(|name| !images.contains(*name)) {
        return Err(misaligned(format!("image {extra} has no record")));
    }

    if let Some(manifest) = &manifest {
        if manifest.intrinsics != intrinsics {
            return Err(misaligned("intrinsic.txt disagrees with the manifest".to_string()));
        }
        let records = rotations
            .into_iter()
            .zip(translations)
            .map(|(rotation, translation)| ExtrinsicRecord { rotation, translation });
        for (view, record) in manifest.views.iter().zip(records) {
            check_pose(manifest, view.index, &record).map_err(misaligned)?;
        }
    }

    log::debug!("Verified {} views in {}", view_count, scene_dir.display());
    Ok(SceneSummary {
        scene_dir: scene_dir.to_path_buf(),
        view_count,
        intrinsics,
        images,
        manifest,
    })
}

/// Check a record against the orbit position and look-at target of its view
fn check_pose(manifest: &SceneManifest, index: usize, record: &ExtrinsicRecord) -> Result<(), String> {
    let orbit = &manifest.orbit;
    let center = record.camera_center(manifest.translation_convention);

    if (center.xy().norm() - orbit.radius).abs() > POSE_TOLERANCE || (center.z - orbit.height).abs() > POSE_TOLERANCE {
        return Err(format!("view {index} camera centre {center:?} is off the orbit"));
    }

    // Third row of a world-to-camera rotation is the camera's back axis in world space
    let forward: Vec3 = -record.rotation.row(2).transpose();
    let to_target = (orbit.target - center).normalize();
    if forward.dot(&to_target) < 1.0 - POSE_TOLERANCE {
        return Err(format!("view {index} does not look at the orbit target"));
    }
    Ok(())
}

/// Names of the `view_*` files in a scene directory
fn view_images(scene_dir: &Path) -> CaptureResult<BTreeSet<String>> {
    let entries = std::fs::read_dir(scene_dir).map_err(CaptureError::io(scene_dir))?;
    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(CaptureError::io(scene_dir))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("view_") && entry.path().is_file() {
            names.insert(name);
        }
    }
    Ok(names)
}
