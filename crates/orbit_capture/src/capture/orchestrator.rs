//! Per-scene capture loop
//!
//! Drives one scene: intrinsics are written once, then every view is posed,
//! rendered and recorded in index order. An image and its extrinsic record are
//! produced together or not at all.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::core::config::{CaptureConfig, FailurePolicy};
use crate::render::{CaptureRenderer, RenderError};
use super::error::{CaptureError, CaptureResult};
use super::extrinsics::{ExtrinsicRecord, ExtrinsicsWriter};
use super::intrinsics::IntrinsicsWriter;
use super::pose_sampler::{CameraPose, PoseSampler};

/// Image filename for a view: `view_{index:03}.{ext}`
pub fn view_filename(index: usize, extension: &str) -> String {
    format!("view_{index:03}.{extension}")
}

/// Outcome of one scene capture
#[derive(Debug, Clone)]
pub struct CaptureReport {
    /// Directory the scene was written to
    pub scene_dir: PathBuf,
    /// Views with both an image and a record, in order
    pub rendered: Vec<usize>,
    /// Views skipped under [`FailurePolicy::SkipAndLog`]
    pub skipped: Vec<usize>,
    /// Image extension used for every view
    pub image_extension: String,
    /// Wall-clock time spent
    pub elapsed: Duration,
}

impl CaptureReport {
    /// Image filenames of the rendered views
    pub fn image_files(&self) -> impl Iterator<Item = String> + '_ {
        self.rendered.iter().map(|&index| view_filename(index, &self.image_extension))
    }
}

/// Runs the capture loop for one scene
pub struct CaptureOrchestrator {
    config: CaptureConfig,
    sampler: PoseSampler,
}

impl CaptureOrchestrator {
    /// Create an orchestrator from a configuration, validating it first
    pub fn new(config: &CaptureConfig) -> CaptureResult<Self> {
        config.validate()?;
        let sampler = PoseSampler::new(config.orbit.clone())?;
        Ok(Self {
            config: config.clone(),
            sampler,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Pose sampler in use
    pub fn sampler(&self) -> &PoseSampler {
        &self.sampler
    }

    /// Capture every view of the staged scene into `scene_dir`
    ///
    /// The renderer must already hold the scene. View images left in
    /// `scene_dir` by an earlier run are deleted first. Under
    /// [`FailurePolicy::Abort`] the first failing view ends the run, its partial
    /// image is removed, and the extrinsic files keep the records of the views
    /// completed before it.
    pub fn run(&self, renderer: &mut dyn CaptureRenderer, scene_dir: &Path) -> CaptureResult<CaptureReport> {
        let start = Instant::now();
        std::fs::create_dir_all(scene_dir).map_err(CaptureError::io(scene_dir))?;
        let stale = remove_stale_views(scene_dir)?;
        if stale > 0 {
            log::info!("Removed {} view images left by an earlier run in {}", stale, scene_dir.display());
        }

        IntrinsicsWriter::write(scene_dir, &self.config.intrinsics)?;
        let mut writer = ExtrinsicsWriter::create(scene_dir)?;

        let extension = renderer.image_extension().to_string();
        let view_count = self.sampler.view_count();
        let mut rendered = Vec::with_capacity(view_count);
        let mut skipped = Vec::new();

        log::info!(
            "Capturing {} views into {} ({:?})",
            view_count,
            scene_dir.display(),
            self.config.failure_policy
        );

        for index in 0..view_count {
            let pose = self.sampler.sample(index)?;
            let image_path = scene_dir.join(view_filename(index, &extension));

            match capture_view(renderer, &pose, &image_path) {
                Ok(()) => {
                    let record = ExtrinsicRecord::encode(&pose, self.config.translation_convention);
                    writer.append(&record)?;
                    rendered.push(index);
                    log::debug!("View {}/{} -> {}", index + 1, view_count, image_path.display());
                }
                Err(source) => match self.config.failure_policy {
                    FailurePolicy::Abort => {
                        remove_partial_image(&image_path)?;
                        writer.flush()?;
                        log::error!("View {index} failed, aborting scene: {source}");
                        return Err(CaptureError::Render { index, source });
                    }
                    FailurePolicy::SkipAndLog => {
                        remove_partial_image(&image_path)?;
                        log::warn!("Skipping view {index}: {source}");
                        skipped.push(index);
                    }
                },
            }
        }

        writer.finish()?;
        let elapsed = start.elapsed();
        log::info!(
            "Scene {} done: {} rendered, {} skipped in {:.2?}",
            scene_dir.display(),
            rendered.len(),
            skipped.len(),
            elapsed
        );

        Ok(CaptureReport {
            scene_dir: scene_dir.to_path_buf(),
            rendered,
            skipped,
            image_extension: extension,
            elapsed,
        })
    }
}

/// Pose the camera and render one view
///
/// A renderer that reports success without producing the file counts as a
/// failure, otherwise a record would exist without its image.
fn capture_view(renderer: &mut dyn CaptureRenderer, pose: &CameraPose, image_path: &Path) -> Result<(), RenderError> {
    renderer.set_camera_pose(pose)?;
    renderer.render_to_file(image_path)?;
    if image_path.is_file() {
        Ok(())
    } else {
        Err(RenderError::RenderingFailed(format!(
            "renderer reported success but {} was not written",
            image_path.display()
        )))
    }
}

/// Delete whatever a failed render left at `path`
fn remove_partial_image(path: &Path) -> CaptureResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed partial image {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CaptureError::Io { path: path.to_path_buf(), source: e }),
    }
}

/// Delete `view_*` files from a previous run so every image has a record
fn remove_stale_views(scene_dir: &Path) -> CaptureResult<usize> {
    let entries = std::fs::read_dir(scene_dir).map_err(CaptureError::io(scene_dir))?;
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(CaptureError::io(scene_dir))?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with("view_") && path.is_file() {
            std::fs::remove_file(&path).map_err(CaptureError::io(&path))?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneBuildPlan;
    use crate::render::RenderResult;
    use crate::capture::extrinsics::TRANSLATION_FILE;

    /// Writes a placeholder file per view, optionally failing on some indices
    struct StubRenderer {
        fail_on: Vec<usize>,
        leave_partial: bool,
        current: Option<usize>,
    }

    impl StubRenderer {
        fn new(fail_on: Vec<usize>) -> Self {
            Self { fail_on, leave_partial: false, current: None }
        }
    }

    impl CaptureRenderer for StubRenderer {
        fn build_scene(&mut self, _plan: &SceneBuildPlan) -> RenderResult<()> {
            Ok(())
        }

        fn set_camera_pose(&mut self, pose: &CameraPose) -> RenderResult<()> {
            self.current = Some(pose.index);
            Ok(())
        }

        fn render_to_file(&mut self, path: &Path) -> RenderResult<()> {
            let index = self.current.ok_or_else(|| RenderError::RenderingFailed("no pose".into()))?;
            if self.fail_on.contains(&index) {
                if self.leave_partial {
                    std::fs::write(path, b"partial").unwrap();
                }
                return Err(RenderError::BackendError(format!("view {index} exploded")));
            }
            std::fs::write(path, b"image").unwrap();
            Ok(())
        }
    }

    fn config(views: usize, policy: FailurePolicy) -> CaptureConfig {
        CaptureConfig::default()
            .with_view_count(views)
            .with_failure_policy(policy)
    }

    #[test]
    fn test_view_filename_padding() {
        assert_eq!(view_filename(0, "png"), "view_000.png");
        assert_eq!(view_filename(42, "png"), "view_042.png");
        assert_eq!(view_filename(1234, "exr"), "view_1234.exr");
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            CaptureOrchestrator::new(&config(0, FailurePolicy::Abort)),
            Err(CaptureError::Config(_))
        ));
    }

    #[test]
    fn test_successful_run_reports_every_view() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(&config(6, FailurePolicy::Abort)).unwrap();
        let report = orchestrator.run(&mut StubRenderer::new(vec![]), dir.path()).unwrap();

        assert_eq!(report.rendered, (0..6).collect::<Vec<_>>());
        assert!(report.skipped.is_empty());
        assert_eq!(report.image_files().last().unwrap(), "view_005.png");
    }

    #[test]
    fn test_skip_removes_partial_image() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(&config(4, FailurePolicy::SkipAndLog)).unwrap();
        let mut renderer = StubRenderer::new(vec![1]);
        renderer.leave_partial = true;

        let report = orchestrator.run(&mut renderer, dir.path()).unwrap();
        assert_eq!(report.rendered, vec![0, 2, 3]);
        assert_eq!(report.skipped, vec![1]);
        assert!(!dir.path().join("view_001.png").exists());
    }

    #[test]
    fn test_missing_output_counts_as_failure() {
        struct SilentRenderer;

        impl CaptureRenderer for SilentRenderer {
            fn build_scene(&mut self, _plan: &SceneBuildPlan) -> RenderResult<()> {
                Ok(())
            }
            fn set_camera_pose(&mut self, _pose: &CameraPose) -> RenderResult<()> {
                Ok(())
            }
            fn render_to_file(&mut self, _path: &Path) -> RenderResult<()> {
                Ok(())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(&config(3, FailurePolicy::Abort)).unwrap();
        assert!(matches!(
            orchestrator.run(&mut SilentRenderer, dir.path()),
            Err(CaptureError::Render { index: 0, .. })
        ));
    }

    fn count_lines(path: &Path) -> usize {
        std::fs::read_to_string(path).unwrap().lines().count()
    }

    fn count_views(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("view_"))
            .count()
    }

    #[test]
    fn test_abort_removes_partial_image() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(&config(5, FailurePolicy::Abort)).unwrap();
        let mut renderer = StubRenderer::new(vec![2]);
        renderer.leave_partial = true;

        assert!(matches!(
            orchestrator.run(&mut renderer, dir.path()),
            Err(CaptureError::Render { index: 2, .. })
        ));
        assert!(!dir.path().join("view_002.png").exists());
        assert_eq!(count_views(dir.path()), 2);
        assert_eq!(count_lines(&dir.path().join(TRANSLATION_FILE)), 2);
    }

    #[test]
    fn test_rerun_clears_previous_views() {
        let dir = tempfile::tempdir().unwrap();
        CaptureOrchestrator::new(&config(6, FailurePolicy::Abort))
            .unwrap()
            .run(&mut StubRenderer::new(vec![]), dir.path())
            .unwrap();
        assert_eq!(count_views(dir.path()), 6);

        let rerun = CaptureOrchestrator::new(&config(5, FailurePolicy::Abort)).unwrap();
        assert!(rerun.run(&mut StubRenderer::new(vec![2]), dir.path()).is_err());

        assert_eq!(count_lines(&dir.path().join(TRANSLATION_FILE)), 2);
        assert_eq!(count_views(dir.path()), 2);
    }

    #[test]
    fn test_undeletable_partial_output_is_fatal() {
        /// Leaves a directory where the image should be, then fails
        struct CloggingRenderer;

        impl CaptureRenderer for CloggingRenderer {
            fn build_scene(&mut self, _plan: &SceneBuildPlan) -> RenderResult<()> {
                Ok(())
            }
            fn set_camera_pose(&mut self, _pose: &CameraPose) -> RenderResult<()> {
                Ok(())
            }
            fn render_to_file(&mut self, path: &Path) -> RenderResult<()> {
                std::fs::create_dir(path).unwrap();
                Err(RenderError::RenderingFailed("disk trouble".into()))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(&config(3, FailurePolicy::SkipAndLog)).unwrap();
        assert!(matches!(
            orchestrator.run(&mut CloggingRenderer, dir.path()),
            Err(CaptureError::Io { .. })
        ));
    }
}
