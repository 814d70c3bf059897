//! Multi-material dataset runs
//!
//! One scene directory per material variant under the output root. Scenes
//! share nothing but the renderer, which is restaged before each one.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::ConfigError;
use crate::core::config::CaptureConfig;
use crate::render::CaptureRenderer;
use crate::scene::{MaterialVariant, SceneBuildPlan};
use super::error::{CaptureError, CaptureResult};
use super::manifest::SceneManifest;
use super::orchestrator::{CaptureOrchestrator, CaptureReport};

/// Result of capturing one material variant
#[derive(Debug, Clone)]
pub struct SceneReport {
    /// Material variant name
    pub material: String,
    /// Capture loop outcome
    pub capture: CaptureReport,
    /// Path of the written manifest
    pub manifest: PathBuf,
}

/// Result of a whole dataset run
#[derive(Debug, Clone)]
pub struct DatasetReport {
    /// Root directory holding every scene
    pub output_root: PathBuf,
    /// Per-scene results in configuration order
    pub scenes: Vec<SceneReport>,
    /// Wall-clock time spent
    pub elapsed: Duration,
}

impl DatasetReport {
    /// Views rendered across all scenes
    pub fn total_rendered(&self) -> usize {
        self.scenes.iter().map(|s| s.capture.rendered.len()).sum()
    }

    /// Views skipped across all scenes
    pub fn total_skipped(&self) -> usize {
        self.scenes.iter().map(|s| s.capture.skipped.len()).sum()
    }
}

/// Captures every configured material variant
pub struct DatasetRunner {
    config: CaptureConfig,
    orchestrator: CaptureOrchestrator,
}

impl DatasetRunner {
    /// Validate the configuration and prepare the output root
    ///
    /// Fails before any scene file is created if the configuration is invalid
    /// or the output root cannot be written.
    pub fn new(config: CaptureConfig) -> CaptureResult<Self> {
        let orchestrator = CaptureOrchestrator::new(&config)?;
        prepare_output_root(&config.output_root)?;
        Ok(Self { config, orchestrator })
    }

    /// Configuration in use
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Directory a material variant is captured into
    pub fn scene_dir(&self, material: &MaterialVariant) -> PathBuf {
        self.config.output_root.join(&material.name)
    }

    /// Stage and capture each material variant in turn
    pub fn run(&self, renderer: &mut dyn CaptureRenderer) -> CaptureResult<DatasetReport> {
        let start = Instant::now();
        let mut scenes = Vec::with_capacity(self.config.materials.len());

        for (i, material) in self.config.materials.iter().enumerate() {
            log::info!(
                "Scene {}/{}: material '{}'",
                i + 1,
                self.config.materials.len(),
                material.name
            );

            let plan = SceneBuildPlan::for_variant(material.clone(), &self.config);
            renderer.build_scene(&plan).map_err(|source| CaptureError::SceneSetup {
                material: material.name.clone(),
                source,
            })?;

            let scene_dir = self.scene_dir(material);
            let capture = self.orchestrator.run(renderer, &scene_dir)?;
            let manifest = SceneManifest::new(&self.config, material, &capture).write(&scene_dir)?;

            scenes.push(SceneReport {
                material: material.name.clone(),
                capture,
                manifest,
            });
        }

        let report = DatasetReport {
            output_root: self.config.output_root.clone(),
            scenes,
            elapsed: start.elapsed(),
        };
        log::info!(
            "Dataset complete: {} scenes, {} views rendered, {} skipped in {:.2?}",
            report.scenes.len(),
            report.total_rendered(),
            report.total_skipped(),
            report.elapsed
        );
        Ok(report)
    }
}

fn prepare_output_root(root: &Path) -> CaptureResult<()> {
    std::fs::create_dir_all(root).map_err(CaptureError::io(root))?;
    let metadata = std::fs::metadata(root).map_err(CaptureError::io(root))?;
    if !metadata.is_dir() {
        return Err(ConfigError::Invalid(format!("output root {} is not a directory", root.display())).into());
    }
    if metadata.permissions().readonly() {
        return Err(ConfigError::Invalid(format!("output root {} is not writable", root.display())).into());
    }
    Ok(())
}
