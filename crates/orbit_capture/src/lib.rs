//! # Orbit Capture
//!
//! Synthetic multi-view dataset capture with exported camera calibration.
//!
//! ## Features
//!
//! - **Orbit Sampling**: Deterministic circular camera paths around a fixed target
//! - **Calibration Export**: `intrinsic.txt`, `R_matrix.txt` and `T_matrix.txt`
//!   written in lockstep with the rendered frames
//! - **Material Variants**: One scene directory per declarative material
//! - **Pluggable Rendering**: Any engine implementing [`render::CaptureRenderer`];
//!   a CPU preview renderer is included
//! - **Verification**: Read a scene back and check image/record alignment
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orbit_capture::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CaptureConfig::new("dataset").with_view_count(50);
//!     let mut renderer = PreviewRenderer::new(config.intrinsics, PreviewSettings::default())?;
//!
//!     let report = DatasetRunner::new(config)?.run(&mut renderer)?;
//!     for scene in &report.scenes {
//!         verify_scene(&scene.capture.scene_dir)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Shared configuration
pub mod core;

pub mod foundation;
pub mod config;
pub mod capture;
pub mod scene;
pub mod render;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        capture::{
            verify_scene, CameraPose, CaptureError, CaptureOrchestrator, CaptureReport, DatasetReport,
            DatasetRunner, ExtrinsicRecord, Intrinsics, PoseSampler, SceneManifest, TranslationConvention,
        },
        config::Config,
        core::config::{CaptureConfig, FailurePolicy, ImageConfig, OrbitConfig},
        foundation::math::{Mat3, Vec3},
        render::{CaptureRenderer, PreviewRenderer, PreviewSettings, RenderError},
        scene::{MaterialVariant, SceneBuildPlan, ShadingParams},
    };
}
