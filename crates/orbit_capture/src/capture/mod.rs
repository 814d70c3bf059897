//! Dataset capture
//!
//! Camera orbit sampling, calibration export and the capture loop that keeps
//! rendered images and extrinsic records index-aligned.
//!
//! Each scene directory holds:
//! - `intrinsic.txt`: pinhole intrinsics
//! - `R_matrix.txt` / `T_matrix.txt`: one extrinsic record per view
//! - `view_000.png`, `view_001.png`, ...: one image per record
//! - `scene.ron`: manifest describing the conventions used

pub mod dataset;
pub mod error;
pub mod extrinsics;
pub mod intrinsics;
pub mod manifest;
pub mod orchestrator;
pub mod pose_sampler;
pub mod verify;

pub use dataset::{DatasetReport, DatasetRunner, SceneReport};
pub use error::{CaptureError, CaptureResult, ParseError};
pub use extrinsics::{ExtrinsicRecord, ExtrinsicsWriter, TranslationConvention};
pub use intrinsics::{Intrinsics, IntrinsicsWriter};
pub use manifest::{SceneManifest, ViewEntry};
pub use orchestrator::{view_filename, CaptureOrchestrator, CaptureReport};
pub use pose_sampler::{CameraPose, PoseSampler};
pub use verify::{verify_scene, SceneSummary};
