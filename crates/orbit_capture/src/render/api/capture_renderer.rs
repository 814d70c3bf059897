//! Renderer abstraction for the capture pipeline
//!
//! This module defines the trait a rendering engine implements so the capture
//! pipeline can stage a scene, move the camera and synthesize frames without
//! depending on any particular engine.

use std::path::Path;

use crate::capture::pose_sampler::CameraPose;
use crate::render::RenderError;
use crate::scene::SceneBuildPlan;

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Capture-facing rendering capability
///
/// The pipeline holds the renderer by `&mut` for a whole scene and calls it
/// strictly in order: one `build_scene`, then for each view `set_camera_pose`
/// followed by `render_to_file`. Implementations may assume scene state and
/// camera pose do not change between those calls.
pub trait CaptureRenderer {
    /// Stage the scene described by `plan`, replacing anything staged before
    fn build_scene(&mut self, plan: &SceneBuildPlan) -> RenderResult<()>;

    /// Move the camera to `pose`
    ///
    /// `pose.orientation` is camera-to-world with the camera looking down its
    /// local -Z axis and local +Y up.
    fn set_camera_pose(&mut self, pose: &CameraPose) -> RenderResult<()>;

    /// Synthesize the current view and write it to `path`
    ///
    /// Must be synchronous: the file is complete when this returns `Ok`.
    fn render_to_file(&mut self, path: &Path) -> RenderResult<()>;

    /// File extension of the images this renderer writes
    fn image_extension(&self) -> &str {
        "png"
    }
}
