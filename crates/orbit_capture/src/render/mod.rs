//! Rendering
//!
//! The capture core reaches a rendering engine only through the
//! [`CaptureRenderer`] trait. [`PreviewRenderer`] is the in-tree
//! implementation: a CPU ray caster producing PNG frames.

pub mod api;
pub mod preview;

pub use api::{CaptureRenderer, RenderResult};
pub use preview::{PreviewRenderer, PreviewSettings};

use thiserror::Error;

/// Rendering system errors
///
/// Covers the ways a renderer can fail while staging a scene or producing a
/// view.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization or scene staging failed
    ///
    /// Occurs when the renderer cannot build the scene described by a
    /// build plan, or is asked to render before any scene was staged.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Encoding or writing the output image failed
    #[error("Image output failed: {0}")]
    ImageOutput(#[from] image::ImageError),

    /// Backend-specific error occurred
    ///
    /// Wraps errors from external engines in a generic form for consistent
    /// handling by the capture pipeline.
    #[error("Backend error: {0}")]
    BackendError(String),
}
