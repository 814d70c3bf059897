//! Public rendering API
//!
//! The capability interface the capture pipeline drives.

pub mod capture_renderer;

pub use capture_renderer::{CaptureRenderer, RenderResult};
