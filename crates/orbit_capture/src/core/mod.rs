//! # Core Module
//!
//! Shared configuration used by every subsystem of the capture pipeline.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for orbit, intrinsics, output and materials
//! - **Foundation**: Low-level utilities (math, logging)

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;

// Re-export commonly used config types
pub use config::{
    CaptureConfig,
    OrbitConfig,
    ImageConfig,
    FailurePolicy,
    Config,
    ConfigError,
};
