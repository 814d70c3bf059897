//! Capture pipeline errors

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ConfigError;
use crate::render::RenderError;

/// Errors raised while reading calibration artifacts back
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A line does not have the expected shape
    #[error("line {line}: {reason}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// The rotation stream ended in the middle of a 3-line group
    #[error("rotation data has {lines} lines, expected a multiple of 3")]
    IncompleteRotation {
        /// Number of non-empty lines found
        lines: usize,
    },

    /// Rotation and translation streams disagree on the number of views
    #[error("{rotations} rotation records but {translations} translation records")]
    CountMismatch {
        /// Records in the rotation stream
        rotations: usize,
        /// Records in the translation stream
        translations: usize,
    },
}

/// Capture pipeline errors
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Configuration rejected before any file was created
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// View index outside `0..view_count`
    #[error("View index {index} out of range for {view_count} views")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Views on the orbit
        view_count: usize,
    },

    /// The camera coincides with the target, so there is no view direction
    #[error("Degenerate camera pose for view {index}: camera position coincides with target")]
    DegeneratePose {
        /// Offending view index
        index: usize,
    },

    /// The renderer could not stage the scene
    #[error("Scene setup failed for '{material}': {source}")]
    SceneSetup {
        /// Material variant being staged
        material: String,
        /// Renderer error
        #[source]
        source: RenderError,
    },

    /// The renderer failed to produce a view
    #[error("Renderer failed on view {index}: {source}")]
    Render {
        /// View index that failed
        index: usize,
        /// Renderer error
        #[source]
        source: RenderError,
    },

    /// Reading or writing an artifact failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be parsed
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Parse failure
        #[source]
        source: ParseError,
    },

    /// A scene directory violates the image/record alignment invariant
    #[error("Scene {} is misaligned: {reason}", path.display())]
    Misaligned {
        /// Scene directory
        path: PathBuf,
        /// Which check failed
        reason: String,
    },
}

impl CaptureError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| Self::Io { path, source }
    }

    /// Wrap a parse error with the file it came from
    pub fn parse(path: impl AsRef<Path>) -> impl FnOnce(ParseError) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| Self::Parse { path, source }
    }
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;
