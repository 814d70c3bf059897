//! Scene description
//!
//! Declarative inputs for the renderer: material variants and the per-scene
//! build plan. Nothing in here touches pose math or calibration output.

pub mod material;
pub mod build_plan;

pub use material::{MaterialVariant, ShadingParams};
pub use build_plan::{SceneBuildPlan, SubjectMesh, GroundPlane, AreaLight, WorldBackground, RenderSettings};
