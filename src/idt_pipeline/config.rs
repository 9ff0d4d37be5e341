//! Pipeline configuration module
//!
//! Immutable, validated configuration values handed to each stage, and the
//! string-typed project settings they are loaded from.

pub mod enums;
pub mod settings;
pub mod types;

pub use enums::{
    BoundaryPolicy, DecodingMethod, Interpolator, LutPatchSelection, WhiteBalanceRefinement,
};
pub use settings::{CaptureSet, ProjectSettings};
pub use types::{
    DecodingConfig, IdtConfig, IdtConfigBuilder, LutConfig, OptimiserConfig, SamplingConfig,
};
