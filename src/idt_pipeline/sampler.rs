//! Colour-checker sampling module
//!
//! Extracts one robust mean per checker patch and exposure from the
//! photographs, rejecting outlier pixels by z-score.

mod geometry;
mod outliers;
mod patch_sampler;
pub mod types;

pub use geometry::{ChartGeometry, PatchRegion};
pub use outliers::{mask_outliers, robust_mean};
pub use patch_sampler::Sampler;
pub use types::{CaptureSamples, RawSample, SamplerOutput};
