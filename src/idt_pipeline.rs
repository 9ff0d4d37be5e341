//! Camera IDT characterisation pipeline
//!
//! Photographs of a reference colour checker shot at several exposures go
//! in; a monotone decoding LUT and a `k · M · diag(RGB_w)` colour transform
//! into ACES2065-1 come out.

pub mod colour;
pub mod common;
pub mod config;
pub mod decoder;
pub mod exposure;
pub mod image;
pub mod lut;
pub mod optimiser;
mod pipeline;
pub mod sampler;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use common::{IdtError, PipelineTimings, Result, Stage};
pub use config::{CaptureSet, IdtConfig, IdtConfigBuilder, ProjectSettings};
pub use decoder::DecodingLut;
pub use optimiser::OptimisationResult;
pub use pipeline::{IdtOutcome, IdtPipeline};
pub use sampler::{ChartGeometry, PatchRegion};
