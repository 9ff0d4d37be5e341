//! Common utilities module
//!
//! This module contains shared utilities used across the characterisation stages.

pub mod error;
pub mod timing;

pub use error::{IdtError, Result, Stage};
pub use timing::{PipelineTimings, StageTiming, Timer};
