//! Decoding LUT module
//!
//! Fits the camera's encoded-to-linear curve from the exposure series and
//! turns it into a monotone, fixed-size 1-D LUT per channel.

mod builder;
mod filter;
pub mod interpolate;
pub mod types;

pub use builder::{FittedCurve, LutBuilder, isotonic_regression};
pub use filter::{LutFilter, enforce_monotonic};
pub use types::{Coverage, Lut1D, Lut3x1D};
