//! Exposure sorting and merging module
//!
//! Normalises the provided exposure keys to signed EV values, resolves
//! duplicates and orders the samples into per-patch exposure sequences.

mod key;
mod sorter;

pub use key::{ExposureValue, format_exposure_key, parse_exposure_key};
pub use sorter::{ExposureSeries, ExposureSorter, MergeReport, Overwrite};
