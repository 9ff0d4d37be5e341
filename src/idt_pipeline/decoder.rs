//! LUT decoding module
//!
//! Reduces the filtered per-channel LUT to the configured decoding method and
//! decodes the checker and grey-card samples to scene-linear RGB.

mod lut_decoder;
pub mod types;

pub use lut_decoder::{Decoder, reduce_lut};
pub use types::{DecodedSamples, DecodingLut};
