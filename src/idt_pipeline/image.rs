//! Image reading module
//!
//! Decodes colour-checker and grey-card photographs into normalised,
//! interleaved float RGB, in whichever format the camera delivered them.

mod debayer;
mod rawloader_reader;
mod reader;
mod source;
mod tiff_reader;
pub mod types;

pub use debayer::{BayerPattern, CpuDebayer};
pub use rawloader_reader::RawLoaderReader;
pub use reader::ImageReader;
pub use source::{FileImageSource, ImageSource};
pub use tiff_reader::TiffReader;
pub use types::RgbImage;
