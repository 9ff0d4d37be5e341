//! Camera RAW reader built on the rawloader library.
//!
//! Supports any 2x2 Bayer or RGB RAW format rawloader can decode (ARW, CR2,
//! NEF, DNG, ...). Sensor counts are mapped to `[0, 1]` with the black and
//! white level of each filter colour, then demosaiced with the file's CFA
//! layout. Camera white balance and colour matrices are left out.

use std::io::Cursor;

use rawloader::RawImageData as RawloaderImageData;
use tracing::debug;

use crate::idt_pipeline::common::error::{IdtError, Result};
use crate::idt_pipeline::image::debayer::{BayerPattern, CpuDebayer};
use crate::idt_pipeline::image::reader::ImageReader;
use crate::idt_pipeline::image::types::RgbImage;

pub struct RawLoaderReader;

/// Full scale of the 16-bit mosaic handed to the demosaicer.
const MOSAIC_SCALE: f32 = u16::MAX as f32;

impl ImageReader for RawLoaderReader {
    /// Decodes RAW bytes into normalised camera RGB.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use prosumer_idt_rs::idt_pipeline::image::{ImageReader, RawLoaderReader};
    ///
    /// let raw_bytes = std::fs::read("checker_0EV.arw").unwrap();
    /// let image = RawLoaderReader.read_image(&raw_bytes).unwrap();
    /// ```
    fn read_image(&self, data: &[u8]) -> Result<RgbImage> {
        debug!("Decoding RAW image, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| IdtError::DecodeError(e.to_string()))?;

        let width = decoded.width;
        let height = decoded.height;
        debug!(
            "Decoded image: {}x{}, cpp={}, cfa={}, black={:?}, white={:?}",
            width,
            height,
            decoded.cpp,
            decoded.cfa.name,
            decoded.blacklevels,
            decoded.whitelevels
        );

        match (decoded.cpp, decoded.data) {
            (3, RawloaderImageData::Integer(counts)) => {
                let samples = normalise_rgb(&counts, decoded.blacklevels, decoded.whitelevels);
                RgbImage::new(width, height, samples)
            }
            // float data is already normalised
            (3, RawloaderImageData::Float(values)) => {
                RgbImage::new(width, height, values.iter().map(|&v| v.max(0.0)).collect())
            }
            (1, data) => {
                let pattern = BayerPattern::from_cfa(&decoded.cfa)?;
                let mosaic = match data {
                    RawloaderImageData::Integer(counts) => normalise_mosaic(
                        &counts,
                        width,
                        &decoded.cfa,
                        decoded.blacklevels,
                        decoded.whitelevels,
                    ),
                    RawloaderImageData::Float(values) => values,
                };
                let samples = demosaic(width, height, &mosaic, pattern)?;
                RgbImage::new(width, height, samples)
            }
            (cpp, _) => Err(IdtError::UnsupportedFormat(format!(
                "{cpp} components per pixel"
            ))),
        }
    }
}

fn normalise(count: u16, black: u16, white: u16) -> f32 {
    let range = (white as f32 - black as f32).max(1.0);
    ((count as f32 - black as f32) / range).max(0.0)
}

/// Maps sensor counts to `[0, 1]` with the black and white level of each
/// pixel's filter colour.
pub(crate) fn normalise_mosaic(
    counts: &[u16],
    width: usize,
    cfa: &rawloader::CFA,
    black: [u16; 4],
    white: [u16; 4],
) -> Vec<f32> {
    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let colour = cfa.color_at(i / width, i % width);
            normalise(count, black[colour], white[colour])
        })
        .collect()
}

/// Same as [`normalise_mosaic`] for interleaved RGB counts.
pub(crate) fn normalise_rgb(counts: &[u16], black: [u16; 4], white: [u16; 4]) -> Vec<f32> {
    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| normalise(count, black[i % 3], white[i % 3]))
        .collect()
}

/// Demosaics a normalised mosaic through a 16-bit raster.
fn demosaic(
    width: usize,
    height: usize,
    mosaic: &[f32],
    pattern: BayerPattern,
) -> Result<Vec<f32>> {
    let quantised: Vec<u16> = mosaic
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * MOSAIC_SCALE).round() as u16)
        .collect();
    let rgb = CpuDebayer::with_pattern(pattern).process(width, height, &quantised, 16)?;
    Ok(rgb.iter().map(|&v| v as f32 / MOSAIC_SCALE).collect())
}
