use std::io::Cursor;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use tracing::debug;

use crate::idt_pipeline::common::error::{IdtError, Result};

/// 2x2 Bayer layout, named by the top-left, top-right, bottom-left and
/// bottom-right filter colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BayerPattern {
    #[default]
    Rggb,
    Bggr,
    Grbg,
    Gbrg,
}

impl BayerPattern {
    /// Pattern of a rawloader CFA description. Only 2x2 RGB layouts qualify,
    /// X-Trans and four-colour sensors are rejected.
    pub fn from_cfa(cfa: &rawloader::CFA) -> Result<Self> {
        let block = [
            cfa.color_at(0, 0),
            cfa.color_at(0, 1),
            cfa.color_at(1, 0),
            cfa.color_at(1, 1),
        ];
        match (cfa.width, cfa.height, block) {
            (2, 2, [0, 1, 1, 2]) => Ok(BayerPattern::Rggb),
            (2, 2, [2, 1, 1, 0]) => Ok(BayerPattern::Bggr),
            (2, 2, [1, 0, 2, 1]) => Ok(BayerPattern::Grbg),
            (2, 2, [1, 2, 0, 1]) => Ok(BayerPattern::Gbrg),
            _ => Err(IdtError::UnsupportedFormat(format!(
                "colour filter array {:?}",
                cfa.name
            ))),
        }
    }

    fn to_bayer(self) -> CFA {
        match self {
            BayerPattern::Rggb => CFA::RGGB,
            BayerPattern::Bggr => CFA::BGGR,
            BayerPattern::Grbg => CFA::GRBG,
            BayerPattern::Gbrg => CFA::GBRG,
        }
    }
}

/// Bilinear demosaicing of single-channel Bayer data on the CPU.
///
/// No white balance or colour matrix is applied: the characterisation needs
/// the camera's native RGB.
pub struct CpuDebayer {
    pattern: BayerPattern,
}

impl CpuDebayer {
    pub fn new() -> Self {
        Self::with_pattern(BayerPattern::default())
    }

    pub fn with_pattern(pattern: BayerPattern) -> Self {
        Self { pattern }
    }

    /// Returns interleaved RGB at the input bit depth.
    pub fn process(
        &self,
        width: usize,
        height: usize,
        mosaic: &[u16],
        bits_per_sample: u32,
    ) -> Result<Vec<u16>> {
        if width == 0 || height == 0 || mosaic.len() != width * height {
            return Err(IdtError::InvalidDimensions(width, height));
        }
        debug!(
            "Starting CPU debayering for image {}x{}, {:?}",
            width, height, self.pattern
        );

        // bayer only supports 8 and 16 bit
        let (bayer_depth, raster_depth, bytes_per_pixel) = if bits_per_sample <= 8 {
            (BayerDepth::Depth8, RasterDepth::Depth8, 1)
        } else {
            (BayerDepth::Depth16LE, RasterDepth::Depth16, 2)
        };

        let bayer_bytes: Vec<u8> = if bytes_per_pixel == 1 {
            mosaic.iter().map(|&v| v as u8).collect()
        } else {
            mosaic.iter().flat_map(|&v| v.to_le_bytes()).collect()
        };

        let mut output_buf = vec![0u8; width * height * 3 * bytes_per_pixel];
        let mut output_raster = RasterMut::new(width, height, raster_depth, &mut output_buf);

        bayer::run_demosaic(
            &mut Cursor::new(&bayer_bytes[..]),
            bayer_depth,
            self.pattern.to_bayer(),
            Demosaic::Linear,
            &mut output_raster,
        )
        .map_err(|e| IdtError::DecodeError(format!("Demosaic failed: {:?}", e)))?;

        let rgb = if bytes_per_pixel == 1 {
            output_buf.iter().map(|&v| v as u16).collect()
        } else {
            // RasterMut writes 16-bit samples in native byte order
            output_buf
                .chunks_exact(2)
                .map(|b| u16::from_ne_bytes([b[0], b[1]]))
                .collect()
        };

        Ok(rgb)
    }
}

impl Default for CpuDebayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_mosaic_stays_flat() {
        let mosaic = vec![1000u16; 8 * 8];
        let rgb = CpuDebayer::new().process(8, 8, &mosaic, 14).unwrap();

        assert_eq!(rgb.len(), 8 * 8 * 3);
        // interior pixels interpolate from identical neighbours
        let i = (4 * 8 + 4) * 3;
        assert_eq!(&rgb[i..i + 3], &[1000, 1000, 1000]);
    }

    #[test]
    fn test_pattern_places_colours() {
        let (a, b, c) = (100u16, 2000u16, 30000u16);
        let cfa = rawloader::CFA::new("BGGR");
        let (width, height) = (8, 8);
        let mosaic: Vec<u16> = (0..width * height)
            .map(|i| [a, b, c][cfa.color_at(i / width, i % width)])
            .collect();

        let pattern = BayerPattern::from_cfa(&cfa).unwrap();
        assert_eq!(pattern, BayerPattern::Bggr);
        let rgb = CpuDebayer::with_pattern(pattern)
            .process(width, height, &mosaic, 16)
            .unwrap();

        for (y, x) in [(3, 3), (3, 4), (4, 3), (4, 4)] {
            let i = (y * width + x) * 3;
            assert_eq!(&rgb[i..i + 3], &[a, b, c], "pixel {x},{y}");
        }
    }

    #[test]
    fn test_every_bayer_layout_is_recognised() {
        for (name, pattern) in [
            ("RGGB", BayerPattern::Rggb),
            ("BGGR", BayerPattern::Bggr),
            ("GRBG", BayerPattern::Grbg),
            ("GBRG", BayerPattern::Gbrg),
        ] {
            let cfa = rawloader::CFA::new(name);
            assert_eq!(BayerPattern::from_cfa(&cfa).unwrap(), pattern);
        }
    }

    #[test]
    fn test_x_trans_is_unsupported() {
        let x_trans = rawloader::CFA::new("GGRGGBGGBGGRBRGRBGGGBGGRGGRGGBRBGBRG");
        assert!(matches!(
            BayerPattern::from_cfa(&x_trans),
            Err(IdtError::UnsupportedFormat(_))
        ));
        let cmyg = rawloader::CFA::new("RGEB");
        assert!(BayerPattern::from_cfa(&cmyg).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = CpuDebayer::new().process(4, 4, &[0u16; 3], 16);
        assert!(matches!(result, Err(IdtError::InvalidDimensions(4, 4))));
    }
}
