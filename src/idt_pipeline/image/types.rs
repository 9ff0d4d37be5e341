//! Decoded image types

use crate::idt_pipeline::common::error::{IdtError, Result};

/// RGB image with samples normalised so that sensor white is 1.0
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<f32>,
}

impl RgbImage {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height * 3 {
            return Err(IdtError::InvalidDimensions(width, height));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Image filled with a single colour.
    pub fn filled(width: usize, height: usize, rgb: [f32; 3]) -> Self {
        Self {
            width,
            height,
            data: rgb.repeat(width * height),
        }
    }

    /// Expands `channels`-interleaved samples to RGB: grey is replicated,
    /// anything past the third channel (alpha) is dropped.
    pub fn from_channels(
        width: usize,
        height: usize,
        channels: usize,
        samples: &[f32],
    ) -> Result<Self> {
        if channels == 0 || samples.len() != width * height * channels {
            return Err(IdtError::InvalidDimensions(width, height));
        }
        let data = match channels {
            1 => samples.iter().flat_map(|&v| [v, v, v]).collect(),
            2 => samples.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0]]).collect(),
            _ => samples
                .chunks_exact(channels)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect(),
        };
        Self::new(width, height, data)
    }

    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [f32; 3]) {
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grey_samples_replicate() {
        let image = RgbImage::from_channels(2, 1, 1, &[0.25, 0.75]).unwrap();
        assert_eq!(image.pixel(1, 0), [0.75, 0.75, 0.75]);
    }

    #[test]
    fn test_alpha_is_dropped() {
        let image = RgbImage::from_channels(1, 1, 4, &[0.1, 0.2, 0.3, 1.0]).unwrap();
        assert_eq!(image.data, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_mismatched_length_is_rejected() {
        assert!(matches!(
            RgbImage::new(4, 4, vec![0.0; 10]),
            Err(IdtError::InvalidDimensions(4, 4))
        ));
    }

    #[test]
    fn test_set_pixel() {
        let mut image = RgbImage::filled(3, 2, [0.5; 3]);
        image.set_pixel(2, 1, [1.0, 0.0, 0.0]);
        assert_eq!(image.pixel(2, 1), [1.0, 0.0, 0.0]);
        assert_eq!(image.pixel(0, 0), [0.5; 3]);
    }
}
