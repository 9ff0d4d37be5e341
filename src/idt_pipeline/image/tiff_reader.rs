use std::io::Cursor;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::idt_pipeline::common::error::{IdtError, Result};
use crate::idt_pipeline::image::reader::ImageReader;
use crate::idt_pipeline::image::types::RgbImage;

/// Reader for debayered TIFF exports, integer samples are scaled by their
/// type's maximum and float samples are taken as is.
pub struct TiffReader;

fn decode_error(e: tiff::TiffError) -> IdtError {
    IdtError::DecodeError(e.to_string())
}

impl ImageReader for TiffReader {
    fn read_image(&self, data: &[u8]) -> Result<RgbImage> {
        debug!("Decoding TIFF image, {} bytes", data.len());

        let mut decoder = Decoder::new(Cursor::new(data)).map_err(decode_error)?;
        let (width, height) = decoder.dimensions().map_err(decode_error)?;
        let channels = match decoder.colortype().map_err(decode_error)? {
            ColorType::Gray(_) => 1,
            ColorType::GrayA(_) => 2,
            ColorType::RGB(_) => 3,
            ColorType::RGBA(_) => 4,
            other => return Err(IdtError::UnsupportedFormat(format!("TIFF {other:?}"))),
        };

        let samples: Vec<f32> = match decoder.read_image().map_err(decode_error)? {
            DecodingResult::U8(v) => v.iter().map(|&s| s as f32 / u8::MAX as f32).collect(),
            DecodingResult::U16(v) => v.iter().map(|&s| s as f32 / u16::MAX as f32).collect(),
            DecodingResult::U32(v) => v
                .iter()
                .map(|&s| (s as f64 / u32::MAX as f64) as f32)
                .collect(),
            DecodingResult::F32(v) => v,
            DecodingResult::F64(v) => v.iter().map(|&s| s as f32).collect(),
            _ => {
                return Err(IdtError::UnsupportedFormat(String::from(
                    "TIFF sample format",
                )));
            }
        };

        debug!("Decoded TIFF: {}x{}, {} channels", width, height, channels);

        RgbImage::from_channels(width as usize, height as usize, channels, &samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tiff::encoder::{TiffEncoder, colortype};

    fn encode_rgb16(width: u32, height: u32, data: &[u16]) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer)).unwrap();
        encoder
            .write_image::<colortype::RGB16>(width, height, data)
            .unwrap();
        buffer
    }

    #[test]
    fn test_reads_rgb16_normalised() {
        let bytes = encode_rgb16(2, 1, &[0, 32768, 65535, 65535, 0, 0]);
        let image = TiffReader.read_image(&bytes).unwrap();

        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.pixel(0, 0)[0], 0.0);
        assert!((image.pixel(0, 0)[1] - 0.5).abs() < 1e-4);
        assert_eq!(image.pixel(0, 0)[2], 1.0);
        assert_eq!(image.pixel(1, 0), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_reads_gray8_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grey.tiff");
        {
            let mut buffer = Vec::new();
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer)).unwrap();
            encoder
                .write_image::<colortype::Gray8>(2, 2, &[0, 51, 102, 255])
                .unwrap();
            std::fs::File::create(&path).unwrap().write_all(&buffer).unwrap();
        }

        let bytes = std::fs::read(&path).unwrap();
        let image = TiffReader.read_image(&bytes).unwrap();
        assert!((image.pixel(1, 0)[2] - 0.2).abs() < 1e-6);
        assert_eq!(image.pixel(1, 1), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let result = TiffReader.read_image(b"definitely not a tiff");
        assert!(matches!(result, Err(IdtError::DecodeError(_))));
    }
}
