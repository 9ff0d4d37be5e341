use crate::idt_pipeline::common::error::Result;
use crate::idt_pipeline::image::types::RgbImage;

pub trait ImageReader {
    fn read_image(&self, data: &[u8]) -> Result<RgbImage>;
}
