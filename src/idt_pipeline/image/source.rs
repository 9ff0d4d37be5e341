use std::path::Path;

use tracing::debug;

use crate::idt_pipeline::common::error::{IdtError, Result};
use crate::idt_pipeline::image::rawloader_reader::RawLoaderReader;
use crate::idt_pipeline::image::reader::ImageReader;
use crate::idt_pipeline::image::tiff_reader::TiffReader;
use crate::idt_pipeline::image::types::RgbImage;

/// Resolves image paths into decoded images.
///
/// Implementations must be shareable across the sampler's worker threads.
pub trait ImageSource: Sync {
    fn load(&self, path: &Path) -> Result<RgbImage>;

    /// Whether `path` can be handed to [`ImageSource::load`].
    fn exists(&self, path: &Path) -> bool;
}

/// Reads images from disk, choosing the decoder from the file extension:
/// `.tif`/`.tiff` go through [`TiffReader`], everything else is treated as
/// camera RAW.
pub struct FileImageSource<T: ImageReader = TiffReader, R: ImageReader = RawLoaderReader> {
    tiff: T,
    raw: R,
}

impl FileImageSource<TiffReader, RawLoaderReader> {
    pub fn new() -> Self {
        Self {
            tiff: TiffReader,
            raw: RawLoaderReader,
        }
    }
}

impl Default for FileImageSource<TiffReader, RawLoaderReader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ImageReader, R: ImageReader> FileImageSource<T, R> {
    pub fn with_custom(tiff: T, raw: R) -> Self {
        Self { tiff, raw }
    }
}

impl<T: ImageReader + Sync, R: ImageReader + Sync> ImageSource for FileImageSource<T, R> {
    fn load(&self, path: &Path) -> Result<RgbImage> {
        let data = std::fs::read(path)
            .map_err(|e| IdtError::InputReadError(format!("{}: {}", path.display(), e)))?;

        let is_tiff = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"));

        debug!(path = %path.display(), is_tiff, "Loading image");

        if is_tiff {
            self.tiff.read_image(&data)
        } else {
            self.raw.read_image(&data)
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
