//! Test doubles shared by the stage tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::idt_pipeline::colour::{
    ChromaticAdaptation, ReferenceColourChecker, ReferenceColourCheckerId,
};
use crate::idt_pipeline::common::error::{IdtError, Result};
use crate::idt_pipeline::exposure::{ExposureSeries, ExposureSorter, format_exposure_key};
use crate::idt_pipeline::image::{ImageSource, RgbImage};
use crate::idt_pipeline::sampler::{CaptureSamples, ChartGeometry, RawSample, SamplerOutput};

/// In-memory image source keyed by path.
#[derive(Default)]
pub struct MockImageSource {
    images: HashMap<PathBuf, RgbImage>,
}

impl MockImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>, image: RgbImage) -> Self {
        self.images.insert(path.into(), image);
        self
    }
}

impl ImageSource for MockImageSource {
    fn load(&self, path: &Path) -> Result<RgbImage> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| IdtError::InputReadError(format!("{}: not found", path.display())))
    }

    fn exists(&self, path: &Path) -> bool {
        self.images.contains_key(path)
    }
}

/// Draws `colours` into the patch regions of `geometry` over `background`.
pub fn render_chart(
    geometry: &ChartGeometry,
    width: usize,
    height: usize,
    colours: &[[f32; 3]],
    background: [f32; 3],
) -> RgbImage {
    let mut image = RgbImage::filled(width, height, background);
    for (region, colour) in geometry.patches.iter().zip(colours) {
        let (x0, y0, x1, y1) = region.pixel_bounds(width, height);
        for y in y0..y1 {
            for x in x0..x1 {
                image.set_pixel(x, y, *colour);
            }
        }
    }
    image
}

/// ColorChecker24 in ACES2065-1 under the default adaptation.
pub fn reference_aces_rgb() -> Vec<[f64; 3]> {
    ReferenceColourChecker::load(ReferenceColourCheckerId::ColorChecker24)
        .to_aces_rgb(ChromaticAdaptation::Cat02)
        .unwrap()
        .iter()
        .map(|v| [v[0], v[1], v[2]])
        .collect()
}

/// Sampler output of a camera shooting the reference checker at `evs`,
/// `camera` mapping scene-linear ACES values to encoded RGB.
pub fn synthetic_capture(evs: &[f64], camera: impl Fn([f64; 3]) -> [f64; 3]) -> SamplerOutput {
    let reference = reference_aces_rgb();
    let captures = evs
        .iter()
        .map(|&ev| CaptureSamples {
            key: format_exposure_key(ev),
            patches: reference
                .iter()
                .map(|rgb| RawSample::uniform(camera(rgb.map(|v| v * ev.exp2())), 100))
                .collect(),
        })
        .collect();
    SamplerOutput {
        captures,
        grey_card: None,
    }
}

pub fn synthetic_series(evs: &[f64], camera: impl Fn([f64; 3]) -> [f64; 3]) -> ExposureSeries {
    match ExposureSorter::merge(synthetic_capture(evs, camera)) {
        Ok((series, _)) => series,
        Err(e) => panic!("synthetic capture failed to merge: {e}"),
    }
}
