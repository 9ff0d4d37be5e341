use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::idt_pipeline::common::error::{IdtError, Result, Stage};
use crate::idt_pipeline::config::{CaptureSet, SamplingConfig};
use crate::idt_pipeline::exposure::parse_exposure_key;
use crate::idt_pipeline::image::{ImageSource, RgbImage};
use crate::idt_pipeline::sampler::geometry::{ChartGeometry, PatchRegion};
use crate::idt_pipeline::sampler::outliers::robust_mean;
use crate::idt_pipeline::sampler::types::{CaptureSamples, RawSample, SamplerOutput};

/// Extracts per-patch robust means from checker and grey-card photographs.
pub struct Sampler {
    config: SamplingConfig,
    geometry: ChartGeometry,
}

impl Sampler {
    pub fn new(config: SamplingConfig, geometry: ChartGeometry) -> Self {
        Self { config, geometry }
    }

    pub fn geometry(&self) -> &ChartGeometry {
        &self.geometry
    }

    /// Samples every exposure in parallel, results in capture order.
    ///
    /// Exposure keys are checked before any image is read.
    #[instrument(skip_all, fields(exposures = captures.colour_checker.len()))]
    pub fn sample<S: ImageSource>(&self, source: &S, captures: &CaptureSet) -> Result<SamplerOutput> {
        for (key, _) in &captures.colour_checker {
            parse_exposure_key(key)?;
        }

        let samples = captures
            .colour_checker
            .par_iter()
            .map(|(key, paths)| self.sample_exposure(source, key, paths))
            .collect::<Result<Vec<_>>>()?;

        let grey_card = if captures.grey_card.is_empty() {
            debug!("No grey-card images supplied");
            None
        } else {
            Some(self.sample_grey_card(source, &captures.grey_card)?)
        };

        Ok(SamplerOutput {
            captures: samples,
            grey_card,
        })
    }

    /// Pools the pixels of every image of one exposure per patch region.
    pub fn sample_exposure<S: ImageSource>(
        &self,
        source: &S,
        key: &str,
        paths: &[PathBuf],
    ) -> Result<CaptureSamples> {
        let images = load_all(source, paths, || format!("exposure {key}"))?;

        let patches = self
            .geometry
            .patches
            .iter()
            .enumerate()
            .map(|(index, region)| {
                let pixels = pooled_pixels(&images, region);
                robust_mean(&pixels, &self.config, &format!("exposure {key}, patch {index}"))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(exposure = key, images = images.len(), "Sampled {} patches", patches.len());

        Ok(CaptureSamples {
            key: key.to_string(),
            patches,
        })
    }

    pub fn sample_grey_card<S: ImageSource>(&self, source: &S, paths: &[PathBuf]) -> Result<RawSample> {
        let images = load_all(source, paths, || String::from("grey card"))?;
        let pixels = pooled_pixels(&images, &self.geometry.grey_card);
        let sample = robust_mean(&pixels, &self.config, "grey card")?;
        debug!(
            valid = sample.valid_count(),
            total = sample.total(),
            "Grey card mean {:?}",
            sample.mean
        );
        Ok(sample)
    }
}

fn load_all<S: ImageSource>(
    source: &S,
    paths: &[PathBuf],
    context: impl Fn() -> String,
) -> Result<Vec<RgbImage>> {
    if paths.is_empty() {
        return Err(IdtError::InsufficientSamples {
            stage: Stage::Sampler,
            context: format!("{}: no images", context()),
            valid: 0,
            required: 1,
        });
    }
    paths.iter().map(|path| source.load(path)).collect()
}

fn pooled_pixels(images: &[RgbImage], region: &PatchRegion) -> Vec<[f32; 3]> {
    let mut pixels = Vec::new();
    for image in images {
        let (x0, y0, x1, y1) = region.pixel_bounds(image.width, image.height);
        for y in y0..y1 {
            for x in x0..x1 {
                pixels.push(image.pixel(x, y));
            }
        }
    }
    pixels
}
