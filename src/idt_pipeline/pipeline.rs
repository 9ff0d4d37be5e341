use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::idt_pipeline::colour::ReferenceColourChecker;
use crate::idt_pipeline::common::{IdtError, PipelineTimings, Result, Stage};
use crate::idt_pipeline::config::{CaptureSet, IdtConfig};
use crate::idt_pipeline::decoder::{DecodedSamples, Decoder, DecodingLut};
use crate::idt_pipeline::exposure::{ExposureSorter, MergeReport};
use crate::idt_pipeline::image::{FileImageSource, ImageSource};
use crate::idt_pipeline::lut::{LutBuilder, LutFilter};
use crate::idt_pipeline::optimiser::{OptimisationResult, Optimiser};
use crate::idt_pipeline::sampler::{ChartGeometry, Sampler, SamplerOutput};

/// Everything a characterisation run produces.
#[derive(Debug, Clone)]
pub struct IdtOutcome {
    pub decoding_lut: DecodingLut,
    pub optimisation: OptimisationResult,
    pub merge: MergeReport,
    pub decoded: DecodedSamples,
    pub timings: PipelineTimings,
}

/// Runs sampling, merging, LUT fitting, filtering, decoding and matrix
/// optimisation in sequence.
pub struct IdtPipeline<S: ImageSource> {
    source: S,
    config: IdtConfig,
    geometry: ChartGeometry,
    checker: ReferenceColourChecker,
}

impl IdtPipeline<FileImageSource> {
    /// Reads images from disk, with the classic checker filling the frame.
    pub fn new(config: IdtConfig) -> Result<Self> {
        Self::with_custom(FileImageSource::new(), config, ChartGeometry::default())
    }
}

impl<S: ImageSource> IdtPipeline<S> {
    /// Validates the configuration and geometry before any stage runs.
    pub fn with_custom(source: S, config: IdtConfig, geometry: ChartGeometry) -> Result<Self> {
        config.validate()?;
        let checker = ReferenceColourChecker::load(config.reference_colour_checker)
            .with_illuminant(config.illuminant);
        geometry.validate(checker.len())?;
        Ok(Self {
            source,
            config,
            geometry,
            checker,
        })
    }

    pub fn run(&self, captures: &CaptureSet) -> Result<IdtOutcome> {
        info!(
            camera = %self.config.camera_model,
            illuminant = %self.config.illuminant,
            exposures = captures.colour_checker.len(),
            grey_card_images = captures.grey_card.len(),
            "Starting IDT characterisation"
        );
        self.validate_inputs(captures)?;
        let mut timings = PipelineTimings::new();

        let sampler = Sampler::new(self.config.sampling.clone(), self.geometry.clone());
        let samples = timings.time(Stage::Sampler, || sampler.sample(&self.source, captures))?;

        self.characterise_timed(samples, timings)
    }

    /// Runs every stage after sampling on already extracted samples.
    pub fn characterise(&self, samples: SamplerOutput) -> Result<IdtOutcome> {
        self.characterise_timed(samples, PipelineTimings::new())
    }

    fn characterise_timed(
        &self,
        samples: SamplerOutput,
        mut timings: PipelineTimings,
    ) -> Result<IdtOutcome> {
        let config = &self.config;

        let (series, merge) = timings.time(Stage::Sorter, || ExposureSorter::merge(samples))?;

        let curves = timings.time(Stage::LutBuilder, || {
            let reference = self.checker.to_aces_rgb(config.cat)?;
            LutBuilder::new(config.lut.clone(), &self.checker, reference).build(&series)
        })?;

        let lut = timings.time(Stage::LutFilter, || {
            LutFilter::new(config.lut.clone()).filter(curves)
        })?;

        let decoder = Decoder::new(config.decoding.clone(), self.checker.mid_grey);
        let (decoding_lut, decoded) = timings.time(Stage::Decoder, || {
            let decoding_lut = decoder.decoding_lut(&config.camera_model, &lut)?;
            let decoded = decoder.decode(&decoding_lut, &series)?;
            Ok::<_, IdtError>((decoding_lut, decoded))
        })?;

        let optimisation = timings.time(Stage::Optimiser, || {
            Optimiser::new(config.optimiser.clone(), self.checker.to_aces_xyz(config.cat)?)
                .with_mid_grey(self.checker.mid_grey)
                .optimise(&decoded)
        })?;

        info!(
            converged = optimisation.converged,
            delta_e = optimisation.delta_e,
            rgb_w = ?optimisation.rgb_w,
            k = optimisation.k,
            "Characterisation complete in {:.3}ms",
            timings.total_duration().as_secs_f64() * 1000.0
        );
        timings.log_summary();

        Ok(IdtOutcome {
            decoding_lut,
            optimisation,
            merge,
            decoded,
            timings,
        })
    }

    /// Every image must be readable and all of them must share one file type.
    fn validate_inputs(&self, captures: &CaptureSet) -> Result<()> {
        let paths = captures
            .colour_checker
            .iter()
            .flat_map(|(_, images)| images)
            .chain(&captures.grey_card);

        let mut file_types = BTreeSet::new();
        for path in paths {
            if !self.source.exists(path) {
                return Err(IdtError::InputReadError(format!(
                    "{}: File does not exist",
                    path.display()
                )));
            }
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .unwrap_or_default();
            file_types.insert(if extension == "tif" { String::from("tiff") } else { extension });
        }

        if file_types.len() > 1 {
            return Err(IdtError::InvalidConfig(format!(
                "Multiple file types found in the project settings: {file_types:?}"
            )));
        }
        debug!(?file_types, "Input images validated");
        Ok(())
    }

    pub fn config(&self) -> &IdtConfig {
        &self.config
    }

    pub fn geometry(&self) -> &ChartGeometry {
        &self.geometry
    }

    pub fn reference_colour_checker(&self) -> &ReferenceColourChecker {
        &self.checker
    }
}
