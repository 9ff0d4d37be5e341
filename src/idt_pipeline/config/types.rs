//! IDT pipeline configuration types

use crate::idt_pipeline::colour::{
    ChromaticAdaptation, Illuminant, OptimisationSpace, ReferenceColourCheckerId,
};
use crate::idt_pipeline::common::error::{IdtError, Result};
use crate::idt_pipeline::config::enums::{
    BoundaryPolicy, DecodingMethod, Interpolator, LutPatchSelection, WhiteBalanceRefinement,
};

/// Patch sampling and outlier rejection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Pixels whose per-channel z-score exceeds this are masked out
    pub z_score_threshold: f64,
    /// Minimum share of a patch's pixels that must survive masking
    pub min_valid_fraction: f64,
    /// Minimum absolute number of surviving pixels
    pub min_valid_pixels: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            z_score_threshold: 3.0,
            min_valid_fraction: 0.5,
            min_valid_pixels: 16,
        }
    }
}

/// Decoding curve fit and filtering settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LutConfig {
    /// Number of entries of the final LUT
    pub size: usize,
    /// Density of the fitted curve relative to `size`
    pub oversampling: usize,
    /// Gaussian smoothing sigma in final-LUT samples, 0 disables
    pub smoothing: f64,
    pub interpolator: Interpolator,
    /// Extrapolation of the fit outside the observed encoded range
    pub fit_extrapolation: BoundaryPolicy,
    /// Tail treatment of the final LUT and of out-of-domain lookups
    pub boundary: BoundaryPolicy,
    pub patches: LutPatchSelection,
    /// Largest tolerated decrease, relative to the output range
    pub monotonic_tolerance: f64,
}

impl Default for LutConfig {
    fn default() -> Self {
        Self {
            size: 1024,
            oversampling: 4,
            smoothing: 0.0,
            interpolator: Interpolator::Linear,
            fit_extrapolation: BoundaryPolicy::Linear,
            boundary: BoundaryPolicy::Linear,
            patches: LutPatchSelection::Neutrals,
            monotonic_tolerance: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodingConfig {
    pub method: DecodingMethod,
    /// Exposures averaged (after EV normalisation) into the optimiser input
    pub ev_range: Vec<f64>,
    /// Optional weights matching `ev_range`, plain mean when absent
    pub ev_weights: Option<Vec<f64>>,
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            method: DecodingMethod::Median,
            ev_range: vec![-1.0, 0.0, 1.0],
            ev_weights: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimiserConfig {
    pub space: OptimisationSpace,
    /// ACES2065-1 value of the grey card
    pub grey_card_reference: [f64; 3],
    pub max_iterations: usize,
    /// Convergence threshold on the spread of mean delta E over the simplex
    pub epsilon: f64,
    /// Size of the initial simplex around each starting point
    pub initial_step: f64,
    /// Number of independent solves, the first always starts at identity
    pub initial_guesses: usize,
    pub white_balance: WhiteBalanceRefinement,
    /// Weight of the grey sample error when white balance is refined jointly
    pub white_point_weight: f64,
}

impl Default for OptimiserConfig {
    fn default() -> Self {
        Self {
            space: OptimisationSpace::Oklab,
            grey_card_reference: [0.18, 0.18, 0.18],
            max_iterations: 2000,
            epsilon: 1e-10,
            initial_step: 0.1,
            initial_guesses: 1,
            white_balance: WhiteBalanceRefinement::Fixed,
            white_point_weight: 10.0,
        }
    }
}

/// Complete configuration of one characterisation run.
#[derive(Debug, Clone, PartialEq)]
pub struct IdtConfig {
    /// Camera identity, used to name the produced LUT
    pub camera_model: String,
    pub cat: ChromaticAdaptation,
    /// Light the colour checker was shot under
    pub illuminant: Illuminant,
    pub reference_colour_checker: ReferenceColourCheckerId,
    pub sampling: SamplingConfig,
    pub lut: LutConfig,
    pub decoding: DecodingConfig,
    pub optimiser: OptimiserConfig,
}

impl Default for IdtConfig {
    fn default() -> Self {
        Self {
            camera_model: String::from("Unknown Camera"),
            cat: ChromaticAdaptation::Cat02,
            illuminant: Illuminant::D50,
            reference_colour_checker: ReferenceColourCheckerId::ColorChecker24,
            sampling: SamplingConfig::default(),
            lut: LutConfig::default(),
            decoding: DecodingConfig::default(),
            optimiser: OptimiserConfig::default(),
        }
    }
}

fn invalid(message: impl Into<String>) -> IdtError {
    IdtError::InvalidConfig(message.into())
}

fn positive_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive and finite, got {value}")))
    }
}

impl IdtConfig {
    pub fn builder() -> IdtConfigBuilder {
        IdtConfigBuilder::default()
    }

    /// Checks every value a stage relies on, before any stage runs.
    pub fn validate(&self) -> Result<()> {
        let sampling = &self.sampling;
        positive_finite("z_score_threshold", sampling.z_score_threshold)?;
        if !(sampling.min_valid_fraction > 0.0 && sampling.min_valid_fraction <= 1.0) {
            return Err(invalid(format!(
                "min_valid_fraction must be in (0, 1], got {}",
                sampling.min_valid_fraction
            )));
        }
        if sampling.min_valid_pixels == 0 {
            return Err(invalid("min_valid_pixels must be at least 1"));
        }

        let lut = &self.lut;
        if lut.size < 2 {
            return Err(invalid(format!("lut_size must be at least 2, got {}", lut.size)));
        }
        if lut.oversampling == 0 {
            return Err(invalid("lut oversampling must be at least 1"));
        }
        if !(lut.smoothing.is_finite() && lut.smoothing >= 0.0) {
            return Err(invalid(format!("lut_smoothing must be >= 0, got {}", lut.smoothing)));
        }
        if !(lut.monotonic_tolerance.is_finite() && lut.monotonic_tolerance >= 0.0) {
            return Err(invalid(format!(
                "monotonic_tolerance must be >= 0, got {}",
                lut.monotonic_tolerance
            )));
        }

        let decoding = &self.decoding;
        if decoding.ev_range.is_empty() {
            return Err(invalid("ev_range must not be empty"));
        }
        if decoding.ev_range.iter().any(|ev| !ev.is_finite()) {
            return Err(invalid("ev_range must only contain finite values"));
        }
        if let Some(weights) = &decoding.ev_weights {
            if weights.len() != decoding.ev_range.len() {
                return Err(invalid(format!(
                    "ev_weights has {} entries for {} exposures",
                    weights.len(),
                    decoding.ev_range.len()
                )));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(invalid("ev_weights must be finite and non-negative"));
            }
            positive_finite("sum of ev_weights", weights.iter().sum())?;
        }

        let optimiser = &self.optimiser;
        for value in optimiser.grey_card_reference {
            positive_finite("grey_card_reference", value)?;
        }
        if optimiser.max_iterations == 0 {
            return Err(invalid("max_iterations must be at least 1"));
        }
        positive_finite("epsilon", optimiser.epsilon)?;
        positive_finite("initial_step", optimiser.initial_step)?;
        if optimiser.initial_guesses == 0 {
            return Err(invalid("initial_guesses must be at least 1"));
        }
        positive_finite("white_point_weight", optimiser.white_point_weight)?;

        Ok(())
    }
}

/// Builder for IdtConfig
#[derive(Default)]
pub struct IdtConfigBuilder {
    camera_model: Option<String>,
    cat: Option<ChromaticAdaptation>,
    illuminant: Option<Illuminant>,
    reference_colour_checker: Option<ReferenceColourCheckerId>,
    sampling: Option<SamplingConfig>,
    lut: Option<LutConfig>,
    decoding: Option<DecodingConfig>,
    optimiser: Option<OptimiserConfig>,
    lut_size: Option<usize>,
    interpolator: Option<Interpolator>,
    decoding_method: Option<DecodingMethod>,
    optimisation_space: Option<OptimisationSpace>,
}

impl IdtConfigBuilder {
    pub fn camera_model(mut self, camera_model: impl Into<String>) -> Self {
        self.camera_model = Some(camera_model.into());
        self
    }

    pub fn cat(mut self, cat: ChromaticAdaptation) -> Self {
        self.cat = Some(cat);
        self
    }

    pub fn illuminant(mut self, illuminant: Illuminant) -> Self {
        self.illuminant = Some(illuminant);
        self
    }

    pub fn reference_colour_checker(mut self, id: ReferenceColourCheckerId) -> Self {
        self.reference_colour_checker = Some(id);
        self
    }

    pub fn sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = Some(sampling);
        self
    }

    pub fn lut(mut self, lut: LutConfig) -> Self {
        self.lut = Some(lut);
        self
    }

    pub fn decoding(mut self, decoding: DecodingConfig) -> Self {
        self.decoding = Some(decoding);
        self
    }

    pub fn optimiser(mut self, optimiser: OptimiserConfig) -> Self {
        self.optimiser = Some(optimiser);
        self
    }

    /// Overrides the size of whichever LUT config is in effect.
    pub fn lut_size(mut self, size: usize) -> Self {
        self.lut_size = Some(size);
        self
    }

    pub fn interpolator(mut self, interpolator: Interpolator) -> Self {
        self.interpolator = Some(interpolator);
        self
    }

    pub fn decoding_method(mut self, method: DecodingMethod) -> Self {
        self.decoding_method = Some(method);
        self
    }

    pub fn optimisation_space(mut self, space: OptimisationSpace) -> Self {
        self.optimisation_space = Some(space);
        self
    }

    pub fn build(self) -> Result<IdtConfig> {
        let default = IdtConfig::default();

        let mut lut = self.lut.unwrap_or(default.lut);
        if let Some(size) = self.lut_size {
            lut.size = size;
        }
        if let Some(interpolator) = self.interpolator {
            lut.interpolator = interpolator;
        }

        let mut decoding = self.decoding.unwrap_or(default.decoding);
        if let Some(method) = self.decoding_method {
            decoding.method = method;
        }

        let mut optimiser = self.optimiser.unwrap_or(default.optimiser);
        if let Some(space) = self.optimisation_space {
            optimiser.space = space;
        }

        let config = IdtConfig {
            camera_model: self.camera_model.unwrap_or(default.camera_model),
            cat: self.cat.unwrap_or(default.cat),
            illuminant: self.illuminant.unwrap_or(default.illuminant),
            reference_colour_checker: self
                .reference_colour_checker
                .unwrap_or(default.reference_colour_checker),
            sampling: self.sampling.unwrap_or(default.sampling),
            lut,
            decoding,
            optimiser,
        };
        config.validate()?;
        Ok(config)
    }
}
