use std::fmt;

use thiserror::Error;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    Sampler,
    Sorter,
    LutBuilder,
    LutFilter,
    Decoder,
    Optimiser,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::Sampler => "sampler",
            Stage::Sorter => "sorter",
            Stage::LutBuilder => "lut builder",
            Stage::LutFilter => "lut filter",
            Stage::Decoder => "decoder",
            Stage::Optimiser => "optimiser",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum IdtError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid exposure key: {0:?}")]
    InvalidExposureKey(String),

    #[error("Insufficient samples in {stage} for {context}: {valid} valid, {required} required")]
    InsufficientSamples {
        stage: Stage,
        context: String,
        valid: usize,
        required: usize,
    },

    #[error("Non-monotonic LUT on channel {channel}: drop of {drop:.6} exceeds tolerance {tolerance:.6}")]
    NonMonotonicLut {
        channel: usize,
        drop: f64,
        tolerance: f64,
    },

    #[error("Non-finite value in {stage} for {context}")]
    NonFiniteValue { stage: Stage, context: String },

    #[error("No captured exposure matches the reference EV range {0:?}")]
    MissingReferenceExposure(Vec<f64>),

    #[error("Optimisation did not converge after {iterations} iterations (mean delta E {delta_e:.6})")]
    OptimisationNonConverged { iterations: usize, delta_e: f64 },

    #[error("Invalid project settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IdtError {
    pub fn non_finite(stage: Stage, context: impl Into<String>) -> Self {
        IdtError::NonFiniteValue {
            stage,
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IdtError>;
