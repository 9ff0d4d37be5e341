//! Project settings as supplied by the ingestion layer.
//!
//! The settings file is string-typed; [`IdtConfig::try_from`] resolves every
//! name into its closed variant so that malformed settings are rejected
//! before the first stage runs.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::idt_pipeline::common::error::{IdtError, Result};
use crate::idt_pipeline::config::types::{
    DecodingConfig, IdtConfig, LutConfig, OptimiserConfig, SamplingConfig,
};

/// Image paths of one characterisation session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureSet {
    /// Exposure key to image paths, in provided order; keys are not yet normalised
    pub colour_checker: Vec<(String, Vec<PathBuf>)>,
    pub grey_card: Vec<PathBuf>,
}

impl CaptureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exposure(mut self, key: impl Into<String>, images: Vec<PathBuf>) -> Self {
        self.colour_checker.push((key.into(), images));
        self
    }

    pub fn with_grey_card(mut self, images: Vec<PathBuf>) -> Self {
        self.grey_card = images;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectData {
    /// Kept as a raw map so the provided key order survives deserialisation
    pub colour_checker: serde_json::Map<String, serde_json::Value>,
    pub grey_card: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub camera_model: String,
    pub optimisation_space: String,
    pub decoding_method: String,
    pub lut_size: i64,
    pub lut_smoothing: f64,
    pub interpolator: String,
    pub lut_boundary: String,
    pub cat: String,
    pub illuminant: String,
    pub reference_colour_checker: String,
    pub ev_range: Vec<f64>,
    pub ev_weights: Vec<f64>,
    pub grey_card_reference: Vec<f64>,
    pub working_directory: Option<PathBuf>,
    pub data: ProjectData,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        let config = IdtConfig::default();
        Self {
            camera_model: config.camera_model,
            optimisation_space: config.optimiser.space.to_string(),
            decoding_method: config.decoding.method.to_string(),
            lut_size: config.lut.size as i64,
            lut_smoothing: config.lut.smoothing,
            interpolator: config.lut.interpolator.to_string(),
            lut_boundary: config.lut.boundary.to_string(),
            cat: config.cat.to_string(),
            illuminant: config.illuminant.to_string(),
            reference_colour_checker: config.reference_colour_checker.to_string(),
            ev_range: config.decoding.ev_range,
            ev_weights: Vec::new(),
            grey_card_reference: config.optimiser.grey_card_reference.to_vec(),
            working_directory: None,
            data: ProjectData::default(),
        }
    }
}

impl ProjectSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| IdtError::InputReadError(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Loaded project settings");
        Self::from_json_str(&json)
    }

    /// Image paths of the session, resolved against `working_directory` when set.
    pub fn capture_set(&self) -> Result<CaptureSet> {
        let resolve = |path: &PathBuf| match &self.working_directory {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.clone(),
        };

        let mut colour_checker = Vec::with_capacity(self.data.colour_checker.len());
        for (key, value) in &self.data.colour_checker {
            let images: Vec<PathBuf> = serde_json::from_value(value.clone())?;
            colour_checker.push((key.clone(), images.iter().map(resolve).collect()));
        }

        Ok(CaptureSet {
            colour_checker,
            grey_card: self.data.grey_card.iter().map(resolve).collect(),
        })
    }
}

impl TryFrom<&ProjectSettings> for IdtConfig {
    type Error = IdtError;

    fn try_from(settings: &ProjectSettings) -> Result<Self> {
        let defaults = IdtConfig::default();

        let lut_size = usize::try_from(settings.lut_size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                IdtError::InvalidConfig(format!(
                    "lut_size must be a positive integer, got {}",
                    settings.lut_size
                ))
            })?;

        let grey_card_reference: [f64; 3] = settings
            .grey_card_reference
            .as_slice()
            .try_into()
            .map_err(|_| {
                IdtError::InvalidConfig(format!(
                    "grey_card_reference needs 3 values, got {}",
                    settings.grey_card_reference.len()
                ))
            })?;

        let config = IdtConfig {
            camera_model: settings.camera_model.clone(),
            cat: settings.cat.parse()?,
            illuminant: settings.illuminant.parse()?,
            reference_colour_checker: settings.reference_colour_checker.parse()?,
            sampling: SamplingConfig::default(),
            lut: LutConfig {
                size: lut_size,
                smoothing: settings.lut_smoothing,
                interpolator: settings.interpolator.parse()?,
                boundary: settings.lut_boundary.parse()?,
                ..defaults.lut
            },
            decoding: DecodingConfig {
                method: settings.decoding_method.parse()?,
                ev_range: settings.ev_range.clone(),
                ev_weights: (!settings.ev_weights.is_empty()).then(|| settings.ev_weights.clone()),
            },
            optimiser: OptimiserConfig {
                space: settings.optimisation_space.parse()?,
                grey_card_reference,
                ..defaults.optimiser
            },
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idt_pipeline::colour::{ChromaticAdaptation, Illuminant, OptimisationSpace};
    use crate::idt_pipeline::config::enums::DecodingMethod;

    const SETTINGS: &str = r#"{
        "camera_model": "Synthetic 001",
        "optimisation_space": "IPT",
        "decoding_method": "Per Channel",
        "lut_size": 512,
        "cat": "Bradford",
        "working_directory": "/captures",
        "data": {
            "colour_checker": {
                "+2 stops": ["data/colour_checker/2/a.tiff"],
                "0": ["data/colour_checker/0/a.tiff", "data/colour_checker/0/b.tiff"],
                "-2": ["/abs/c.tiff"]
            },
            "grey_card": ["data/grey_card/a.tiff"]
        }
    }"#;

    #[test]
    fn test_settings_convert_to_config() {
        let settings = ProjectSettings::from_json_str(SETTINGS).unwrap();
        let config = IdtConfig::try_from(&settings).unwrap();

        assert_eq!(config.camera_model, "Synthetic 001");
        assert_eq!(config.optimiser.space, OptimisationSpace::Ipt);
        assert_eq!(config.decoding.method, DecodingMethod::PerChannel);
        assert_eq!(config.lut.size, 512);
        assert_eq!(config.cat, ChromaticAdaptation::Bradford);
        assert_eq!(config.decoding.ev_weights, None);
    }

    #[test]
    fn test_capture_set_keeps_key_order_and_resolves_paths() {
        let settings = ProjectSettings::from_json_str(SETTINGS).unwrap();
        let captures = settings.capture_set().unwrap();

        let keys: Vec<&str> = captures.colour_checker.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["+2 stops", "0", "-2"]);
        assert_eq!(
            captures.colour_checker[0].1,
            [PathBuf::from("/captures/data/colour_checker/2/a.tiff")]
        );
        assert_eq!(captures.colour_checker[2].1, [PathBuf::from("/abs/c.tiff")]);
        assert_eq!(captures.grey_card, [PathBuf::from("/captures/data/grey_card/a.tiff")]);
    }

    #[test]
    fn test_unknown_optimisation_space_fails_fast() {
        let settings = ProjectSettings {
            optimisation_space: String::from("JzAzBz"),
            ..ProjectSettings::default()
        };
        assert!(matches!(
            IdtConfig::try_from(&settings),
            Err(IdtError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_illuminant_is_parsed_from_settings() {
        let settings = ProjectSettings {
            illuminant: String::from("D65"),
            ..ProjectSettings::default()
        };
        let config = IdtConfig::try_from(&settings).unwrap();
        assert_eq!(config.illuminant, Illuminant::D65);

        let settings = ProjectSettings {
            illuminant: String::from("F11"),
            ..ProjectSettings::default()
        };
        assert!(matches!(
            IdtConfig::try_from(&settings),
            Err(IdtError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_non_positive_lut_size_fails_fast() {
        for lut_size in [0, -16] {
            let settings = ProjectSettings {
                lut_size,
                ..ProjectSettings::default()
            };
            assert!(matches!(
                IdtConfig::try_from(&settings),
                Err(IdtError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_default_settings_round_trip_to_default_config() {
        let config = IdtConfig::try_from(&ProjectSettings::default()).unwrap();
        assert_eq!(config, IdtConfig::default());
    }

    #[test]
    fn test_malformed_image_list_is_rejected() {
        let settings = ProjectSettings::from_json_str(
            r#"{ "data": { "colour_checker": { "0": "not-a-list" } } }"#,
        )
        .unwrap();
        assert!(matches!(settings.capture_set(), Err(IdtError::Json(_))));
    }
}
