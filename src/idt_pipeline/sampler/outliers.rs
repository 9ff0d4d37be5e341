use crate::idt_pipeline::common::error::{IdtError, Result, Stage};
use crate::idt_pipeline::config::SamplingConfig;
use crate::idt_pipeline::sampler::types::RawSample;

/// Flags values whose z-score exceeds `threshold`, using the population
/// standard deviation. Returns `true` for outliers. A constant input flags
/// nothing, even when summation leaves rounding noise in the deviation.
pub fn mask_outliers(values: &[f64], threshold: f64) -> Vec<bool> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    let magnitude = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if std <= f64::EPSILON * magnitude * n {
        return vec![false; values.len()];
    }
    values
        .iter()
        .map(|v| ((v - mean) / std).abs() > threshold)
        .collect()
}

/// Mean of the pixels that pass z-score masking on every channel.
///
/// `context` names the exposure and patch in errors.
pub fn robust_mean(pixels: &[[f32; 3]], config: &SamplingConfig, context: &str) -> Result<RawSample> {
    if pixels.iter().flatten().any(|v| !v.is_finite()) {
        return Err(IdtError::non_finite(Stage::Sampler, context));
    }

    let mut mask = vec![true; pixels.len()];
    for channel in 0..3 {
        let values: Vec<f64> = pixels.iter().map(|p| p[channel] as f64).collect();
        for (valid, outlier) in mask
            .iter_mut()
            .zip(mask_outliers(&values, config.z_score_threshold))
        {
            *valid &= !outlier;
        }
    }

    let total = pixels.len();
    let required = config
        .min_valid_pixels
        .max((config.min_valid_fraction * total as f64).ceil() as usize);
    let valid = mask.iter().filter(|&&v| v).count();
    if valid < required {
        return Err(IdtError::InsufficientSamples {
            stage: Stage::Sampler,
            context: context.to_string(),
            valid,
            required,
        });
    }

    let mut sum = [0.0f64; 3];
    for (pixel, _) in pixels.iter().zip(&mask).filter(|(_, valid)| **valid) {
        for c in 0..3 {
            sum[c] += pixel[c] as f64;
        }
    }
    let mean = sum.map(|s| s / valid as f64);

    Ok(RawSample { mean, mask })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SamplingConfig {
        SamplingConfig::default()
    }

    #[test]
    fn test_constant_values_are_never_outliers() {
        assert!(mask_outliers(&[0.4; 10], 0.5).iter().all(|&o| !o));
        assert!(mask_outliers(&[], 3.0).is_empty());
    }

    #[test]
    fn test_rounding_noise_is_not_an_outlier() {
        for value in [0.1, 0.3f32 as f64, 0.7, 1.0 / 3.0] {
            let values = vec![value; 1000];
            assert!(
                mask_outliers(&values, 0.5).iter().all(|&o| !o),
                "constant {value} produced outliers"
            );
        }
        let pixels = vec![[0.3f32, 0.1, 0.7]; 1000];
        let sample = robust_mean(&pixels, &config(), "flat patch").unwrap();
        assert_eq!(sample.valid_count(), 1000);
    }

    #[test]
    fn test_single_spike_is_flagged() {
        let mut values = vec![0.2; 99];
        values.push(5.0);
        let mask = mask_outliers(&values, 3.0);
        assert!(mask[99]);
        assert_eq!(mask.iter().filter(|&&o| o).count(), 1);
    }

    #[test]
    fn test_injected_outliers_do_not_move_the_mean() {
        let clean = [0.3f32, 0.4, 0.5];
        let mut pixels = Vec::new();
        for i in 0..400 {
            // small deterministic noise around the patch value
            let jitter = ((i % 5) as f32 - 2.0) * 0.001;
            pixels.push([clean[0] + jitter, clean[1] + jitter, clean[2] + jitter]);
        }
        pixels[17] = [1.0, 0.4, 0.5];
        pixels[230] = [0.3, 0.0, 0.5];
        pixels[311] = [0.3, 0.4, 0.95];

        let sample = robust_mean(&pixels, &config(), "test").unwrap();

        assert!(!sample.mask[17] && !sample.mask[230] && !sample.mask[311]);
        assert_eq!(sample.valid_count(), 397);
        for c in 0..3 {
            assert!((sample.mean[c] - clean[c] as f64).abs() < 1e-4);
        }
    }

    #[test]
    fn test_too_few_survivors_is_an_error() {
        let pixels = vec![[0.5f32; 3]; 8];
        let result = robust_mean(&pixels, &config(), "exposure 0, patch 3");
        match result {
            Err(IdtError::InsufficientSamples {
                stage,
                valid,
                required,
                ..
            }) => {
                assert_eq!(stage, Stage::Sampler);
                assert_eq!(valid, 8);
                assert_eq!(required, 16);
            }
            other => panic!("expected InsufficientSamples, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_fraction_raises_the_requirement() {
        let sampling = SamplingConfig {
            min_valid_pixels: 1,
            min_valid_fraction: 0.96,
            z_score_threshold: 1.0,
        };
        let mut pixels = vec![[0.5f32; 3]; 90];
        pixels.extend(vec![[0.9f32; 3]; 10]);
        assert!(matches!(
            robust_mean(&pixels, &sampling, "patch"),
            Err(IdtError::InsufficientSamples { valid: 90, required, .. }) if required >= 95
        ));
    }

    #[test]
    fn test_non_finite_pixel_is_rejected() {
        let mut pixels = vec![[0.5f32; 3]; 32];
        pixels[3][1] = f32::NAN;
        assert!(matches!(
            robust_mean(&pixels, &config(), "exposure +1, patch 0"),
            Err(IdtError::NonFiniteValue { stage: Stage::Sampler, .. })
        ));
    }
}
