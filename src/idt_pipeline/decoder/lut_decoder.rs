use tracing::{debug, instrument, warn};

use crate::idt_pipeline::colour::aces_rgb_to_xyz;
use crate::idt_pipeline::common::error::{IdtError, Result, Stage};
use crate::idt_pipeline::config::{DecodingConfig, DecodingMethod};
use crate::idt_pipeline::decoder::types::{DecodedSamples, DecodingLut};
use crate::idt_pipeline::exposure::ExposureSeries;
use crate::idt_pipeline::lut::{Coverage, Lut1D, Lut3x1D};

/// ACES2065-1 luminance weights of R, G and B, the Y row of the AP0 matrix.
fn aces_luminance() -> [f64; 3] {
    let to_xyz = aces_rgb_to_xyz();
    [to_xyz[(1, 0)], to_xyz[(1, 1)], to_xyz[(1, 2)]]
}

/// Reduces a per-channel LUT according to `method`, re-clipping the result
/// to be non-decreasing.
pub fn reduce_lut(lut: &Lut3x1D, method: DecodingMethod) -> Result<Lut3x1D> {
    if method == DecodingMethod::PerChannel {
        return Ok(lut.clone());
    }

    let tables = lut.channels.each_ref().map(Lut1D::table);
    let luminance = aces_luminance();
    let mut running = f64::NEG_INFINITY;
    let reduced: Vec<f64> = (0..lut.size())
        .map(|i| {
            let rgb = [tables[0][i], tables[1][i], tables[2][i]];
            let value = match method {
                DecodingMethod::Median => median(rgb),
                DecodingMethod::Average => rgb.iter().sum::<f64>() / 3.0,
                DecodingMethod::Aces => rgb.iter().zip(luminance).map(|(v, w)| v * w).sum(),
                DecodingMethod::PerChannel => rgb[1],
            };
            running = running.max(value);
            running
        })
        .collect();

    let template = &lut.channels[0];
    let single = Lut1D::new(reduced, template.interpolator(), template.boundary())?;
    let coverage = Coverage {
        lo: lut.coverage.iter().map(|c| c.lo).fold(f64::INFINITY, f64::min),
        hi: lut.coverage.iter().map(|c| c.hi).fold(f64::NEG_INFINITY, f64::max),
    };
    Ok(Lut3x1D {
        channels: [single.clone(), single.clone(), single],
        coverage: [coverage; 3],
    })
}

fn median(mut rgb: [f64; 3]) -> f64 {
    rgb.sort_by(f64::total_cmp);
    rgb[1]
}

/// Decodes checker and grey-card samples through the decoding LUT.
pub struct Decoder {
    config: DecodingConfig,
    /// Checker patch standing in for the grey card
    mid_grey: usize,
}

impl Decoder {
    pub fn new(config: DecodingConfig, mid_grey: usize) -> Self {
        Self { config, mid_grey }
    }

    pub fn decoding_lut(&self, camera_model: &str, lut: &Lut3x1D) -> Result<DecodingLut> {
        Ok(DecodingLut {
            camera_model: camera_model.to_string(),
            method: self.config.method,
            lut: reduce_lut(lut, self.config.method)?,
        })
    }

    /// Decodes the exposures in the configured EV range that were captured,
    /// normalises each to EV 0 and combines them.
    #[instrument(skip_all, fields(method = %lut.method))]
    pub fn decode(&self, lut: &DecodingLut, series: &ExposureSeries) -> Result<DecodedSamples> {
        let weights = self
            .config
            .ev_weights
            .clone()
            .unwrap_or_else(|| vec![1.0; self.config.ev_range.len()]);

        let patch_count = series.patch_count();
        let mut sum = vec![[0.0f64; 3]; patch_count];
        let mut total_weight = 0.0;
        let mut exposures = Vec::new();

        for (&ev, &weight) in self.config.ev_range.iter().zip(&weights) {
            if weight == 0.0 {
                continue;
            }
            let Some(samples) = series.patches_at(ev) else {
                debug!(ev, "Exposure not captured, skipped");
                continue;
            };
            let scale = (-ev).exp2();
            for (patch, (acc, sample)) in sum.iter_mut().zip(samples).enumerate() {
                let decoded = self.decode_value(lut, sample.mean, || {
                    format!("patch {patch} at exposure {ev}")
                })?;
                for c in 0..3 {
                    acc[c] += weight * decoded[c] * scale;
                }
            }
            total_weight += weight;
            exposures.push(ev);
        }

        if exposures.is_empty() || total_weight <= 0.0 {
            return Err(IdtError::MissingReferenceExposure(self.config.ev_range.clone()));
        }
        let checker = sum
            .into_iter()
            .map(|acc| acc.map(|v| v / total_weight))
            .collect();

        let (grey_encoded, grey_from_checker) = match series.grey_card() {
            Some(sample) => (sample.mean, false),
            None => {
                let reference = series
                    .patches_at(0.0)
                    .and_then(|patches| patches.get(self.mid_grey))
                    .ok_or_else(|| IdtError::MissingReferenceExposure(vec![0.0]))?;
                warn!("No grey card supplied, using checker patch {}", self.mid_grey);
                (reference.mean, true)
            }
        };
        let grey = self.decode_value(lut, grey_encoded, || String::from("grey card"))?;

        debug!(?exposures, ?grey, "Decoded samples");

        Ok(DecodedSamples {
            checker,
            grey,
            exposures,
            grey_from_checker,
        })
    }

    fn decode_value(
        &self,
        lut: &DecodingLut,
        encoded: [f64; 3],
        context: impl Fn() -> String,
    ) -> Result<[f64; 3]> {
        if encoded.iter().any(|v| !v.is_finite()) {
            return Err(IdtError::non_finite(Stage::Decoder, context()));
        }
        let decoded = lut.apply_rgb(encoded);
        if decoded.iter().any(|v| !v.is_finite()) {
            return Err(IdtError::non_finite(Stage::Decoder, context()));
        }
        Ok(decoded)
    }
}
