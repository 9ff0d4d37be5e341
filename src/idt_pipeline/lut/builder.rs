use nalgebra::Vector3;
use tracing::{debug, instrument};

use crate::idt_pipeline::colour::ReferenceColourChecker;
use crate::idt_pipeline::common::error::{IdtError, Result, Stage};
use crate::idt_pipeline::config::{BoundaryPolicy, LutConfig, LutPatchSelection};
use crate::idt_pipeline::exposure::ExposureSeries;
use crate::idt_pipeline::lut::interpolate::{knot_linear, least_squares_slope};
use crate::idt_pipeline::lut::types::Coverage;

/// Blocks considered at each end when extrapolating linearly.
const EDGE_BLOCKS: usize = 3;

/// Dense fitted curve of one channel, before filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedCurve {
    /// Uniform samples over `[0, 1]`
    pub table: Vec<f64>,
    pub coverage: Coverage,
}

/// Pool-adjacent-violators fit of `(x, y)` pairs.
///
/// Pairs sharing an `x` are averaged first. Returns the block centroids,
/// strictly increasing in `x` and non-decreasing in `y`.
pub fn isotonic_regression(pairs: &[(f64, f64)]) -> (Vec<f64>, Vec<f64>) {
    let mut sorted = pairs.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    // (sum_x, sum_y, count)
    let mut blocks: Vec<(f64, f64, f64)> = Vec::new();
    let mut previous_x = f64::NAN;
    for (x, y) in sorted {
        match blocks.last_mut() {
            Some(block) if x == previous_x => {
                block.0 += x;
                block.1 += y;
                block.2 += 1.0;
            }
            _ => blocks.push((x, y, 1.0)),
        }
        previous_x = x;

        while blocks.len() > 1 {
            let n = blocks.len();
            let (last, before) = (blocks[n - 1], blocks[n - 2]);
            if before.1 / before.2 <= last.1 / last.2 {
                break;
            }
            blocks.pop();
            let merged = &mut blocks[n - 2];
            merged.0 += last.0;
            merged.1 += last.1;
            merged.2 += last.2;
        }
    }

    blocks
        .iter()
        .map(|(sx, sy, n)| (sx / n, sy / n))
        .unzip()
}

/// Fits the per-channel decoding curve from the merged exposure series.
pub struct LutBuilder {
    config: LutConfig,
    reference: Vec<Vector3<f64>>,
    patches: Vec<usize>,
}

impl LutBuilder {
    /// `reference` holds the ACES2065-1 value of every checker patch.
    pub fn new(config: LutConfig, checker: &ReferenceColourChecker, reference: Vec<Vector3<f64>>) -> Self {
        let patches = match config.patches {
            LutPatchSelection::Neutrals => checker.neutrals.clone().collect(),
            LutPatchSelection::AllPatches => (0..checker.len()).collect(),
        };
        Self {
            config,
            reference,
            patches,
        }
    }

    pub fn dense_size(&self) -> usize {
        self.config.size * self.config.oversampling
    }

    #[instrument(skip_all, fields(exposures = series.len(), patches = self.patches.len()))]
    pub fn build(&self, series: &ExposureSeries) -> Result<[FittedCurve; 3]> {
        let mut pairs: [Vec<(f64, f64)>; 3] = Default::default();
        for (ev, samples) in series.iter() {
            let gain = ev.gain();
            for &patch in &self.patches {
                let (Some(sample), Some(reference)) = (samples.get(patch), self.reference.get(patch))
                else {
                    continue;
                };
                for (c, channel) in pairs.iter_mut().enumerate() {
                    let encoded = sample.mean[c];
                    let linear = reference[c] * gain;
                    if !encoded.is_finite() || !linear.is_finite() {
                        return Err(IdtError::non_finite(
                            Stage::LutBuilder,
                            format!("exposure {ev}, patch {patch}, channel {c}"),
                        ));
                    }
                    channel.push((encoded, linear));
                }
            }
        }

        let [r, g, b] = pairs;
        Ok([self.fit(0, &r)?, self.fit(1, &g)?, self.fit(2, &b)?])
    }

    fn fit(&self, channel: usize, pairs: &[(f64, f64)]) -> Result<FittedCurve> {
        let (xs, ys) = isotonic_regression(pairs);
        if xs.len() < 2 {
            return Err(IdtError::InsufficientSamples {
                stage: Stage::LutBuilder,
                context: format!("distinct encoded values on channel {channel}"),
                valid: xs.len(),
                required: 2,
            });
        }

        let last = xs.len() - 1;
        let coverage = Coverage {
            lo: xs[0],
            hi: xs[last],
        };
        let edge = EDGE_BLOCKS.min(xs.len());
        let (low_slope, high_slope) = match self.config.fit_extrapolation {
            BoundaryPolicy::Clamp => (0.0, 0.0),
            BoundaryPolicy::Linear => (
                least_squares_slope(&xs[..edge], &ys[..edge]).max(0.0),
                least_squares_slope(&xs[xs.len() - edge..], &ys[ys.len() - edge..]).max(0.0),
            ),
        };

        let n = self.dense_size();
        let step = 1.0 / (n - 1) as f64;
        let mut table: Vec<f64> = (0..n)
            .map(|i| {
                let x = i as f64 * step;
                if x < coverage.lo {
                    ys[0] + low_slope * (x - coverage.lo)
                } else if x > coverage.hi {
                    ys[last] + high_slope * (x - coverage.hi)
                } else {
                    knot_linear(&xs, &ys, x)
                }
            })
            .collect();

        if self.config.smoothing > 0.0 {
            table = gaussian_smooth(&table, self.config.smoothing * self.config.oversampling as f64);
        }

        debug!(
            channel,
            blocks = xs.len(),
            lo = coverage.lo,
            hi = coverage.hi,
            "Fitted decoding curve"
        );

        Ok(FittedCurve { table, coverage })
    }
}

/// Gaussian blur with edge replication. Keeps a non-decreasing input
/// non-decreasing.
fn gaussian_smooth(values: &[f64], sigma: f64) -> Vec<f64> {
    let radius = (3.0 * sigma).ceil() as isize;
    let kernel: Vec<f64> = (-radius..=radius)
        .map(|k| (-(k as f64).powi(2) / (2.0 * sigma * sigma)).exp())
        .collect();
    let norm: f64 = kernel.iter().sum();
    let last = values.len() as isize - 1;

    (0..values.len() as isize)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(j, w)| w * values[(i + j as isize - radius).clamp(0, last) as usize])
                .sum::<f64>()
                / norm
        })
        .collect()
}
