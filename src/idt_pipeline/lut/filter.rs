use tracing::{debug, instrument};

use crate::idt_pipeline::common::error::{IdtError, Result};
use crate::idt_pipeline::config::{BoundaryPolicy, Interpolator, LutConfig};
use crate::idt_pipeline::lut::builder::FittedCurve;
use crate::idt_pipeline::lut::interpolate::{pchip_slopes, uniform_linear, uniform_pchip};
use crate::idt_pipeline::lut::types::{Coverage, Lut1D, Lut3x1D};

/// Clips every decreasing run of `table` to the running maximum.
///
/// Fails when the largest drop is above `tolerance` times the output range.
pub fn enforce_monotonic(table: &mut [f64], tolerance: f64, channel: usize) -> Result<()> {
    let (min, max) = table
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let allowed = tolerance * (max - min);

    let mut running = f64::NEG_INFINITY;
    let mut largest_drop: f64 = 0.0;
    for value in table.iter_mut() {
        if *value < running {
            largest_drop = largest_drop.max(running - *value);
            *value = running;
        } else {
            running = *value;
        }
    }

    if largest_drop > allowed {
        return Err(IdtError::NonMonotonicLut {
            channel,
            drop: largest_drop,
            tolerance: allowed,
        });
    }
    if largest_drop > 0.0 {
        debug!(channel, largest_drop, "Clipped non-monotonic run");
    }
    Ok(())
}

/// Turns dense fitted curves into final fixed-size LUTs.
pub struct LutFilter {
    config: LutConfig,
}

impl LutFilter {
    pub fn new(config: LutConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, fields(size = self.config.size))]
    pub fn filter(&self, curves: [FittedCurve; 3]) -> Result<Lut3x1D> {
        let coverage = [curves[0].coverage, curves[1].coverage, curves[2].coverage];
        let [r, g, b] = curves;
        Ok(Lut3x1D {
            channels: [
                self.filter_channel(0, r)?,
                self.filter_channel(1, g)?,
                self.filter_channel(2, b)?,
            ],
            coverage,
        })
    }

    fn filter_channel(&self, channel: usize, curve: FittedCurve) -> Result<Lut1D> {
        let mut dense = curve.table;
        enforce_monotonic(&mut dense, self.config.monotonic_tolerance, channel)?;

        let sample = Resampler::new(&dense, self.config.interpolator);
        let size = self.config.size;
        let step = 1.0 / (size - 1) as f64;
        let mut table: Vec<f64> = (0..size).map(|i| sample.at(i as f64 * step)).collect();

        rewrite_tails(&mut table, &sample, curve.coverage, self.config.boundary);

        // tails and cubic resampling can only leave rounding-level drops
        let mut running = f64::NEG_INFINITY;
        for value in table.iter_mut() {
            running = running.max(*value);
            *value = running;
        }

        Lut1D::new(table, self.config.interpolator, self.config.boundary)
    }
}

struct Resampler<'a> {
    dense: &'a [f64],
    slopes: Option<Vec<f64>>,
}

impl<'a> Resampler<'a> {
    fn new(dense: &'a [f64], interpolator: Interpolator) -> Self {
        let slopes = match interpolator {
            Interpolator::Linear => None,
            Interpolator::Cubic => Some(pchip_slopes(dense)),
        };
        Self { dense, slopes }
    }

    fn at(&self, x: f64) -> f64 {
        match &self.slopes {
            None => uniform_linear(self.dense, x),
            Some(slopes) => uniform_pchip(self.dense, slopes, x),
        }
    }
}

/// Rewrites the entries outside `coverage` from the curve's value and slope
/// at the coverage edge.
fn rewrite_tails(table: &mut [f64], curve: &Resampler<'_>, coverage: Coverage, boundary: BoundaryPolicy) {
    let step = 1.0 / (table.len() - 1) as f64;
    let width = (coverage.hi - coverage.lo).max(0.0);
    let h = step.min(width);

    let lo_value = curve.at(coverage.lo);
    let hi_value = curve.at(coverage.hi);
    let (lo_slope, hi_slope) = match boundary {
        BoundaryPolicy::Clamp => (0.0, 0.0),
        BoundaryPolicy::Linear if h > 0.0 => (
            ((curve.at(coverage.lo + h) - lo_value) / h).max(0.0),
            ((hi_value - curve.at(coverage.hi - h)) / h).max(0.0),
        ),
        BoundaryPolicy::Linear => (0.0, 0.0),
    };

    for (i, value) in table.iter_mut().enumerate() {
        let x = i as f64 * step;
        if x < coverage.lo {
            *value = lo_value + lo_slope * (x - coverage.lo);
        } else if x > coverage.hi {
            *value = hi_value + hi_slope * (x - coverage.hi);
        }
    }
}
