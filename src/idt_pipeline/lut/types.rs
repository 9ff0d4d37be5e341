//! LUT types

use crate::idt_pipeline::common::error::{IdtError, Result, Stage};
use crate::idt_pipeline::config::{BoundaryPolicy, Interpolator};
use crate::idt_pipeline::lut::interpolate::{pchip_slopes, uniform_linear, uniform_pchip};

/// Encoded-domain interval backed by observed samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub lo: f64,
    pub hi: f64,
}

impl Coverage {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.lo && x <= self.hi
    }
}

/// Uniformly sampled curve over the encoded domain `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut1D {
    table: Vec<f64>,
    interpolator: Interpolator,
    boundary: BoundaryPolicy,
    /// Hermite slopes, empty unless the interpolator is cubic
    slopes: Vec<f64>,
}

impl Lut1D {
    pub fn new(table: Vec<f64>, interpolator: Interpolator, boundary: BoundaryPolicy) -> Result<Self> {
        if table.len() < 2 {
            return Err(IdtError::InvalidConfig(format!(
                "a LUT needs at least 2 entries, got {}",
                table.len()
            )));
        }
        if table.iter().any(|v| !v.is_finite()) {
            return Err(IdtError::non_finite(Stage::LutFilter, "LUT table"));
        }
        let slopes = match interpolator {
            Interpolator::Linear => Vec::new(),
            Interpolator::Cubic => pchip_slopes(&table),
        };
        Ok(Self {
            table,
            interpolator,
            boundary,
            slopes,
        })
    }

    pub fn table(&self) -> &[f64] {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn interpolator(&self) -> Interpolator {
        self.interpolator
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Decodes one encoded value. Inputs outside `[0, 1]` follow the
    /// boundary policy.
    pub fn apply(&self, x: f64) -> f64 {
        let last = self.table.len() - 1;
        if x < 0.0 || x > 1.0 {
            let (edge, anchor, slope) = if x < 0.0 {
                (self.table[0], 0.0, self.edge_slope(0, 1))
            } else {
                (self.table[last], 1.0, self.edge_slope(last - 1, last))
            };
            return match self.boundary {
                BoundaryPolicy::Clamp => edge,
                BoundaryPolicy::Linear => edge + slope * (x - anchor),
            };
        }
        match self.interpolator {
            Interpolator::Linear => uniform_linear(&self.table, x),
            Interpolator::Cubic => uniform_pchip(&self.table, &self.slopes, x),
        }
    }

    fn edge_slope(&self, a: usize, b: usize) -> f64 {
        (self.table[b] - self.table[a]) * (self.table.len() - 1) as f64
    }

    pub fn is_monotonic(&self) -> bool {
        self.table.windows(2).all(|w| w[1] >= w[0])
    }
}

/// Three per-channel LUTs with the encoded range each was fitted on.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3x1D {
    pub channels: [Lut1D; 3],
    pub coverage: [Coverage; 3],
}

impl Lut3x1D {
    pub fn size(&self) -> usize {
        self.channels[0].len()
    }

    pub fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        [
            self.channels[0].apply(rgb[0]),
            self.channels[1].apply(rgb[1]),
            self.channels[2].apply(rgb[2]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(boundary: BoundaryPolicy) -> Lut1D {
        let table = (0..5).map(|i| 2.0 * i as f64 / 4.0).collect();
        Lut1D::new(table, Interpolator::Linear, boundary).unwrap()
    }

    #[test]
    fn test_apply_inside_domain() {
        let lut = ramp(BoundaryPolicy::Clamp);
        assert!((lut.apply(0.3) - 0.6).abs() < 1e-12);
        assert!((lut.apply(1.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_policies() {
        let clamp = ramp(BoundaryPolicy::Clamp);
        assert_eq!(clamp.apply(-0.5), 0.0);
        assert_eq!(clamp.apply(1.5), 2.0);

        let linear = ramp(BoundaryPolicy::Linear);
        assert!((linear.apply(-0.5) + 1.0).abs() < 1e-12);
        assert!((linear.apply(1.5) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cubic_lookup_matches_linear_on_a_ramp() {
        let table: Vec<f64> = (0..16).map(|i| i as f64 / 15.0).collect();
        let lut = Lut1D::new(table, Interpolator::Cubic, BoundaryPolicy::Clamp).unwrap();
        assert!((lut.apply(0.42) - 0.42).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_tables() {
        assert!(Lut1D::new(vec![1.0], Interpolator::Linear, BoundaryPolicy::Clamp).is_err());
        assert!(matches!(
            Lut1D::new(vec![0.0, f64::NAN], Interpolator::Linear, BoundaryPolicy::Clamp),
            Err(IdtError::NonFiniteValue { .. })
        ));
    }
}
