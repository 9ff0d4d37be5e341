use nalgebra::{Matrix3, Vector3};

use crate::idt_pipeline::colour::OptimisationSpace;
use crate::idt_pipeline::common::error::{IdtError, Result};

/// Fitted camera-to-ACES transform: `k · M · diag(rgb_w)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisationResult {
    /// White-preserving colour matrix, each row sums to 1
    pub m: Matrix3<f64>,
    /// White-balance gains, green normalised to 1
    pub rgb_w: [f64; 3],
    /// Exposure gain
    pub k: f64,
    pub space: OptimisationSpace,
    pub converged: bool,
    pub iterations: usize,
    /// Mean Euclidean colour difference in `space` over the checker
    pub delta_e: f64,
    /// Mean CIEDE2000 over the checker
    pub delta_e_2000: f64,
    /// Colour difference in `space` of the transformed grey sample to the
    /// grey reference
    pub white_point_error: f64,
}

impl OptimisationResult {
    /// Full 3×3 transform applied to decoded camera RGB.
    pub fn idt_matrix(&self) -> Matrix3<f64> {
        self.m * Matrix3::from_diagonal(&Vector3::from(self.rgb_w)) * self.k
    }

    /// Errors unless the solve converged.
    pub fn ensure_converged(self) -> Result<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(IdtError::OptimisationNonConverged {
                iterations: self.iterations,
                delta_e: self.delta_e,
            })
        }
    }
}
