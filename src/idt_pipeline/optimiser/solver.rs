use nalgebra::Vector3;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::idt_pipeline::colour::aces_xyz_to_rgb;
use crate::idt_pipeline::common::error::{IdtError, Result, Stage};
use crate::idt_pipeline::config::{OptimiserConfig, WhiteBalanceRefinement};
use crate::idt_pipeline::decoder::DecodedSamples;
use crate::idt_pipeline::optimiser::nelder_mead::{Minimum, NelderMeadOptions, minimise};
use crate::idt_pipeline::optimiser::objective::{MATRIX_PARAMS, Objective};
use crate::idt_pipeline::optimiser::types::OptimisationResult;

/// White-balance gains and exposure gain mapping the decoded grey sample
/// onto its reference: `RGB_w[c] = (d_G / g_G) / (d_c / g_c)` and
/// `k = mean(g) / mean(RGB_w ⊙ d)`.
pub fn closed_form_white_balance(grey: [f64; 3], reference: [f64; 3]) -> Result<([f64; 3], f64)> {
    if grey.iter().chain(&reference).any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(IdtError::non_finite(
            Stage::Optimiser,
            format!("white balance of grey sample {grey:?} against {reference:?}"),
        ));
    }
    let green = grey[1] / reference[1];
    let rgb_w = [0, 1, 2].map(|c| green / (grey[c] / reference[c]));
    let balanced: f64 = (0..3).map(|c| rgb_w[c] * grey[c]).sum::<f64>() / 3.0;
    let k = (reference.iter().sum::<f64>() / 3.0) / balanced;
    Ok((rgb_w, k))
}

/// Fits `k · M · diag(RGB_w)` against the reference checker.
///
/// With [`WhiteBalanceRefinement::Joint`] the white point is a soft
/// constraint: the grey error is added to the objective scaled by
/// `white_point_weight` and the result is not projected back onto the
/// white-preserving solution, so `white_point_error` is small but not zero.
pub struct Optimiser {
    config: OptimiserConfig,
    reference_xyz: Vec<Vector3<f64>>,
    /// Reference patch the decoder substitutes for a missing grey card
    mid_grey: Option<usize>,
}

impl Optimiser {
    /// `reference_xyz` holds the checker patch XYZ adapted to the ACES white.
    pub fn new(config: OptimiserConfig, reference_xyz: Vec<Vector3<f64>>) -> Self {
        Self {
            config,
            reference_xyz,
            mid_grey: None,
        }
    }

    pub fn with_mid_grey(mut self, index: usize) -> Self {
        self.mid_grey = Some(index);
        self
    }

    /// ACES2065-1 value the decoded grey sample should land on.
    fn grey_reference(&self, decoded: &DecodedSamples) -> Result<[f64; 3]> {
        if !decoded.grey_from_checker {
            return Ok(self.config.grey_card_reference);
        }
        let xyz = self
            .mid_grey
            .and_then(|index| self.reference_xyz.get(index))
            .ok_or_else(|| {
                IdtError::InvalidConfig(String::from(
                    "grey sample taken from the checker but no mid-grey reference patch is known",
                ))
            })?;
        let rgb = aces_xyz_to_rgb() * xyz;
        Ok([rgb.x, rgb.y, rgb.z])
    }

    #[instrument(skip_all, fields(space = %self.config.space, starts = self.config.initial_guesses))]
    pub fn optimise(&self, decoded: &DecodedSamples) -> Result<OptimisationResult> {
        if decoded.checker.len() != self.reference_xyz.len() {
            return Err(IdtError::InvalidConfig(format!(
                "{} decoded patches for {} reference patches",
                decoded.checker.len(),
                self.reference_xyz.len()
            )));
        }
        if decoded.checker.iter().flatten().any(|v| !v.is_finite()) {
            return Err(IdtError::non_finite(Stage::Optimiser, "decoded checker samples"));
        }

        let grey_reference = self.grey_reference(decoded)?;
        let white_balance = closed_form_white_balance(decoded.grey, grey_reference)?;
        debug!(
            rgb_w = ?white_balance.0,
            k = white_balance.1,
            ?grey_reference,
            "Closed-form white balance"
        );

        let mut objective = Objective::new(
            self.config.space,
            &decoded.checker,
            &self.reference_xyz,
            decoded.grey,
            grey_reference,
            white_balance,
        );
        if self.config.white_balance == WhiteBalanceRefinement::Joint {
            objective = objective.joint(self.config.white_point_weight);
        }

        let options = NelderMeadOptions {
            max_iterations: self.config.max_iterations,
            epsilon: self.config.epsilon,
            initial_step: self.config.initial_step,
        };
        let minima: Vec<Minimum> = self
            .starts(&objective)
            .into_par_iter()
            .map(|start| minimise(|p| objective.evaluate(p), &start, &options))
            .collect();

        // lowest objective wins, earlier starts win ties
        let mut best: Option<(usize, Minimum)> = None;
        for (index, minimum) in minima.into_iter().enumerate() {
            debug!(index, value = minimum.value, iterations = minimum.iterations, "Solve finished");
            if best.as_ref().is_none_or(|(_, b)| minimum.value < b.value) {
                best = Some((index, minimum));
            }
        }
        let Some((index, minimum)) = best else {
            return Err(IdtError::InvalidConfig(String::from("no optimiser starts")));
        };
        if !minimum.value.is_finite() {
            return Err(IdtError::non_finite(Stage::Optimiser, "objective at the best solve"));
        }

        let transform = objective.transform(&minimum.x);
        let result = OptimisationResult {
            m: transform.0,
            rgb_w: transform.1,
            k: transform.2,
            space: self.config.space,
            converged: minimum.converged,
            iterations: minimum.iterations,
            delta_e: objective.mean_delta_e(&transform),
            delta_e_2000: objective.mean_delta_e_2000(&transform),
            white_point_error: objective.grey_error(&transform),
        };

        if result.converged {
            info!(
                start = index,
                iterations = result.iterations,
                delta_e = result.delta_e,
                delta_e_2000 = result.delta_e_2000,
                "Optimisation converged"
            );
        } else {
            warn!(
                iterations = result.iterations,
                delta_e = result.delta_e,
                "Optimisation hit the iteration cap, returning best result"
            );
        }
        Ok(result)
    }

    /// Identity first, then deterministic offsets around it.
    fn starts(&self, objective: &Objective) -> Vec<Vec<f64>> {
        let origin = objective.start();
        (0..self.config.initial_guesses)
            .map(|guess| {
                let mut start = origin.clone();
                if guess > 0 {
                    let magnitude = self.config.initial_step * guess.div_ceil(2) as f64;
                    for (j, value) in start.iter_mut().take(MATRIX_PARAMS).enumerate() {
                        let sign = if (guess + j) % 2 == 0 { 1.0 } else { -1.0 };
                        *value += sign * magnitude;
                    }
                }
                start
            })
            .collect()
    }
}
