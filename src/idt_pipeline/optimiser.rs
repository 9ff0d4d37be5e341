//! Colour matrix optimisation module
//!
//! Solves the white-balance gains in closed form from the grey sample, then
//! fits the white-preserving 3×3 matrix and exposure gain that minimise the
//! mean colour difference to the reference checker.

pub mod nelder_mead;
mod objective;
mod solver;
pub mod types;

pub use nelder_mead::{Minimum, NelderMeadOptions, minimise};
pub use objective::{Objective, matrix_from_params};
pub use solver::{Optimiser, closed_form_white_balance};
pub use types::OptimisationResult;
