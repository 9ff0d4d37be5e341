use nalgebra::{Matrix3, Vector3};

use crate::idt_pipeline::colour::{
    ACES_WHITE_XY, OptimisationSpace, aces_rgb_to_xyz, delta_e_2000, euclidean_delta_e, xy_to_xyz,
    xyz_to_lab,
};
use crate::idt_pipeline::config::WhiteBalanceRefinement;

/// Free matrix parameters: the first two entries of every row.
pub const MATRIX_PARAMS: usize = 6;

const IDENTITY: [f64; MATRIX_PARAMS] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Builds the white-preserving matrix whose third column completes each row
/// to a sum of 1.
pub fn matrix_from_params(p: &[f64]) -> Matrix3<f64> {
    Matrix3::new(
        p[0],
        p[1],
        1.0 - p[0] - p[1],
        p[2],
        p[3],
        1.0 - p[2] - p[3],
        p[4],
        p[5],
        1.0 - p[4] - p[5],
    )
}

/// Mean colour difference between transformed samples and the reference.
pub struct Objective {
    space: OptimisationSpace,
    to_xyz: Matrix3<f64>,
    samples: Vec<Vector3<f64>>,
    reference_xyz: Vec<Vector3<f64>>,
    reference: Vec<Vector3<f64>>,
    grey: Vector3<f64>,
    grey_reference: Vector3<f64>,
    rgb_w: [f64; 3],
    k: f64,
    mode: WhiteBalanceRefinement,
    grey_weight: f64,
}

impl Objective {
    /// `reference_xyz` holds one XYZ per sample, `grey_reference` is the
    /// ACES2065-1 value of the grey sample, `rgb_w` and `k` the closed-form
    /// white balance.
    pub fn new(
        space: OptimisationSpace,
        samples: &[[f64; 3]],
        reference_xyz: &[Vector3<f64>],
        grey: [f64; 3],
        grey_reference: [f64; 3],
        (rgb_w, k): ([f64; 3], f64),
    ) -> Self {
        let to_xyz = aces_rgb_to_xyz();
        Self {
            space,
            to_xyz,
            samples: samples.iter().map(|&s| Vector3::from(s)).collect(),
            reference_xyz: reference_xyz.to_vec(),
            reference: reference_xyz.iter().map(|xyz| space.from_xyz(xyz)).collect(),
            grey: Vector3::from(grey),
            grey_reference: space.from_xyz(&(to_xyz * Vector3::from(grey_reference))),
            rgb_w,
            k,
            mode: WhiteBalanceRefinement::Fixed,
            grey_weight: 0.0,
        }
    }

    /// Also refines the R/B gains and k, penalising grey error by `weight`.
    pub fn joint(mut self, weight: f64) -> Self {
        self.mode = WhiteBalanceRefinement::Joint;
        self.grey_weight = weight;
        self
    }

    pub fn dimensions(&self) -> usize {
        match self.mode {
            WhiteBalanceRefinement::Fixed => MATRIX_PARAMS,
            WhiteBalanceRefinement::Joint => MATRIX_PARAMS + 3,
        }
    }

    /// Identity matrix with the closed-form white balance.
    pub fn start(&self) -> Vec<f64> {
        let mut start = IDENTITY.to_vec();
        if self.mode == WhiteBalanceRefinement::Joint {
            start.extend([self.rgb_w[0], self.rgb_w[2], self.k]);
        }
        start
    }

    /// Splits parameters into `(M, RGB_w, k)`.
    pub fn transform(&self, params: &[f64]) -> (Matrix3<f64>, [f64; 3], f64) {
        let m = matrix_from_params(&params[..MATRIX_PARAMS]);
        match self.mode {
            WhiteBalanceRefinement::Fixed => (m, self.rgb_w, self.k),
            WhiteBalanceRefinement::Joint => (
                m,
                [params[MATRIX_PARAMS], self.rgb_w[1], params[MATRIX_PARAMS + 1]],
                params[MATRIX_PARAMS + 2],
            ),
        }
    }

    pub fn evaluate(&self, params: &[f64]) -> f64 {
        let transform = self.transform(params);
        let mean = self.mean_delta_e(&transform);
        match self.mode {
            WhiteBalanceRefinement::Fixed => mean,
            WhiteBalanceRefinement::Joint => mean + self.grey_weight * self.grey_error(&transform),
        }
    }

    fn apply(&self, (m, rgb_w, k): &(Matrix3<f64>, [f64; 3], f64), rgb: &Vector3<f64>) -> Vector3<f64> {
        let balanced = rgb.component_mul(&Vector3::from(*rgb_w));
        self.to_xyz * (m * balanced * *k)
    }

    pub fn mean_delta_e(&self, transform: &(Matrix3<f64>, [f64; 3], f64)) -> f64 {
        let total: f64 = self
            .samples
            .iter()
            .zip(&self.reference)
            .map(|(sample, reference)| {
                euclidean_delta_e(&self.space.from_xyz(&self.apply(transform, sample)), reference)
            })
            .sum();
        total / self.samples.len() as f64
    }

    pub fn mean_delta_e_2000(&self, transform: &(Matrix3<f64>, [f64; 3], f64)) -> f64 {
        let white = xy_to_xyz(ACES_WHITE_XY);
        let total: f64 = self
            .samples
            .iter()
            .zip(&self.reference_xyz)
            .map(|(sample, reference)| {
                delta_e_2000(
                    &xyz_to_lab(&self.apply(transform, sample), &white),
                    &xyz_to_lab(reference, &white),
                )
            })
            .sum();
        total / self.samples.len() as f64
    }

    pub fn grey_error(&self, transform: &(Matrix3<f64>, [f64; 3], f64)) -> f64 {
        let grey = self.space.from_xyz(&self.apply(transform, &self.grey));
        euclidean_delta_e(&grey, &self.grey_reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idt_pipeline::colour::aces_xyz_to_rgb;

    fn reference_xyz() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(0.2, 0.18, 0.1),
            Vector3::new(0.1, 0.2, 0.3),
            Vector3::new(0.4, 0.3, 0.05),
        ]
    }

    fn aces(xyz: &[Vector3<f64>]) -> Vec<[f64; 3]> {
        xyz.iter()
            .map(|v| {
                let rgb = aces_xyz_to_rgb() * v;
                [rgb.x, rgb.y, rgb.z]
            })
            .collect()
    }

    #[test]
    fn test_rows_sum_to_one() {
        let m = matrix_from_params(&[0.8, 0.3, -0.1, 1.2, 0.05, 0.05]);
        for row in 0..3 {
            assert!((m.row(row).sum() - 1.0).abs() < 1e-15);
        }
        assert_eq!(matrix_from_params(&IDENTITY), Matrix3::identity());
    }

    #[test]
    fn test_exact_samples_score_zero() {
        let xyz = reference_xyz();
        let objective = Objective::new(
            OptimisationSpace::Oklab,
            &aces(&xyz),
            &xyz,
            [0.18; 3],
            [0.18; 3],
            ([1.0; 3], 1.0),
        );
        let start = objective.start();
        assert_eq!(start.len(), MATRIX_PARAMS);
        assert!(objective.evaluate(&start) < 1e-12);
        assert!(objective.mean_delta_e_2000(&objective.transform(&start)) < 1e-9);
    }

    #[test]
    fn test_exposure_gain_is_penalised() {
        let xyz = reference_xyz();
        let objective = Objective::new(
            OptimisationSpace::Ipt,
            &aces(&xyz),
            &xyz,
            [0.18; 3],
            [0.18; 3],
            ([1.0; 3], 1.5),
        );
        assert!(objective.evaluate(&objective.start()) > 1e-3);
    }

    #[test]
    fn test_joint_mode_adds_gain_parameters() {
        let xyz = reference_xyz();
        let objective = Objective::new(
            OptimisationSpace::Oklab,
            &aces(&xyz),
            &xyz,
            [0.2, 0.18, 0.16],
            [0.18; 3],
            ([0.9, 1.0, 1.125], 1.0),
        )
        .joint(10.0);

        let start = objective.start();
        assert_eq!(start.len(), objective.dimensions());
        assert_eq!(&start[MATRIX_PARAMS..], &[0.9, 1.125, 1.0]);
        let (_, rgb_w, k) = objective.transform(&start);
        assert_eq!(rgb_w, [0.9, 1.0, 1.125]);
        assert_eq!(k, 1.0);
        assert!(objective.grey_error(&objective.transform(&start)) < 1e-12);
    }
}
