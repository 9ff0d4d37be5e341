//! Colour space conversions.
//!
//! Everything operates on `f64` XYZ tristimulus values with `Y = 1` for the
//! reference white. The perceptual spaces (IPT, Oklab) take XYZ directly,
//! without adapting to their native D65 white first, so camera estimates and
//! references land in the same space and distances stay comparable.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use nalgebra::{Matrix3, Vector3};
use palette::convert::IntoColorUnclamped;
use palette::white_point::{D65, WhitePoint};
use palette::{Lab, Oklab, Xyz};

use crate::idt_pipeline::common::error::IdtError;

/// ACES white point chromaticity (approximately D60).
pub const ACES_WHITE_XY: [f64; 2] = [0.32168, 0.33767];

/// CIE D50 chromaticity, the illuminant of the reference checker data.
pub const D50_XY: [f64; 2] = [0.3457, 0.3585];

/// AP0 primaries, red green blue.
const AP0_PRIMARIES_XY: [[f64; 2]; 3] = [[0.7347, 0.2653], [0.0, 1.0], [0.0001, -0.0770]];

/// Normalised primary matrix of AP0 and its inverse.
static ACES_MATRICES: LazyLock<(Matrix3<f64>, Matrix3<f64>)> = LazyLock::new(|| {
    let to_xyz = normalised_primary_matrix(&AP0_PRIMARIES_XY, ACES_WHITE_XY);
    let from_xyz = to_xyz.try_inverse().unwrap_or_else(Matrix3::zeros);
    (to_xyz, from_xyz)
});

const IPT_XYZ_TO_LMS: [[f64; 3]; 3] = [
    [0.4002, 0.7075, -0.0807],
    [-0.2280, 1.1500, 0.0612],
    [0.0, 0.0, 0.9184],
];

const IPT_LMS_TO_IPT: [[f64; 3]; 3] = [
    [0.4000, 0.4000, 0.2000],
    [4.4550, -4.8510, 0.3960],
    [0.8056, 0.3572, -1.1628],
];

pub(crate) fn matrix(rows: &[[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::from_row_slice(rows.as_flattened())
}

/// RGB to XYZ matrix of a colour space given its primaries and white point.
///
/// Each primary column is scaled so that unit RGB lands on the white.
pub fn normalised_primary_matrix(
    primaries_xy: &[[f64; 2]; 3],
    white_xy: [f64; 2],
) -> Matrix3<f64> {
    let columns = primaries_xy.map(|[x, y]| Vector3::new(x, y, 1.0 - x - y));
    let primaries = Matrix3::from_columns(&columns);
    let scale = primaries
        .lu()
        .solve(&xy_to_xyz(white_xy))
        .unwrap_or_else(Vector3::zeros);
    primaries * Matrix3::from_diagonal(&scale)
}

pub fn aces_rgb_to_xyz() -> Matrix3<f64> {
    ACES_MATRICES.0
}

pub fn aces_xyz_to_rgb() -> Matrix3<f64> {
    ACES_MATRICES.1
}

/// Converts CIE xyY to XYZ. A zero `y` yields black.
pub fn xyy_to_xyz(xyy: [f64; 3]) -> Vector3<f64> {
    let [x, y, big_y] = xyy;
    if y == 0.0 {
        return Vector3::zeros();
    }
    Vector3::new(x * big_y / y, big_y, (1.0 - x - y) * big_y / y)
}

/// XYZ of a white point given its chromaticity, normalised to `Y = 1`.
pub fn xy_to_xyz(xy: [f64; 2]) -> Vector3<f64> {
    xyy_to_xyz([xy[0], xy[1], 1.0])
}

pub fn xyz_to_ipt(xyz: &Vector3<f64>) -> Vector3<f64> {
    let lms = matrix(&IPT_XYZ_TO_LMS) * xyz;
    let lms = lms.map(|v| v.signum() * v.abs().powf(0.43));
    matrix(&IPT_LMS_TO_IPT) * lms
}

pub fn xyz_to_oklab(xyz: &Vector3<f64>) -> Vector3<f64> {
    let lab: Oklab<f64> = Xyz::<D65, f64>::new(xyz.x, xyz.y, xyz.z).into_color_unclamped();
    Vector3::new(lab.l, lab.a, lab.b)
}

/// CIE 1976 L*a*b* relative to the given white.
///
/// The tristimulus values are rescaled onto palette's D65 white, which is the
/// same white normalisation L*a*b* itself performs.
pub fn xyz_to_lab(xyz: &Vector3<f64>, white: &Vector3<f64>) -> Vector3<f64> {
    let d65 = <D65 as WhitePoint<f64>>::get_xyz();
    let scaled = xyz
        .component_div(white)
        .component_mul(&Vector3::new(d65.x, d65.y, d65.z));
    let lab: Lab<D65, f64> =
        Xyz::<D65, f64>::new(scaled.x, scaled.y, scaled.z).into_color_unclamped();
    Vector3::new(lab.l, lab.a, lab.b)
}

/// Uniform colour space the optimiser measures colour differences in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimisationSpace {
    Ipt,
    #[default]
    Oklab,
}

impl OptimisationSpace {
    pub fn from_xyz(&self, xyz: &Vector3<f64>) -> Vector3<f64> {
        match self {
            OptimisationSpace::Ipt => xyz_to_ipt(xyz),
            OptimisationSpace::Oklab => xyz_to_oklab(xyz),
        }
    }
}

impl FromStr for OptimisationSpace {
    type Err = IdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ipt" => Ok(OptimisationSpace::Ipt),
            "oklab" => Ok(OptimisationSpace::Oklab),
            other => Err(IdtError::InvalidConfig(format!(
                "unknown optimisation space {other:?}"
            ))),
        }
    }
}

impl fmt::Display for OptimisationSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimisationSpace::Ipt => f.write_str("IPT"),
            OptimisationSpace::Oklab => f.write_str("Oklab"),
        }
    }
}
