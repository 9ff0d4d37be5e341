//! Chromatic adaptation transforms (CAT).

use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix3, Vector3};
use palette::chromatic_adaptation::{Method, TransformMatrix};

use crate::idt_pipeline::colour::spaces::matrix;
use crate::idt_pipeline::common::error::{IdtError, Result};

const CAT02: [[f64; 3]; 3] = [
    [0.7328, 0.4296, -0.1624],
    [-0.7036, 1.6975, 0.0061],
    [0.0030, 0.0136, 0.9834],
];

const CAT16: [[f64; 3]; 3] = [
    [0.401288, 0.650173, -0.051461],
    [-0.250268, 1.204414, 0.045854],
    [-0.002079, 0.048952, 0.953127],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChromaticAdaptation {
    Bradford,
    #[default]
    Cat02,
    VonKries,
    Cat16,
    XyzScaling,
}

impl ChromaticAdaptation {
    /// Cone response matrix of the transform.
    pub fn cone_response(&self) -> Matrix3<f64> {
        let method = match self {
            ChromaticAdaptation::Cat02 => return matrix(&CAT02),
            ChromaticAdaptation::Cat16 => return matrix(&CAT16),
            ChromaticAdaptation::Bradford => Method::Bradford,
            ChromaticAdaptation::VonKries => Method::VonKries,
            ChromaticAdaptation::XyzScaling => Method::XyzScaling,
        };
        let cone = <Method as TransformMatrix<f64>>::get_cone_response(&method);
        Matrix3::from_row_slice(&cone.ma)
    }
}

/// Von Kries style adaptation matrix mapping XYZ under `src_white` to XYZ
/// under `dst_white`.
pub fn adaptation_matrix(
    method: ChromaticAdaptation,
    src_white: &Vector3<f64>,
    dst_white: &Vector3<f64>,
) -> Result<Matrix3<f64>> {
    let cone = method.cone_response();
    let cone_inv = cone.try_inverse().ok_or_else(|| {
        IdtError::InvalidConfig(format!("{method} cone response is singular"))
    })?;

    let src = cone * src_white;
    if src.iter().any(|c| c.abs() < f64::EPSILON) {
        return Err(IdtError::InvalidConfig(format!(
            "source white {src_white:?} has no {method} cone response"
        )));
    }
    let dst = cone * dst_white;
    let scale = Matrix3::from_diagonal(&dst.component_div(&src));

    Ok(cone_inv * scale * cone)
}

impl FromStr for ChromaticAdaptation {
    type Err = IdtError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalised: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalised.as_str() {
            "bradford" => Ok(ChromaticAdaptation::Bradford),
            "cat02" => Ok(ChromaticAdaptation::Cat02),
            "vonkries" => Ok(ChromaticAdaptation::VonKries),
            "cat16" => Ok(ChromaticAdaptation::Cat16),
            "xyzscaling" => Ok(ChromaticAdaptation::XyzScaling),
            _ => Err(IdtError::InvalidConfig(format!(
                "unknown chromatic adaptation transform {s:?}"
            ))),
        }
    }
}

impl fmt::Display for ChromaticAdaptation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChromaticAdaptation::Bradford => "Bradford",
            ChromaticAdaptation::Cat02 => "CAT02",
            ChromaticAdaptation::VonKries => "Von Kries",
            ChromaticAdaptation::Cat16 => "CAT16",
            ChromaticAdaptation::XyzScaling => "XYZ Scaling",
        };
        f.write_str(name)
    }
}
