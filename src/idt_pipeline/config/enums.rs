//! Closed configuration variants.
//!
//! Every variant parses from the names used in project settings files;
//! parsing ignores case, spaces, dashes and underscores.

use std::fmt;
use std::str::FromStr;

use crate::idt_pipeline::common::error::IdtError;

fn normalise(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn unknown(kind: &str, value: &str) -> IdtError {
    IdtError::InvalidConfig(format!("unknown {kind} {value:?}"))
}

/// How the per-channel fitted LUT is reduced before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodingMethod {
    /// Element-wise median of the three channel curves.
    #[default]
    Median,
    /// Element-wise mean of the three channel curves.
    Average,
    /// Each channel decoded through its own curve.
    PerChannel,
    /// Curves combined with the ACES2065-1 luminance weights.
    Aces,
}

impl FromStr for DecodingMethod {
    type Err = IdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "median" => Ok(DecodingMethod::Median),
            "average" | "mean" => Ok(DecodingMethod::Average),
            "perchannel" => Ok(DecodingMethod::PerChannel),
            "aces" => Ok(DecodingMethod::Aces),
            _ => Err(unknown("decoding method", s)),
        }
    }
}

impl fmt::Display for DecodingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecodingMethod::Median => "Median",
            DecodingMethod::Average => "Average",
            DecodingMethod::PerChannel => "Per Channel",
            DecodingMethod::Aces => "ACES",
        };
        f.write_str(name)
    }
}

/// Interpolation between LUT entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolator {
    #[default]
    Linear,
    /// Monotone piecewise-cubic Hermite (PCHIP).
    Cubic,
}

impl FromStr for Interpolator {
    type Err = IdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "linear" => Ok(Interpolator::Linear),
            "cubic" | "pchip" | "cubicspline" => Ok(Interpolator::Cubic),
            _ => Err(unknown("interpolator", s)),
        }
    }
}

impl fmt::Display for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interpolator::Linear => f.write_str("Linear"),
            Interpolator::Cubic => f.write_str("Cubic"),
        }
    }
}

/// Treatment of values beyond the covered domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// Hold the edge value.
    Clamp,
    /// Continue with the edge slope.
    #[default]
    Linear,
}

impl FromStr for BoundaryPolicy {
    type Err = IdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "clamp" | "constant" => Ok(BoundaryPolicy::Clamp),
            "linear" | "extrapolate" => Ok(BoundaryPolicy::Linear),
            _ => Err(unknown("boundary policy", s)),
        }
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryPolicy::Clamp => f.write_str("Clamp"),
            BoundaryPolicy::Linear => f.write_str("Linear"),
        }
    }
}

/// Checker patches contributing pairs to the decoding curve fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LutPatchSelection {
    /// The grey-scale row only.
    #[default]
    Neutrals,
    AllPatches,
}

impl FromStr for LutPatchSelection {
    type Err = IdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "neutrals" | "greyscale" | "grayscale" => Ok(LutPatchSelection::Neutrals),
            "all" | "allpatches" => Ok(LutPatchSelection::AllPatches),
            _ => Err(unknown("LUT patch selection", s)),
        }
    }
}

/// Whether the closed-form white balance is refined with the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhiteBalanceRefinement {
    #[default]
    Fixed,
    Joint,
}

impl FromStr for WhiteBalanceRefinement {
    type Err = IdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "fixed" => Ok(WhiteBalanceRefinement::Fixed),
            "joint" => Ok(WhiteBalanceRefinement::Joint),
            _ => Err(unknown("white balance refinement", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoding_method_names() {
        assert_eq!("Per Channel".parse::<DecodingMethod>().unwrap(), DecodingMethod::PerChannel);
        assert_eq!("per_channel".parse::<DecodingMethod>().unwrap(), DecodingMethod::PerChannel);
        assert_eq!("ACES".parse::<DecodingMethod>().unwrap(), DecodingMethod::Aces);
        for method in [
            DecodingMethod::Median,
            DecodingMethod::Average,
            DecodingMethod::PerChannel,
            DecodingMethod::Aces,
        ] {
            assert_eq!(method.to_string().parse::<DecodingMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_unknown_names_are_config_errors() {
        assert!(matches!(
            "Spline".parse::<DecodingMethod>(),
            Err(IdtError::InvalidConfig(_))
        ));
        assert!("Sprague".parse::<Interpolator>().is_err());
        assert!("wrap".parse::<BoundaryPolicy>().is_err());
        assert!("some".parse::<LutPatchSelection>().is_err());
        assert!("free".parse::<WhiteBalanceRefinement>().is_err());
    }

    #[test]
    fn test_interpolator_aliases() {
        assert_eq!("PCHIP".parse::<Interpolator>().unwrap(), Interpolator::Cubic);
        assert_eq!("Cubic Spline".parse::<Interpolator>().unwrap(), Interpolator::Cubic);
    }
}
