//! Reference colour-checker data.
//!
//! Patch colorimetry is stored as CIE xyY under the dataset illuminant. It is
//! relit under the scene illuminant with a Bradford transform, then converted
//! to ACES2065-1 relative exposure values through a chromatic adaptation to
//! the ACES white point.

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;

use crate::idt_pipeline::colour::adaptation::{ChromaticAdaptation, adaptation_matrix};
use crate::idt_pipeline::colour::illuminant::Illuminant;
use crate::idt_pipeline::colour::spaces::{
    ACES_WHITE_XY, D50_XY, aces_xyz_to_rgb, xy_to_xyz, xyy_to_xyz,
};
use crate::idt_pipeline::common::error::{IdtError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePatch {
    pub name: &'static str,
    pub xyy: [f64; 3],
}

const fn patch(name: &'static str, x: f64, y: f64, big_y: f64) -> ReferencePatch {
    ReferencePatch {
        name,
        xyy: [x, y, big_y],
    }
}

const COLORCHECKER_24: [ReferencePatch; 24] = [
    patch("dark skin", 0.4316, 0.3777, 0.1008),
    patch("light skin", 0.4197, 0.3744, 0.3495),
    patch("blue sky", 0.2760, 0.3016, 0.1836),
    patch("foliage", 0.3703, 0.4499, 0.1325),
    patch("blue flower", 0.2999, 0.2856, 0.2304),
    patch("bluish green", 0.2848, 0.3911, 0.4178),
    patch("orange", 0.5295, 0.4055, 0.3118),
    patch("purplish blue", 0.2305, 0.2106, 0.1126),
    patch("moderate red", 0.5012, 0.3273, 0.1938),
    patch("purple", 0.3319, 0.2482, 0.0637),
    patch("yellow green", 0.3984, 0.5008, 0.4446),
    patch("orange yellow", 0.4957, 0.4427, 0.4357),
    patch("blue", 0.2018, 0.1692, 0.0575),
    patch("green", 0.3253, 0.5032, 0.2318),
    patch("red", 0.5686, 0.3303, 0.1257),
    patch("yellow", 0.4697, 0.4734, 0.5981),
    patch("magenta", 0.4159, 0.2688, 0.2009),
    patch("cyan", 0.2131, 0.3023, 0.1930),
    patch("white 9.5 (.05 D)", 0.3469, 0.3608, 0.9131),
    patch("neutral 8 (.23 D)", 0.3440, 0.3584, 0.5894),
    patch("neutral 6.5 (.44 D)", 0.3432, 0.3581, 0.3632),
    patch("neutral 5 (.70 D)", 0.3446, 0.3579, 0.1915),
    patch("neutral 3.5 (1.05 D)", 0.3401, 0.3548, 0.0883),
    patch("black 2 (1.5 D)", 0.3406, 0.3537, 0.0311),
];

/// Identifier of a bundled reference colour checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceColourCheckerId {
    #[default]
    ColorChecker24,
}

impl FromStr for ReferenceColourCheckerId {
    type Err = IdtError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // "ColorChecker24 - After November 2014" style names carry a revision suffix.
        let head = s.split(" - ").next().unwrap_or(s).trim();
        match head.to_ascii_lowercase().as_str() {
            "colorchecker24" | "colorchecker classic" | "colorchecker 24" => {
                Ok(ReferenceColourCheckerId::ColorChecker24)
            }
            _ => Err(IdtError::InvalidConfig(format!(
                "unknown reference colour checker {s:?}"
            ))),
        }
    }
}

impl fmt::Display for ReferenceColourCheckerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceColourCheckerId::ColorChecker24 => f.write_str("ColorChecker24"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceColourChecker {
    pub id: ReferenceColourCheckerId,
    /// Chromaticity of the illuminant the patch data is relative to.
    pub illuminant_xy: [f64; 2],
    /// Illuminant the chart was shot under.
    pub scene_illuminant: Illuminant,
    pub patches: &'static [ReferencePatch],
    /// Range of the grey-scale row in `patches`.
    pub neutrals: std::ops::Range<usize>,
    /// Index of the mid-grey patch used when no grey card was shot.
    pub mid_grey: usize,
}

impl ReferenceColourChecker {
    pub fn load(id: ReferenceColourCheckerId) -> Self {
        match id {
            ReferenceColourCheckerId::ColorChecker24 => Self {
                id,
                illuminant_xy: D50_XY,
                scene_illuminant: Illuminant::default(),
                patches: &COLORCHECKER_24,
                neutrals: 18..24,
                mid_grey: 21,
            },
        }
    }

    pub fn with_illuminant(mut self, illuminant: Illuminant) -> Self {
        self.scene_illuminant = illuminant;
        self
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn patch_index(&self, name: &str) -> Option<usize> {
        self.patches.iter().position(|p| p.name == name)
    }

    /// Patch XYZ under the scene illuminant, adapted to the ACES white point.
    pub fn to_aces_xyz(&self, cat: ChromaticAdaptation) -> Result<Vec<Vector3<f64>>> {
        let scene_white = xy_to_xyz(self.scene_illuminant.xy());
        let relight = adaptation_matrix(
            ChromaticAdaptation::Bradford,
            &xy_to_xyz(self.illuminant_xy),
            &scene_white,
        )?;
        let adapt = adaptation_matrix(cat, &scene_white, &xy_to_xyz(ACES_WHITE_XY))?;

        let to_aces = adapt * relight;
        Ok(self
            .patches
            .iter()
            .map(|p| to_aces * xyy_to_xyz(p.xyy))
            .collect())
    }

    /// Patch ACES2065-1 relative exposure values.
    pub fn to_aces_rgb(&self, cat: ChromaticAdaptation) -> Result<Vec<Vector3<f64>>> {
        let xyz_to_rgb = aces_xyz_to_rgb();
        Ok(self
            .to_aces_xyz(cat)?
            .iter()
            .map(|xyz| xyz_to_rgb * xyz)
            .collect())
    }
}
