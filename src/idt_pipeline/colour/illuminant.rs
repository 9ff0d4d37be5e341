//! Illuminants the reference chart can be evaluated under.

use std::fmt;
use std::str::FromStr;

use crate::idt_pipeline::colour::spaces::{ACES_WHITE_XY, D50_XY};
use crate::idt_pipeline::common::error::IdtError;

/// Scene illuminant of the characterisation captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Illuminant {
    A,
    #[default]
    D50,
    D55,
    D65,
    D75,
    E,
    Aces,
}

impl Illuminant {
    /// CIE 1931 2° chromaticity.
    pub fn xy(&self) -> [f64; 2] {
        match self {
            Illuminant::A => [0.44757, 0.40745],
            Illuminant::D50 => D50_XY,
            Illuminant::D55 => [0.33242, 0.34743],
            Illuminant::D65 => [0.31271, 0.32902],
            Illuminant::D75 => [0.29902, 0.31485],
            Illuminant::E => [1.0 / 3.0, 1.0 / 3.0],
            Illuminant::Aces => ACES_WHITE_XY,
        }
    }
}

impl FromStr for Illuminant {
    type Err = IdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Illuminant::A),
            "d50" => Ok(Illuminant::D50),
            "d55" => Ok(Illuminant::D55),
            "d65" => Ok(Illuminant::D65),
            "d75" => Ok(Illuminant::D75),
            "e" => Ok(Illuminant::E),
            "aces" | "d60" => Ok(Illuminant::Aces),
            other => Err(IdtError::InvalidConfig(format!("unknown illuminant {other:?}"))),
        }
    }
}

impl fmt::Display for Illuminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Illuminant::A => "A",
            Illuminant::D50 => "D50",
            Illuminant::D55 => "D55",
            Illuminant::D65 => "D65",
            Illuminant::D75 => "D75",
            Illuminant::E => "E",
            Illuminant::Aces => "ACES",
        };
        f.write_str(name)
    }
}
