use crate::idt_pipeline::config::DecodingMethod;
use crate::idt_pipeline::lut::Lut3x1D;

/// The camera's decoding LUT, reduced for its decoding method.
///
/// Methods other than `PerChannel` carry the same curve on all three
/// channels.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodingLut {
    pub camera_model: String,
    pub method: DecodingMethod,
    pub lut: Lut3x1D,
}

impl DecodingLut {
    pub fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        self.lut.apply_rgb(rgb)
    }

    pub fn size(&self) -> usize {
        self.lut.size()
    }
}

/// Scene-linear samples handed to the optimiser.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSamples {
    /// One EV-normalised RGB triple per checker patch
    pub checker: Vec<[f64; 3]>,
    pub grey: [f64; 3],
    /// Exposures that contributed to `checker`, in stops
    pub exposures: Vec<f64>,
    /// Whether `grey` came from the checker's mid-grey patch
    pub grey_from_checker: bool,
}
