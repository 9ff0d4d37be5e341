//! Sample types produced by the sampler

/// Robust mean of one patch region.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Mean device-encoded RGB of the pixels that survived masking
    pub mean: [f64; 3],
    /// Per-pixel validity, `true` where the pixel contributed to `mean`
    pub mask: Vec<bool>,
}

impl RawSample {
    /// Sample with every pixel valid, for synthetic data.
    pub fn uniform(mean: [f64; 3], pixels: usize) -> Self {
        Self {
            mean,
            mask: vec![true; pixels],
        }
    }

    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|&&valid| valid).count()
    }

    pub fn total(&self) -> usize {
        self.mask.len()
    }
}

/// Per-patch samples of every image shot at one exposure.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSamples {
    /// Exposure key as provided upstream
    pub key: String,
    pub patches: Vec<RawSample>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerOutput {
    /// One entry per provided exposure key, in provided order
    pub captures: Vec<CaptureSamples>,
    /// Grey-card sample, absent when no grey-card images were supplied
    pub grey_card: Option<RawSample>,
}
