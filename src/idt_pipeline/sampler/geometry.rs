use crate::idt_pipeline::common::error::{IdtError, Result};

/// Axis-aligned region in normalised image coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PatchRegion {
    pub const FULL_FRAME: PatchRegion = PatchRegion {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region of the same centre scaled by `fraction` on both axes.
    pub fn shrink(&self, fraction: f64) -> Self {
        let width = self.width * fraction;
        let height = self.height * fraction;
        Self {
            x: self.x + (self.width - width) / 2.0,
            y: self.y + (self.height - height) / 2.0,
            width,
            height,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.x, self.y, self.width, self.height];
        let inside = values.iter().all(|v| v.is_finite())
            && self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.0 + 1e-9
            && self.y + self.height <= 1.0 + 1e-9;
        if inside {
            Ok(())
        } else {
            Err(IdtError::InvalidConfig(format!(
                "patch region {self:?} is not inside the unit frame"
            )))
        }
    }

    /// Pixel bounds `(x0, y0, x1, y1)`, end-exclusive, clipped to the image.
    pub fn pixel_bounds(&self, width: usize, height: usize) -> (usize, usize, usize, usize) {
        let floor = |v: f64, extent: usize| ((v * extent as f64).floor().max(0.0) as usize).min(extent);
        let ceil = |v: f64, extent: usize| ((v * extent as f64).ceil().max(0.0) as usize).min(extent);
        let x0 = floor(self.x, width);
        let y0 = floor(self.y, height);
        let x1 = ceil(self.x + self.width, width).max(x0);
        let y1 = ceil(self.y + self.height, height).max(y0);
        (x0, y0, x1, y1)
    }
}

/// Where the checker patches and the grey card sit in the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    /// One region per reference patch, in reference order
    pub patches: Vec<PatchRegion>,
    /// Region sampled in the grey-card photographs
    pub grey_card: PatchRegion,
}

impl ChartGeometry {
    /// Regular `rows` × `cols` chart inside `bounds`, patches read row-major,
    /// each sampled over the central `swatch_fraction` of its cell.
    pub fn grid(rows: usize, cols: usize, bounds: PatchRegion, swatch_fraction: f64) -> Self {
        let cell_width = bounds.width / cols as f64;
        let cell_height = bounds.height / rows as f64;
        let patches = (0..rows)
            .flat_map(|row| {
                (0..cols).map(move |col| {
                    PatchRegion::new(
                        bounds.x + col as f64 * cell_width,
                        bounds.y + row as f64 * cell_height,
                        cell_width,
                        cell_height,
                    )
                    .shrink(swatch_fraction)
                })
            })
            .collect();
        Self {
            patches,
            grey_card: PatchRegion::FULL_FRAME.shrink(0.5),
        }
    }

    /// Classic 24 patch checker filling the frame.
    pub fn colour_checker_classic() -> Self {
        Self::grid(4, 6, PatchRegion::FULL_FRAME, 0.5)
    }

    pub fn with_grey_card(mut self, region: PatchRegion) -> Self {
        self.grey_card = region;
        self
    }

    pub fn validate(&self, expected_patches: usize) -> Result<()> {
        if self.patches.len() != expected_patches {
            return Err(IdtError::InvalidConfig(format!(
                "chart geometry has {} patches, reference colour checker has {}",
                self.patches.len(),
                expected_patches
            )));
        }
        for region in &self.patches {
            region.validate()?;
        }
        self.grey_card.validate()
    }
}

impl Default for ChartGeometry {
    fn default() -> Self {
        Self::colour_checker_classic()
    }
}
