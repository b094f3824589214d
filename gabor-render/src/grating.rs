use crate::RenderError;
use tiny_skia::{ColorU8, Pixmap};

/// Number of flat bands the trial path uses, one per gradient stop.
pub const GRADIENT_BANDS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Split the height into this many equal bands.
    Bands(u32),
    /// One band per pixel row.
    PerRow,
}

/// Horizontal sinusoidal luminance grating over a `size x size` square.
/// Rotation, opacity and blend mode are applied when the grating is
/// composited, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grating {
    pub size: u32,
    pub density: f32,
    /// Degrees.
    pub phase_offset: f32,
    pub resolution: Resolution,
    /// Shift by 90 degrees so the first band is at full brightness.
    pub start_at_peak: bool,
}

impl Grating {
    pub fn new(size: u32, density: f32, phase_offset: f32) -> Self {
        Self {
            size,
            density,
            phase_offset,
            resolution: Resolution::Bands(GRADIENT_BANDS),
            start_at_peak: false,
        }
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn starting_at_peak(mut self, start_at_peak: bool) -> Self {
        self.start_at_peak = start_at_peak;
        self
    }

    pub fn band_count(&self) -> u32 {
        match self.resolution {
            Resolution::Bands(n) => n.max(1),
            Resolution::PerRow => self.size.max(1),
        }
    }

    /// Angular position of a 1-indexed band, in degrees.
    pub fn theta(&self, band: u32) -> f64 {
        360.0 / self.band_count() as f64 * band as f64
    }

    /// 1-indexed band covering pixel row `y`.
    pub fn band_of_row(&self, y: u32) -> u32 {
        if self.size == 0 {
            return 1;
        }
        let n = self.band_count() as u64;
        ((y as u64 * n / self.size as u64) as u32 + 1).min(n as u32)
    }

    pub fn band_luminance(&self, band: u32) -> u8 {
        let shift = if self.start_at_peak { 90.0 } else { 0.0 };
        luminance(
            self.theta(band),
            self.density as f64,
            self.phase_offset as f64 + shift,
        )
    }

    /// Luminance of every pixel row, top to bottom.
    pub fn profile(&self) -> Vec<u8> {
        (0..self.size)
            .map(|y| self.band_luminance(self.band_of_row(y)))
            .collect()
    }

    /// Opaque greyscale raster of the grating.
    pub fn render(&self) -> Result<Pixmap, RenderError> {
        let mut pixmap = Pixmap::new(self.size, self.size).ok_or(RenderError::Surface {
            width: self.size,
            height: self.size,
        })?;
        let width = self.size as usize;
        let rows = pixmap.pixels_mut().chunks_exact_mut(width);
        for (row, l) in rows.zip(self.profile()) {
            row.fill(ColorU8::from_rgba(l, l, l, 255).premultiply());
        }
        Ok(pixmap)
    }
}

/// `round((sin(theta * density + phase) + 1) / 2 * 255)`, angles in degrees.
pub fn luminance(theta_deg: f64, density: f64, phase_deg: f64) -> u8 {
    let s = (theta_deg * density + phase_deg).to_radians().sin();
    (((s + 1.0) / 2.0) * 255.0).round().clamp(0.0, 255.0) as u8
}
