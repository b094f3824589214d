use gabor_core::Aperture;
use std::f32::consts::SQRT_2;
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Circular window with a gaussian-blurred edge, centered on a square
/// stimulus. Coverage is 1 well inside `radius`, 0.5 on it and falls to 0
/// a few `blur` widths outside.
#[derive(Debug, Clone)]
pub struct ApertureMask {
    size: u32,
    radius: f32,
    blur: f32,
    alpha: Vec<u8>,
}

impl ApertureMask {
    /// `None` falls back to `size / 4` for the radius and `size / 8` for the
    /// blur, so the defaults follow whatever size is actually rendered.
    pub fn new(size: u32, radius: Option<f32>, blur: Option<f32>) -> Self {
        let defaults = Aperture::default_for(size);
        let radius = radius.unwrap_or(defaults.radius).max(0.0);
        let blur = blur.unwrap_or(defaults.blur).max(0.0);

        let c = size as f32 / 2.0;
        let mut alpha = Vec::with_capacity(size as usize * size as usize);
        for y in 0..size {
            for x in 0..size {
                let d = (x as f32 + 0.5 - c).hypot(y as f32 + 0.5 - c);
                alpha.push((edge_coverage(d, radius, blur) * 255.0).round() as u8);
            }
        }

        Self {
            size,
            radius,
            blur,
            alpha,
        }
    }

    /// Negative values mean "unset".
    pub fn from_sentinel(size: u32, radius: f32, blur: f32) -> Self {
        let set = |v: f32| (v >= 0.0).then_some(v);
        Self::new(size, set(radius), set(blur))
    }

    pub fn from_config(size: u32, aperture: &Aperture) -> Self {
        Self::from_sentinel(size, aperture.radius, aperture.blur)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn blur(&self) -> f32 {
        self.blur
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.alpha
            .get(y as usize * self.size as usize + x as usize)
            .copied()
    }

    /// Multiplies every premultiplied pixel by the mask. The pixmap must be
    /// `size x size`; extra pixels are left alone.
    pub fn apply(&self, pixmap: &mut Pixmap) {
        if pixmap.width() != self.size || pixmap.height() != self.size {
            return;
        }
        for (px, &a) in pixmap.pixels_mut().iter_mut().zip(&self.alpha) {
            if a == 255 {
                continue;
            }
            let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
            *px = PremultipliedColorU8::from_rgba(
                scale(px.red()),
                scale(px.green()),
                scale(px.blue()),
                scale(px.alpha()),
            )
            .unwrap_or(PremultipliedColorU8::TRANSPARENT);
        }
    }
}

/// Coverage at distance `d` from the center of a disc of `radius` blurred
/// by a gaussian with standard deviation `sigma`.
pub fn edge_coverage(d: f32, radius: f32, sigma: f32) -> f32 {
    if sigma <= 0.0 {
        return if d <= radius { 1.0 } else { 0.0 };
    }
    let erfc = 1.0 - libm::erff((d - radius) / (sigma * SQRT_2));
    (0.5 * erfc).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    #[test]
    fn defaults_follow_rendered_size() {
        let mask = ApertureMask::new(400, None, None);
        assert_eq!(mask.radius(), 100.0);
        assert_eq!(mask.blur(), 50.0);

        let mask = ApertureMask::from_sentinel(320, -1.0, 4.0);
        assert_eq!(mask.radius(), 80.0);
        assert_eq!(mask.blur(), 4.0);
    }

    #[test]
    fn coverage_profile() {
        assert_eq!(edge_coverage(10.0, 20.0, 0.0), 1.0);
        assert_eq!(edge_coverage(20.5, 20.0, 0.0), 0.0);
        assert!((edge_coverage(50.0, 50.0, 25.0) - 0.5).abs() < 1e-6);
        assert!(edge_coverage(0.0, 50.0, 5.0) > 0.999);
        assert!(edge_coverage(80.0, 50.0, 5.0) < 0.001);
    }

    #[test]
    fn soft_edge_falls_off_outward() {
        let mask = ApertureMask::new(200, Some(50.0), Some(10.0));
        let ray: Vec<u8> = (100..200).map(|x| mask.alpha_at(x, 100).unwrap()).collect();
        assert_eq!(ray[0], 255);
        assert!(ray.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(*ray.last().unwrap(), 0);
        assert_eq!(mask.alpha_at(0, 0), Some(0));
        assert_eq!(mask.alpha_at(200, 0), None);
    }

    #[test]
    fn zero_blur_is_a_hard_disc() {
        let mask = ApertureMask::new(100, Some(20.0), Some(0.0));
        assert_eq!(mask.alpha_at(50, 50), Some(255));
        assert_eq!(mask.alpha_at(50, 69), Some(255));
        assert_eq!(mask.alpha_at(50, 71), Some(0));
    }

    #[test]
    fn apply_keeps_premultiplied_invariant() {
        let mut pixmap = Pixmap::new(64, 64).unwrap();
        pixmap.fill(Color::from_rgba8(200, 120, 40, 255));
        let mask = ApertureMask::new(64, None, None);
        mask.apply(&mut pixmap);

        let center = pixmap.pixel(32, 32).unwrap();
        let corner = pixmap.pixel(0, 0).unwrap();
        assert!(center.alpha() > 200);
        assert!(corner.alpha() < center.alpha());
        for p in pixmap.pixels() {
            assert!(p.red() <= p.alpha() && p.green() <= p.alpha() && p.blue() <= p.alpha());
        }
    }
}
