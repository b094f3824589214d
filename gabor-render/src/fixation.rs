use gabor_core::{CssColor, FixationCross};
use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};

/// Two perpendicular bars of length `size` and thickness `weight`, centered
/// on a `stimulus_size` square.
#[derive(Debug, Clone, PartialEq)]
pub struct FixationMarker {
    center: f32,
    size: f32,
    weight: f32,
    color: [u8; 4],
}

impl FixationMarker {
    pub fn new(stimulus_size: u32, size: f32, weight: f32, color: &CssColor) -> Self {
        Self {
            center: stimulus_size as f32 / 2.0,
            size,
            weight,
            color: color.rgba(),
        }
    }

    /// `None` when the cross is switched off.
    pub fn from_config(stimulus_size: u32, cross: &FixationCross) -> Option<Self> {
        cross
            .display
            .then(|| Self::new(stimulus_size, cross.size, cross.weight, &cross.color))
    }

    /// Horizontal bar first, then vertical. `None` for a degenerate cross.
    pub fn segments(&self) -> Option<[Rect; 2]> {
        let half_len = self.size / 2.0;
        let half_w = self.weight / 2.0;
        let horizontal = Rect::from_xywh(
            self.center - half_len,
            self.center - half_w,
            self.size,
            self.weight,
        )?;
        let vertical = Rect::from_xywh(
            self.center - half_w,
            self.center - half_len,
            self.weight,
            self.size,
        )?;
        Some([horizontal, vertical])
    }

    pub fn draw(&self, pixmap: &mut Pixmap) {
        let Some(segments) = self.segments() else {
            return;
        };
        let [r, g, b, a] = self.color;
        let mut paint = Paint::default();
        paint.anti_alias = false;
        paint.set_color(Color::from_rgba8(r, g, b, a));
        for rect in segments {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
}
