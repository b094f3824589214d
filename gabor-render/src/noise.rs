use crate::RenderError;
use rand::Rng;
use std::sync::Arc;
use tiny_skia::{ColorU8, Pixmap};

/// Opaque greyscale frame where every pixel is `floor(U[0,1) * 255)`.
pub fn generate_noise_frame<R: Rng>(size: u32, rng: &mut R) -> Result<Pixmap, RenderError> {
    let mut pixmap = Pixmap::new(size, size).ok_or(RenderError::Surface {
        width: size,
        height: size,
    })?;
    for px in pixmap.pixels_mut() {
        let l = (rng.random::<f32>() * 255.0) as u8;
        *px = ColorU8::from_rgba(l, l, l, 255).premultiply();
    }
    Ok(pixmap)
}

pub fn generate_noise_frames<R: Rng>(
    size: u32,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Arc<Pixmap>>, RenderError> {
    (0..count)
        .map(|_| generate_noise_frame(size, &mut *rng).map(Arc::new))
        .collect()
}
