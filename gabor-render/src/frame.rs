use bytemuck::{cast_slice, cast_slice_mut};
use gabor_timing::{HighPrecisionTimer, Timer};
use std::time::Duration;
use tiny_skia::Pixmap;

pub struct FrameStats {
    pub clear: Duration,
    pub copy: Duration,
    pub total: Duration,
}

/// Copies a composed scene into the window's RGBA frame buffer, centered on
/// an opaque black screen.
pub struct FrameCompositor {
    width: u32,
    height: u32,
    clear_buffer: Vec<u8>,
    timer: HighPrecisionTimer,
}

impl FrameCompositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            clear_buffer: black(width, height),
            timer: HighPrecisionTimer::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.clear_buffer = black(width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn clear(&self, frame: &mut [u8]) {
        let n = frame.len().min(self.clear_buffer.len());
        frame[..n].copy_from_slice(&self.clear_buffer[..n]);
    }

    pub fn present(&mut self, scene: &Pixmap, frame: &mut [u8]) -> FrameStats {
        let t0 = self.timer.now_ms();
        self.clear(frame);
        let clear = self.timer.elapsed_since(t0);

        let t1 = self.timer.now_ms();
        self.blit_centered(scene, frame);
        let copy = self.timer.elapsed_since(t1);

        FrameStats {
            clear,
            copy,
            total: clear + copy,
        }
    }

    fn blit_centered(&self, pm: &Pixmap, frame: &mut [u8]) {
        let (cw, ch) = (self.width as i64, self.height as i64);
        let (w, h) = (pm.width() as i64, pm.height() as i64);
        let x0 = (cw - w) / 2;
        let y0 = (ch - h) / 2;

        // Clip against the frame on every side.
        let src_x_offset = (-x0).max(0);
        let src_y_offset = (-y0).max(0);
        let dst_x = x0.max(0);
        let dst_y = y0.max(0);
        let copy_w = (w - src_x_offset).min(cw - dst_x);
        let copy_h = (h - src_y_offset).min(ch - dst_y);
        if copy_w <= 0 || copy_h <= 0 || frame.len() < (cw * ch * 4) as usize {
            return;
        }
        let (copy_w, copy_h) = (copy_w as usize, copy_h as usize);
        let (src_x_offset, src_y_offset) = (src_x_offset as usize, src_y_offset as usize);
        let (dst_x, dst_y, cw, sw) = (dst_x as usize, dst_y as usize, cw as usize, w as usize);

        let src: &[[u8; 4]] = cast_slice(pm.data());
        let dst: &mut [[u8; 4]] = cast_slice_mut(&mut frame[..cw * ch as usize * 4]);

        for row in 0..copy_h {
            let src_row = (src_y_offset + row) * sw + src_x_offset;
            let dst_row = (dst_y + row) * cw + dst_x;
            let src_px = &src[src_row..src_row + copy_w];
            let dst_px = &mut dst[dst_row..dst_row + copy_w];

            if src_px.iter().all(|p| p[3] == 255) {
                dst_px.copy_from_slice(src_px);
                continue;
            }
            // Premultiplied source over the buffer.
            for (d, s) in dst_px.iter_mut().zip(src_px) {
                let inv = 255 - s[3] as u32;
                for c in 0..4 {
                    d[c] = (s[c] as u32 + (d[c] as u32 * inv + 127) / 255).min(255) as u8;
                }
            }
        }
    }
}

fn black(width: u32, height: u32) -> Vec<u8> {
    [0u8, 0, 0, 255]
        .into_iter()
        .cycle()
        .take(width as usize * height as usize * 4)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    #[test]
    fn scene_lands_in_the_middle() {
        let mut compositor = FrameCompositor::new(10, 10);
        let mut frame = vec![0u8; 10 * 10 * 4];
        let mut scene = Pixmap::new(4, 4).unwrap();
        scene.fill(Color::from_rgba8(255, 255, 255, 255));
        compositor.present(&scene, &mut frame);

        let px = |x: usize, y: usize| &frame[(y * 10 + x) * 4..(y * 10 + x) * 4 + 4];
        assert_eq!(px(3, 3), &[255, 255, 255, 255]);
        assert_eq!(px(6, 6), &[255, 255, 255, 255]);
        assert_eq!(px(2, 2), &[0, 0, 0, 255]);
        assert_eq!(px(7, 3), &[0, 0, 0, 255]);
    }

    #[test]
    fn transparent_scene_leaves_black() {
        let mut compositor = FrameCompositor::new(6, 6);
        let mut frame = vec![7u8; 6 * 6 * 4];
        compositor.present(&Pixmap::new(3, 3).unwrap(), &mut frame);
        assert!(frame.chunks(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn oversized_scene_is_clipped() {
        let mut compositor = FrameCompositor::new(4, 4);
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut scene = Pixmap::new(8, 8).unwrap();
        scene.fill(Color::from_rgba8(0, 255, 0, 255));
        compositor.present(&scene, &mut frame);
        assert!(frame.chunks(4).all(|p| p == [0, 255, 0, 255]));
    }
}
