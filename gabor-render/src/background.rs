use crate::RenderError;
use gabor_cache::{AssetSource, AssetState, intern_source};
use gabor_core::Background;
use gabor_timing::{FramePacer, StopFlag};
use rand::Rng;
use std::sync::Arc;
use tiny_skia::{
    Color, FilterQuality, Paint, Pattern, Pixmap, PixmapPaint, Rect, SpreadMode, Transform,
};
use tracing::{debug, info};

/// Random frame order that never shows the same index twice in a row.
#[derive(Debug, Clone, Default)]
pub struct FrameSelector {
    last: Option<usize>,
}

impl FrameSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws until the index differs from the previous one. A single frame
    /// is always index 0; no frames yields `None`.
    pub fn next<R: Rng>(&mut self, len: usize, rng: &mut R) -> Option<usize> {
        let index = match len {
            0 => return None,
            1 => 0,
            _ => loop {
                let i = rng.random_range(0..len);
                if Some(i) != self.last {
                    break i;
                }
            },
        };
        self.last = Some(index);
        Some(index)
    }

    pub fn last(&self) -> Option<usize> {
        self.last
    }
}

/// Frames of a cycling background.
#[derive(Debug, Clone)]
pub enum FrameSet {
    /// Interned image sources resolved through an [`AssetSource`].
    Sources(Vec<usize>),
    /// Frames already in memory, e.g. generated noise.
    Pixmaps(Vec<Arc<Pixmap>>),
}

impl FrameSet {
    pub fn len(&self) -> usize {
        match self {
            FrameSet::Sources(s) => s.len(),
            FrameSet::Pixmaps(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize, assets: &dyn AssetSource) -> Option<Arc<Pixmap>> {
        match self {
            FrameSet::Sources(ids) => ids
                .get(index)
                .and_then(|&id| assets.fetch(id).ready().cloned()),
            FrameSet::Pixmaps(p) => p.get(index).cloned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageProgress {
    Waiting,
    Drawn,
    Failed,
}

#[derive(Debug)]
struct Cycling {
    frames: FrameSet,
    pacer: FramePacer,
    selector: FrameSelector,
    wanted: Option<usize>,
    shown: Option<usize>,
}

#[derive(Debug)]
enum Layer {
    Solid,
    Image {
        source: String,
        id: usize,
        progress: ImageProgress,
    },
    Cycling(Cycling),
}

/// The layer behind the grating: a flat color, one static image, or frames
/// cycled by a [`FramePacer`].
#[derive(Debug)]
pub struct BackgroundCompositor {
    size: u32,
    layer: Layer,
    surface: Pixmap,
    halted: bool,
}

impl BackgroundCompositor {
    /// Cycling variants start their pacer here; the first refresh after
    /// setup shows the first frame. `noise_frames` is only read for the
    /// noise variant.
    pub fn set_up(
        background: &Background,
        size: u32,
        noise_frames: &[Arc<Pixmap>],
    ) -> Result<Self, RenderError> {
        let mut surface = Pixmap::new(size, size).ok_or(RenderError::Surface {
            width: size,
            height: size,
        })?;

        let layer = match background {
            Background::CssColor { color } => {
                let [r, g, b, a] = color.rgba();
                surface.fill(Color::from_rgba8(r, g, b, a));
                Layer::Solid
            }
            Background::Image { source } => Layer::Image {
                source: source.clone(),
                id: intern_source(source),
                progress: ImageProgress::Waiting,
            },
            Background::Animation { frames, fps } => {
                let ids = frames.iter().map(|f| intern_source(f)).collect();
                Layer::Cycling(Cycling::start(FrameSet::Sources(ids), *fps)?)
            }
            Background::Noise { fps, .. } => {
                Layer::Cycling(Cycling::start(FrameSet::Pixmaps(noise_frames.to_vec()), *fps)?)
            }
        };
        debug!(kind = background.tag(), size, "background set up");

        Ok(Self {
            size,
            layer,
            surface,
            halted: false,
        })
    }

    pub fn surface(&self) -> &Pixmap {
        &self.surface
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Stop switch of the pacer, if this background cycles frames.
    pub fn stop_flag(&self) -> Option<StopFlag> {
        match &self.layer {
            Layer::Cycling(c) => Some(c.pacer.stop_flag()),
            _ => None,
        }
    }

    pub fn is_animating(&self) -> bool {
        matches!(&self.layer, Layer::Cycling(c) if c.pacer.is_running()) && !self.halted
    }

    /// Index of the frame currently on the surface.
    pub fn current_frame(&self) -> Option<usize> {
        match &self.layer {
            Layer::Cycling(c) => c.shown,
            _ => None,
        }
    }

    /// Halts frame cycling and image polling. Idempotent.
    pub fn stop(&mut self) {
        self.halted = true;
        if let Layer::Cycling(c) = &self.layer {
            c.pacer.stop();
        }
    }

    /// Called once per display refresh. Returns whether the surface changed.
    pub fn on_refresh<R: Rng>(
        &mut self,
        timestamp_ms: f64,
        assets: &dyn AssetSource,
        rng: &mut R,
    ) -> bool {
        if self.halted {
            return false;
        }
        match &mut self.layer {
            Layer::Solid => false,
            Layer::Image {
                source,
                id,
                progress,
            } => {
                if *progress != ImageProgress::Waiting {
                    return false;
                }
                match assets.fetch(*id) {
                    AssetState::Pending => false,
                    AssetState::Ready(pixmap) => {
                        draw_tiled(&mut self.surface, &pixmap);
                        *progress = ImageProgress::Drawn;
                        true
                    }
                    AssetState::Failed => {
                        info!(source = %source, "background image unavailable, leaving it empty");
                        *progress = ImageProgress::Failed;
                        false
                    }
                }
            }
            Layer::Cycling(cycle) => {
                let Cycling {
                    frames,
                    pacer,
                    selector,
                    wanted,
                    shown,
                } = cycle;
                let len = frames.len();
                pacer.on_refresh(timestamp_ms, || *wanted = selector.next(len, rng));

                let Some(index) = *wanted else {
                    return false;
                };
                if *shown == Some(index) {
                    return false;
                }
                // A frame that is still loading keeps the previous one up.
                match frames.get(index, assets) {
                    Some(pixmap) => {
                        draw_scaled(&mut self.surface, &pixmap);
                        *shown = Some(index);
                        true
                    }
                    None => false,
                }
            }
        }
    }
}

impl Cycling {
    fn start(frames: FrameSet, fps: f32) -> Result<Self, RenderError> {
        if frames.is_empty() {
            return Err(RenderError::NoFrames);
        }
        Ok(Self {
            frames,
            pacer: FramePacer::start(fps as f64)?,
            selector: FrameSelector::new(),
            wanted: None,
            shown: None,
        })
    }
}

fn draw_scaled(surface: &mut Pixmap, frame: &Pixmap) {
    surface.fill(Color::TRANSPARENT);
    let sx = surface.width() as f32 / frame.width() as f32;
    let sy = surface.height() as f32 / frame.height() as f32;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    surface.draw_pixmap(0, 0, frame.as_ref(), &paint, Transform::from_scale(sx, sy), None);
}

fn draw_tiled(surface: &mut Pixmap, image: &Pixmap) {
    surface.fill(Color::TRANSPARENT);
    let Some(area) = Rect::from_xywh(0.0, 0.0, surface.width() as f32, surface.height() as f32)
    else {
        return;
    };
    let mut paint = Paint::default();
    paint.shader = Pattern::new(
        image.as_ref(),
        SpreadMode::Repeat,
        FilterQuality::Nearest,
        1.0,
        Transform::identity(),
    );
    surface.fill_rect(area, &paint, Transform::identity(), None);
}
