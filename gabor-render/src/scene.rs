use crate::{
    ApertureMask, BackgroundCompositor, FixationMarker, Grating, RenderError,
    generate_noise_frames,
};
use gabor_cache::AssetSource;
use gabor_core::{Background, BlendMode, StimulusConfig};
use gabor_timing::StopFlag;
use rand::Rng;
use std::sync::Arc;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, Transform};
use tracing::info;

/// Everything about a stimulus that is expensive to build: the masked
/// grating raster, the fixation geometry and any noise frames. Built once
/// off the trial path and reused for as many trials as share the config.
#[derive(Debug, Clone)]
pub struct PreparedStimulus {
    config: StimulusConfig,
    grating: Arc<Pixmap>,
    fixation: Option<FixationMarker>,
    noise_frames: Vec<Arc<Pixmap>>,
}

impl PreparedStimulus {
    pub fn prepare<R: Rng>(config: StimulusConfig, rng: &mut R) -> Result<Self, RenderError> {
        let s = &config.stimulus;
        let mut grating = Grating::new(s.size, s.density, s.phase_offset).render()?;
        ApertureMask::from_config(s.size, &config.aperture).apply(&mut grating);

        let fixation = FixationMarker::from_config(s.size, &config.fixation_cross);
        let noise_frames = match &config.background {
            Background::Noise { frame_count, .. } => {
                generate_noise_frames(s.size, *frame_count, rng)?
            }
            _ => Vec::new(),
        };

        info!(
            size = s.size,
            background = config.background.tag(),
            noise_frames = noise_frames.len(),
            fixation = fixation.is_some(),
            "stimulus prepared"
        );

        Ok(Self {
            config,
            grating: Arc::new(grating),
            fixation,
            noise_frames,
        })
    }

    pub fn config(&self) -> &StimulusConfig {
        &self.config
    }

    pub fn size(&self) -> u32 {
        self.config.stimulus.size
    }

    /// Masked grating before opacity, rotation and blending.
    pub fn grating(&self) -> &Pixmap {
        &self.grating
    }

    pub fn noise_frames(&self) -> &[Arc<Pixmap>] {
        &self.noise_frames
    }

    /// Assembles a fresh scene off-surface. Cycling backgrounds start their
    /// pacer here.
    pub fn build_scene(&self) -> Result<Scene, RenderError> {
        Scene::new(self)
    }
}

/// The composed stimulus: background, grating and fixation cross layered
/// into one square surface that the host presents as a unit.
#[derive(Debug)]
pub struct Scene {
    background: BackgroundCompositor,
    grating: Arc<Pixmap>,
    grating_paint: PixmapPaint,
    grating_transform: Transform,
    fixation: Option<FixationMarker>,
    visible: bool,
    surface: Pixmap,
}

impl Scene {
    fn new(prepared: &PreparedStimulus) -> Result<Self, RenderError> {
        let size = prepared.size();
        let s = &prepared.config.stimulus;
        let background =
            BackgroundCompositor::set_up(&prepared.config.background, size, &prepared.noise_frames)?;
        let surface = Pixmap::new(size, size).ok_or(RenderError::Surface {
            width: size,
            height: size,
        })?;
        let center = size as f32 / 2.0;

        let mut scene = Self {
            background,
            grating: Arc::clone(&prepared.grating),
            grating_paint: PixmapPaint {
                opacity: s.effective_alpha(),
                blend_mode: to_skia_blend(s.blend_mode),
                quality: FilterQuality::Bilinear,
            },
            grating_transform: Transform::from_rotate_at(s.rotation, center, center),
            fixation: prepared.fixation.clone(),
            visible: true,
            surface,
        };
        scene.compose();
        Ok(scene)
    }

    pub fn surface(&self) -> &Pixmap {
        &self.surface
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hidden scenes are fully transparent, background included.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.compose();
        }
    }

    pub fn background(&self) -> &BackgroundCompositor {
        &self.background
    }

    pub fn background_stop_flag(&self) -> Option<StopFlag> {
        self.background.stop_flag()
    }

    pub fn stop_background(&mut self) {
        self.background.stop();
    }

    /// Advances the background. Returns whether the surface was recomposed.
    pub fn on_refresh<R: Rng>(
        &mut self,
        timestamp_ms: f64,
        assets: &dyn AssetSource,
        rng: &mut R,
    ) -> bool {
        if self.background.on_refresh(timestamp_ms, assets, rng) && self.visible {
            self.compose();
            return true;
        }
        false
    }

    /// Redraws the surface from its layers.
    pub fn compose(&mut self) {
        self.surface.fill(Color::TRANSPARENT);
        if !self.visible {
            return;
        }
        self.surface.draw_pixmap(
            0,
            0,
            self.background.surface().as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        if self.grating_paint.opacity > 0.0 {
            let grating: &Pixmap = &self.grating;
            self.surface.draw_pixmap(
                0,
                0,
                grating.as_ref(),
                &self.grating_paint,
                self.grating_transform,
                None,
            );
        }
        if let Some(fixation) = &self.fixation {
            fixation.draw(&mut self.surface);
        }
    }
}

pub fn to_skia_blend(mode: BlendMode) -> tiny_skia::BlendMode {
    use tiny_skia::BlendMode as Skia;
    match mode {
        BlendMode::Normal => Skia::SourceOver,
        BlendMode::Multiply => Skia::Multiply,
        BlendMode::Screen => Skia::Screen,
        BlendMode::Overlay => Skia::Overlay,
        BlendMode::Darken => Skia::Darken,
        BlendMode::Lighten => Skia::Lighten,
        BlendMode::ColorDodge => Skia::ColorDodge,
        BlendMode::ColorBurn => Skia::ColorBurn,
        BlendMode::HardLight => Skia::HardLight,
        BlendMode::SoftLight => Skia::SoftLight,
        BlendMode::Difference => Skia::Difference,
        BlendMode::Exclusion => Skia::Exclusion,
        BlendMode::Hue => Skia::Hue,
        BlendMode::Saturation => Skia::Saturation,
        BlendMode::Color => Skia::Color,
        BlendMode::Luminosity => Skia::Luminosity,
    }
}
