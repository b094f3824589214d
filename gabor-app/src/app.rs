use crate::host::AppHost;
use crate::keys::key_name;
use anyhow::Result;
use gabor_cache::ImageCache;
use gabor_core::{Background, ProvidedConfig, TrialResult, resolve};
use gabor_render::{FrameCompositor, FrameStats, PreparedStimulus};
use gabor_timing::Timer;
use gabor_trial::{TrialController, TrialEvent, TrialHost};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    compositor: Option<FrameCompositor>,
    prepared: Option<PreparedStimulus>,
    trial: Option<TrialController<ThreadRng>>,
    host: AppHost,
    assets: ImageCache,
    refresh_rate: Option<f64>,
    last_refresh_ms: Option<f64>,
    outcome: Option<TrialResult>,
    should_exit: bool,
}

impl App {
    /// Resolves and prepares the stimulus up front, so configuration errors
    /// are reported before any window opens.
    pub fn new(provided: ProvidedConfig) -> Result<Self> {
        let config = resolve(&provided)?;
        let assets = ImageCache::new();
        match &config.background {
            Background::Image { source } => {
                assets.request(source);
            }
            Background::Animation { frames, .. } => {
                for frame in frames {
                    assets.request(frame);
                }
            }
            _ => {}
        }
        let prepared = PreparedStimulus::prepare(config, &mut rand::rng())?;

        Ok(Self {
            window: None,
            pixels: None,
            compositor: None,
            prepared: Some(prepared),
            trial: None,
            host: AppHost::new(),
            assets,
            refresh_rate: None,
            last_refresh_ms: None,
            outcome: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        println!("=== GABOR STIMULUS ===");
        println!("Platform: {}", std::env::consts::OS);
        println!("Architecture: {}", std::env::consts::ARCH);
        println!("Press ESC to abort.\n");

        event_loop.run_app(&mut self)?;

        if let Some(result) = self.outcome.take() {
            println!("{}", serde_json::to_string(&result)?);
        }
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow::anyhow!("No monitor available"))?;

        self.refresh_rate = monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let attributes = Window::default_attributes()
            .with_title("Gabor")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor.clone()))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();

        println!("Display Configuration:");
        println!("  Physical size: {}×{}", size.width, size.height);
        println!("  Scale factor: {:.2}", window.scale_factor());
        if let Some(refresh_rate) = self.refresh_rate {
            println!("  Refresh rate: {:.1} Hz", refresh_rate);
        }

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);
        self.compositor = Some(FrameCompositor::new(size.width, size.height));

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);

        self.start_trial()
    }

    fn start_trial(&mut self) -> Result<()> {
        let prepared = self
            .prepared
            .take()
            .ok_or_else(|| anyhow::anyhow!("trial already started"))?;
        let mut trial = TrialController::new(prepared, rand::rng());
        trial.start(&mut self.host)?;
        self.trial = Some(trial);
        Ok(())
    }

    /// One display refresh: fire due timeouts, advance the background,
    /// then blit whatever changed.
    fn on_redraw(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let now = self.host.now_ms();
        if let Some(previous) = self.last_refresh_ms.replace(now) {
            let interval = Duration::from_secs_f64((now - previous).max(0.0) / 1e3);
            self.host.timer_mut().record_refresh(interval);
        }

        if let Some(trial) = self.trial.as_mut() {
            while let Some(handle) = self.host.pop_due(now) {
                trial.handle_event(TrialEvent::Timer(handle), &mut self.host, &self.assets);
            }
            trial.handle_event(
                TrialEvent::Refresh { timestamp_ms: now },
                &mut self.host,
                &self.assets,
            );
        }

        self.render()?;

        if let Some(result) = self.host.take_result() {
            let stats = self.host.timer().refresh_stats();
            info!(
                refresh_hz = stats.refresh_hz,
                jitter_ms = stats.jitter_ms,
                samples = stats.samples,
                "display refresh"
            );
            self.outcome = Some(result);
            self.exit(event_loop);
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(compositor)) = (self.pixels.as_mut(), self.compositor.as_mut())
        else {
            return Ok(());
        };
        if let Some(surface) = self.host.take_dirty_surface() {
            let frame = pixels.frame_mut();
            match surface {
                Some(scene) => {
                    let stats: FrameStats = compositor.present(scene, frame);
                    debug!(
                        clear_ms = stats.clear.as_secs_f64() * 1e3,
                        copy_ms = stats.copy.as_secs_f64() * 1e3,
                        total_ms = stats.total.as_secs_f64() * 1e3,
                        "frame composed"
                    );
                }
                None => compositor.clear(frame),
            }
        }
        pixels.render()?;
        Ok(())
    }

    fn handle_input(&mut self, key: &Key, event_loop: &ActiveEventLoop) {
        if let Key::Named(NamedKey::Escape) = key {
            info!("aborted");
            self.exit(event_loop);
            return;
        }
        if !self.host.is_listening() {
            return;
        }
        let (Some(trial), Some(name)) = (self.trial.as_mut(), key_name(key)) else {
            return;
        };
        let event = TrialEvent::Key {
            key: name,
            timestamp_ms: self.host.now_ms(),
        };
        trial.handle_event(event, &mut self.host, &self.assets);
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize surface");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize buffer");
            }
        }
        if let Some(compositor) = &mut self.compositor {
            compositor.resize(new_size.width, new_size.height);
        }
        self.host.mark_dirty();
        info!(width = new_size.width, height = new_size.height, "display resized");
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %e, "failed to start trial");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.on_redraw(event_loop) {
                    error!(error = %e, "redraw failed");
                    self.exit(event_loop);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_input(&event.logical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
