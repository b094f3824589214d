pub mod aperture;
pub mod background;
pub mod fixation;
pub mod frame;
pub mod grating;
pub mod noise;
pub mod scene;

pub use aperture::ApertureMask;
pub use background::{BackgroundCompositor, FrameSelector, FrameSet};
pub use fixation::FixationMarker;
pub use frame::{FrameCompositor, FrameStats};
pub use grating::{GRADIENT_BANDS, Grating, Resolution};
pub use noise::{generate_noise_frame, generate_noise_frames};
pub use scene::{PreparedStimulus, Scene, to_skia_blend};

use gabor_timing::PacerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },
    #[error("cycling background has no frames")]
    NoFrames,
    #[error(transparent)]
    Pacer(#[from] PacerError),
}
