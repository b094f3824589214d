pub mod host;
pub mod state;

pub use host::{TimerKind, TrialHost};
pub use state::{TrialController, TrialEvent, TrialRuntimeState, begin_trial};

use gabor_core::ConfigError;
use gabor_render::RenderError;
use thiserror::Error;

/// Raised synchronously by trial setup, before any timer is armed or
/// anything is presented.
#[derive(Debug, Error)]
pub enum TrialError {
    #[error("invalid stimulus configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("trial was already started")]
    AlreadyStarted,
    #[error("failed to build the stimulus: {0}")]
    Render(#[from] RenderError),
}
