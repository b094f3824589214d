pub mod blend;
pub mod choices;
pub mod color;
pub mod config;
pub mod error;
pub mod trial;

pub use blend::BlendMode;
pub use choices::Choices;
pub use color::CssColor;
pub use config::{
    Aperture, Background, FixationCross, ProvidedAperture, ProvidedBackground, ProvidedConfig,
    ProvidedFixationCross, ProvidedStimulus, ProvidedTiming, StimulusConfig, StimulusParams,
    Timing, resolve,
};
pub use error::ConfigError;
pub use trial::{TrialResult, TrialState};
