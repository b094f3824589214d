use thiserror::Error;

/// Raised while resolving a provided configuration. Fatal for the trial:
/// nothing is drawn and no timer is armed once one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("stimulus {field} must be {expected}, got {value}")]
    InvalidStimulus {
        field: &'static str,
        expected: &'static str,
        value: f32,
    },
    #[error("aperture {field} must be finite, got {value}")]
    InvalidAperture { field: &'static str, value: f32 },
    #[error("fixation cross {field} must be a positive number, got {value}")]
    InvalidFixation { field: &'static str, value: f32 },
    #[error("unrecognized background type `{0}`")]
    UnknownBackground(String),
    #[error("`{background}` background requires the `{field}` field")]
    MissingField {
        background: &'static str,
        field: &'static str,
    },
    #[error("`{0}` background needs at least one frame")]
    EmptyFrames(&'static str),
    #[error("background fps must be a positive number, got {0}")]
    InvalidFps(f32),
    #[error("`{0}` is not a recognized css color")]
    InvalidColor(String),
    #[error("`{0}` is not a supported blend mode")]
    UnknownBlendMode(String),
    #[error("no response keys are accepted, the response ends the trial and there is no trial duration: the trial could never end")]
    NeverEnds,
}
