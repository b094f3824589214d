use serde::{Deserialize, Serialize};

/// Lifecycle of a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrialState {
    #[default]
    Idle,
    Presenting,
    StimulusHidden,
    Ended,
}

impl TrialState {
    pub fn is_running(&self) -> bool {
        matches!(self, TrialState::Presenting | TrialState::StimulusHidden)
    }
}

/// Reported to the host exactly once per trial.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrialResult {
    /// Milliseconds from stimulus onset to the first qualifying key press.
    pub rt: Option<f64>,
    pub response: Option<String>,
}

impl TrialResult {
    pub fn no_response() -> Self {
        Self::default()
    }

    pub fn responded(&self) -> bool {
        self.response.is_some()
    }
}
