use gabor_core::{Choices, TrialResult};
use gabor_timing::TimerHandle;
use std::time::Duration;
use tiny_skia::Pixmap;

/// What a one-shot trial timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    StimulusHide,
    TrialEnd,
}

/// Capabilities the trial runner lends to a [`crate::TrialController`].
///
/// Everything is driven from one thread: the host calls back into the
/// controller when a timer fires, a key goes down or the display refreshes,
/// and each callback runs to completion before the next is dispatched.
pub trait TrialHost {
    /// Monotonic milliseconds, on the same clock as key and refresh
    /// timestamps.
    fn now_ms(&self) -> f64;

    /// Shows the composed stimulus, replacing whatever was shown before.
    fn present(&mut self, surface: &Pixmap);

    fn clear_display(&mut self);

    fn set_timeout(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle;

    /// Must be a no-op for a handle that already fired or was cleared.
    fn clear_timeout(&mut self, handle: TimerHandle);

    /// Start delivering key presses accepted by `choices`.
    fn listen_keys(&mut self, choices: &Choices);

    fn stop_listening(&mut self);

    /// Called exactly once per trial.
    fn finish_trial(&mut self, result: TrialResult);
}
