use gabor_core::{Choices, TrialResult};
use gabor_timing::{HighPrecisionTimer, Timer, TimerHandle, TimerQueue};
use gabor_trial::{TimerKind, TrialHost};
use std::time::Duration;
use tiny_skia::Pixmap;
use tracing::debug;

/// The window side of a trial: owns the clock, the armed timeouts, the last
/// presented surface and the key capture state.
pub struct AppHost {
    timer: HighPrecisionTimer,
    timers: TimerQueue<TimerKind>,
    surface: Option<Pixmap>,
    dirty: bool,
    listening: Option<Choices>,
    result: Option<TrialResult>,
}

impl AppHost {
    pub fn new() -> Self {
        Self {
            timer: HighPrecisionTimer::new(),
            timers: TimerQueue::new(),
            surface: None,
            dirty: true,
            listening: None,
            result: None,
        }
    }

    pub fn timer(&self) -> &HighPrecisionTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut HighPrecisionTimer {
        &mut self.timer
    }

    pub fn pop_due(&mut self, now_ms: f64) -> Option<TimerHandle> {
        self.timers.pop_due(now_ms).map(|(handle, _)| handle)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.is_some()
    }

    /// The surface to show, if it changed since the last call.
    pub fn take_dirty_surface(&mut self) -> Option<Option<&Pixmap>> {
        if !std::mem::take(&mut self.dirty) {
            return None;
        }
        Some(self.surface.as_ref())
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn take_result(&mut self) -> Option<TrialResult> {
        self.result.take()
    }
}

impl Default for AppHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TrialHost for AppHost {
    fn now_ms(&self) -> f64 {
        self.timer.now_ms()
    }

    fn present(&mut self, surface: &Pixmap) {
        match &mut self.surface {
            Some(current) if (current.width(), current.height()) == (surface.width(), surface.height()) => {
                current.data_mut().copy_from_slice(surface.data());
            }
            _ => self.surface = Some(surface.clone()),
        }
        self.dirty = true;
    }

    fn clear_display(&mut self) {
        self.surface = None;
        self.dirty = true;
    }

    fn set_timeout(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle {
        let handle = self.timers.set_timeout(self.timer.now_ms(), delay, kind);
        debug!(?handle, ?kind, delay_ms = delay.as_millis() as u64, "timeout armed");
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        self.timers.clear(handle);
    }

    fn listen_keys(&mut self, choices: &Choices) {
        self.listening = Some(choices.clone());
    }

    fn stop_listening(&mut self) {
        self.listening = None;
    }

    fn finish_trial(&mut self, result: TrialResult) {
        self.result = Some(result);
    }
}
