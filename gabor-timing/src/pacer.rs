use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PacerError {
    #[error("target fps must be a positive number, got {0}")]
    InvalidFps(f64),
}

/// Shared stop switch of a [`FramePacer`]. Clones observe the same flag, so
/// whoever tears a trial down can stop a pacer that a pending refresh
/// callback is about to run.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Fixed-rate scheduler layered over a variable-rate refresh callback.
///
/// The host calls [`FramePacer::on_refresh`] once per display refresh with a
/// monotonic timestamp. The tick closure runs on the first refresh after
/// start and then whenever at least one frame period has elapsed since the
/// last tick. The last-tick time advances to `now - elapsed % period`, so
/// the remainder carries over instead of accumulating drift.
#[derive(Debug)]
pub struct FramePacer {
    frame_period_ms: f64,
    last_tick_ms: Option<f64>,
    stop: StopFlag,
    ticks: u64,
}

impl FramePacer {
    pub fn start(target_fps: f64) -> Result<Self, PacerError> {
        if !(target_fps.is_finite() && target_fps > 0.0) {
            return Err(PacerError::InvalidFps(target_fps));
        }
        debug!(target_fps, "frame pacer started");
        Ok(Self {
            frame_period_ms: 1000.0 / target_fps,
            last_tick_ms: None,
            stop: StopFlag::default(),
            ticks: 0,
        })
    }

    pub fn stop(&self) {
        if !self.stop.is_stopped() {
            debug!(ticks = self.ticks, "frame pacer stopped");
        }
        self.stop.stop();
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.stop.is_stopped()
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(self.frame_period_ms / 1e3)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns whether `on_tick` ran.
    pub fn on_refresh<F: FnOnce()>(&mut self, timestamp_ms: f64, on_tick: F) -> bool {
        if self.stop.is_stopped() {
            return false;
        }
        let due = match self.last_tick_ms {
            None => {
                self.last_tick_ms = Some(timestamp_ms);
                true
            }
            Some(last) => {
                let elapsed = timestamp_ms - last;
                if elapsed >= self.frame_period_ms {
                    self.last_tick_ms = Some(timestamp_ms - elapsed % self.frame_period_ms);
                    true
                } else {
                    false
                }
            }
        };
        if due {
            self.ticks += 1;
            on_tick();
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pacer: &mut FramePacer, refresh_hz: f64, duration_ms: f64) -> u32 {
        let period = 1000.0 / refresh_hz;
        let mut ticks = 0;
        let mut k = 0u32;
        loop {
            let t = k as f64 * period;
            if t > duration_ms {
                break;
            }
            pacer.on_refresh(t, || ticks += 1);
            k += 1;
        }
        ticks
    }

    #[test]
    fn ten_fps_on_sixty_hz() {
        let mut pacer = FramePacer::start(10.0).unwrap();
        let ticks = run(&mut pacer, 60.0, 1000.0);
        assert!((9..=11).contains(&ticks), "ticks = {ticks}");
        assert_eq!(pacer.ticks(), ticks as u64);
    }

    #[test]
    fn non_integer_ratio_does_not_drift() {
        let mut pacer = FramePacer::start(7.0).unwrap();
        let ticks = run(&mut pacer, 144.0, 10_000.0);
        assert!((69..=71).contains(&ticks), "ticks = {ticks}");
    }

    #[test]
    fn jitter_does_not_accumulate() {
        let mut pacer = FramePacer::start(30.0).unwrap();
        let mut ticks = 0;
        for k in 0..=600u32 {
            let jitter = if k % 2 == 0 { 1.5 } else { -1.5 };
            pacer.on_refresh(k as f64 * (1000.0 / 60.0) + jitter, || ticks += 1);
        }
        // 10 s at 30 fps
        assert!((299..=301).contains(&ticks), "ticks = {ticks}");
    }

    #[test]
    fn first_refresh_always_ticks() {
        let mut pacer = FramePacer::start(1.0).unwrap();
        assert!(pacer.on_refresh(5_000.0, || {}));
        assert!(!pacer.on_refresh(5_016.0, || {}));
    }

    #[test]
    fn stop_wins_over_a_pending_refresh() {
        let mut pacer = FramePacer::start(60.0).unwrap();
        let flag = pacer.stop_flag();
        let mut ticks = 0;
        pacer.on_refresh(0.0, || ticks += 1);
        // Teardown happens elsewhere while the next refresh is already queued.
        flag.stop();
        for k in 1..100 {
            pacer.on_refresh(k as f64 * 16.7, || ticks += 1);
        }
        assert_eq!(ticks, 1);
        assert!(!pacer.is_running());
    }

    #[test]
    fn rejects_non_positive_rates() {
        assert!(FramePacer::start(0.0).is_err());
        assert!(FramePacer::start(f64::NAN).is_err());
    }
}
