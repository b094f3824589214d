use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Monotonic clock shared by the host loop and everything it drives.
pub trait Timer: Clone + Send + Sync {
    /// Milliseconds since the timer was created.
    fn now_ms(&self) -> f64;
    fn elapsed_since(&self, earlier_ms: f64) -> Duration;
    fn record_refresh(&mut self, interval: Duration);
    fn refresh_stats(&self) -> RefreshStats;
}

/// Summary of the intervals between display refresh callbacks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshStats {
    pub samples: usize,
    pub average_interval_ms: f64,
    pub jitter_ms: f64,
    pub min_interval_ms: f64,
    pub max_interval_ms: f64,
    pub refresh_hz: f64,
}

impl RefreshStats {
    pub fn from_intervals<'a, I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = &'a Duration>,
    {
        let times: Vec<f64> = intervals
            .into_iter()
            .map(|d| d.as_secs_f64() * 1e3)
            .collect();
        if times.is_empty() {
            return Self::default();
        }
        let n = times.len() as f64;
        let avg = times.iter().sum::<f64>() / n;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            samples: times.len(),
            average_interval_ms: avg,
            jitter_ms: var.sqrt(),
            min_interval_ms: min,
            max_interval_ms: max,
            refresh_hz: if avg > 0.0 { 1e3 / avg } else { 0.0 },
        }
    }
}

#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    start: Instant,
    intervals: VecDeque<Duration>,
    max_samples: usize,
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self::with_capacity(600)
    }

    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            start: Instant::now(),
            intervals: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.intervals.len()
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for HighPrecisionTimer {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1e3
    }

    fn elapsed_since(&self, earlier_ms: f64) -> Duration {
        Duration::from_secs_f64((self.now_ms() - earlier_ms).max(0.0) / 1e3)
    }

    fn record_refresh(&mut self, interval: Duration) {
        if self.intervals.len() >= self.max_samples {
            self.intervals.pop_front();
        }
        self.intervals.push_back(interval);
    }

    fn refresh_stats(&self) -> RefreshStats {
        RefreshStats::from_intervals(&self.intervals)
    }
}
