use std::time::Duration;

/// Identifies one armed timeout. Clearing a handle that already fired or was
/// cleared is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Pending<K> {
    handle: TimerHandle,
    deadline_ms: f64,
    kind: K,
}

/// One-shot wall-clock timeouts, fired by polling with the current time.
/// Timers that share a deadline fire in the order they were armed.
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    next_id: u64,
    pending: Vec<Pending<K>>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<K> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_timeout(&mut self, now_ms: f64, delay: Duration, kind: K) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            deadline_ms: now_ms + delay.as_secs_f64() * 1e3,
            kind,
        });
        handle
    }

    /// Returns whether the timer was still pending.
    pub fn clear(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        before != self.pending.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|p| p.deadline_ms)
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
    }

    /// Removes and returns the earliest timer due at `now_ms`, if any. Poll
    /// repeatedly: handling one timer may clear the others.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(TimerHandle, K)> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.deadline_ms <= now_ms)
            .min_by(|(_, a), (_, b)| {
                a.deadline_ms
                    .total_cmp(&b.deadline_ms)
                    .then(a.handle.0.cmp(&b.handle.0))
            })
            .map(|(i, _)| i)?;
        let fired = self.pending.remove(index);
        Some((fired.handle, fired.kind))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
