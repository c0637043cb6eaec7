use std::time::{Duration, Instant};

/// Single-slot scroll mailbox. Newer deltas overwrite pending ones and
/// deliveries are spaced at least `interval` apart.
#[derive(Debug, Clone)]
pub struct ScrollMailbox {
    pending: Option<f64>,
    interval: Duration,
    last_delivery: Option<Instant>,
}

impl ScrollMailbox {
    pub fn new(interval: Duration) -> Self {
        Self {
            pending: None,
            interval,
            last_delivery: None,
        }
    }

    pub fn post(&mut self, delta: f64) {
        if delta.is_finite() {
            self.pending = Some(delta);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn take(&mut self, now: Instant) -> Option<f64> {
        if let Some(last) = self.last_delivery {
            if now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }
        let delta = self.pending.take()?;
        self.last_delivery = Some(now);
        Some(delta)
    }
}

impl Default for ScrollMailbox {
    fn default() -> Self {
        Self::new(Duration::from_millis(1))
    }
}
