//! Shared frame driver.
//!
//! The ticker turns host frame timestamps into a monotonic animation clock.
//! Subscribers are identified by [`TickerId`]; each [`Ticker::tick`] reports
//! the subscribers to run, in subscription order, along with the frame's
//! elapsed time. A removed subscriber is never reported again.
//!
//! Lag smoothing caps the elapsed time of a frame that arrives after a long
//! gap (a backgrounded tab, a debugger pause) so animations do not jump.
//! Drivers that do their own damping turn it off with `lag_smoothing(0, 0)`.

use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TickerId(pub u64);

/// Elapsed time delivered to subscribers for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Animation clock in milliseconds.
    pub time_ms: f64,
    /// Clock advance since the previous frame in milliseconds.
    pub delta_ms: f64,
    /// Subscribers to run this frame.
    pub due: Vec<TickerId>,
}

impl Frame {
    pub fn delta_seconds(&self) -> f64 {
        self.delta_ms / 1000.0
    }

    pub fn is_due(&self, id: TickerId) -> bool {
        self.due.contains(&id)
    }
}

#[derive(Debug)]
pub struct Ticker {
    subscribers: Vec<TickerId>,
    next_id: u64,
    lag_threshold_ms: f64,
    adjusted_lag_ms: f64,
    last_host_ms: Option<f64>,
    time_ms: f64,
    frame: u64,
}

impl Default for Ticker {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
            lag_threshold_ms: 500.0,
            adjusted_lag_ms: 33.0,
            last_host_ms: None,
            time_ms: 0.0,
            frame: 0,
        }
    }
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self) -> TickerId {
        self.next_id += 1;
        let id = TickerId(self.next_id);
        self.subscribers.push(id);
        id
    }

    pub fn remove(&mut self, id: TickerId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|existing| *existing != id);
        before != self.subscribers.len()
    }

    pub fn subscribers(&self) -> &[TickerId] {
        &self.subscribers
    }

    /// Configure lag smoothing. A threshold of zero disables it.
    pub fn lag_smoothing(&mut self, threshold_ms: f64, adjusted_lag_ms: f64) {
        self.lag_threshold_ms = threshold_ms.max(0.0);
        self.adjusted_lag_ms = adjusted_lag_ms.max(0.0).min(self.lag_threshold_ms);
    }

    pub fn lag_smoothing_enabled(&self) -> bool {
        self.lag_threshold_ms > 0.0
    }

    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Advance the clock to the host timestamp `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> Frame {
        let raw = match self.last_host_ms {
            Some(last) => (now_ms - last).max(0.0),
            None => 0.0,
        };
        self.last_host_ms = Some(now_ms);

        let delta_ms = if self.lag_smoothing_enabled() && raw > self.lag_threshold_ms {
            trace!(raw, adjusted = self.adjusted_lag_ms, "lag smoothing applied");
            self.adjusted_lag_ms
        } else {
            raw
        };
        self.time_ms += delta_ms;
        self.frame += 1;
        Frame {
            time_ms: self.time_ms,
            delta_ms,
            due: self.subscribers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_subscribers() {
        let mut ticker = Ticker::new();
        let a = ticker.add();
        let b = ticker.add();
        assert_ne!(a, b);
        assert!(ticker.remove(a));
        assert!(!ticker.remove(a));
        assert_eq!(ticker.subscribers(), &[b]);
    }

    #[test]
    fn test_tick_reports_live_subscribers() {
        let mut ticker = Ticker::new();
        let a = ticker.add();
        let b = ticker.add();
        let frame = ticker.tick(0.0);
        assert_eq!(frame.due, vec![a, b]);

        ticker.remove(a);
        let frame = ticker.tick(16.0);
        assert!(!frame.is_due(a));
        assert!(frame.is_due(b));
    }

    #[test]
    fn test_lag_smoothing_caps_large_gaps() {
        let mut ticker = Ticker::new();
        ticker.tick(0.0);
        assert_eq!(ticker.tick(16.0).delta_ms, 16.0);
        assert_eq!(ticker.tick(2016.0).delta_ms, 33.0);
        assert_eq!(ticker.time_ms(), 49.0);
    }

    #[test]
    fn test_lag_smoothing_disabled() {
        let mut ticker = Ticker::new();
        ticker.lag_smoothing(0.0, 0.0);
        assert!(!ticker.lag_smoothing_enabled());
        ticker.tick(0.0);
        assert_eq!(ticker.tick(2000.0).delta_ms, 2000.0);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut ticker = Ticker::new();
        ticker.tick(100.0);
        let frame = ticker.tick(50.0);
        assert_eq!(frame.delta_ms, 0.0);
        assert_eq!(frame.time_ms, 0.0);
    }
}
