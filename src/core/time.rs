//! Tick timing utilities

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic time source, in seconds.
///
/// The engine never reads wall-clock time directly; everything that measures
/// a tick goes through this trait so tests can drive time by hand.
pub trait Clock {
    fn now(&mut self) -> f64;
}

/// Default clock backed by `Instant`.
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock for tests.
///
/// The returned handle is shared with the clock, so a test can advance time
/// while the engine owns the `Clock` box.
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> (Self, Rc<Cell<f64>>) {
        let now = Rc::new(Cell::new(0.0));
        (Self { now: now.clone() }, now)
    }
}

impl Clock for ManualClock {
    fn now(&mut self) -> f64 {
        self.now.get()
    }
}

/// Engine-internal timing for one rolling window of ticks
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct TickWindow {
    pub avg_ms: f32,
    pub min_ms: f32,
    pub max_ms: f32,
}

/// Snapshot of scheduler timing statistics
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct TickStats {
    pub window: TickWindow,
    pub last_ms: f32,
    pub tick_count: u64,
    pub entities_processed: u64,
}

/// Tracks per-tick engine time over a rolling window
pub struct TickTimer {
    /// Ring buffer of tick durations in milliseconds, oldest first
    history: VecDeque<f32>,
    capacity: usize,
    tick_count: u64,
    entities_processed: u64,
    last_ms: f32,
}

impl TickTimer {
    /// Create a timer keeping the most recent `capacity` tick durations
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            tick_count: 0,
            entities_processed: 0,
            last_ms: 0.0,
        }
    }

    /// Record one completed tick
    pub fn record(&mut self, duration_secs: f64, entities: u32) {
        let ms = (duration_secs * 1000.0) as f32;
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(ms);
        self.tick_count += 1;
        self.entities_processed += entities as u64;
        self.last_ms = ms;
    }

    /// Get rolling statistics over the window
    pub fn stats(&self) -> TickStats {
        let mut min_ms = f32::INFINITY;
        let mut max_ms = 0.0f32;
        let mut total = 0.0f32;

        for &ms in self.history.iter() {
            min_ms = min_ms.min(ms);
            max_ms = max_ms.max(ms);
            total += ms;
        }

        let count = self.history.len();
        let avg_ms = if count > 0 { total / count as f32 } else { 0.0 };
        if count == 0 {
            min_ms = 0.0;
        }

        TickStats {
            window: TickWindow { avg_ms, min_ms, max_ms },
            last_ms: self.last_ms,
            tick_count: self.tick_count,
            entities_processed: self.entities_processed,
        }
    }
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new(240)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let (mut clock, handle) = ManualClock::new();
        assert_eq!(clock.now(), 0.0);
        handle.set(handle.get() + 1.5);
        assert_eq!(clock.now(), 1.5);
    }

    #[test]
    fn test_monotonic_clock_nondecreasing() {
        let mut clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_tick_timer_stats() {
        let mut timer = TickTimer::new(4);
        timer.record(0.001, 10);
        timer.record(0.003, 20);

        let stats = timer.stats();
        assert_eq!(stats.tick_count, 2);
        assert_eq!(stats.entities_processed, 30);
        assert!((stats.window.min_ms - 1.0).abs() < 1e-3);
        assert!((stats.window.max_ms - 3.0).abs() < 1e-3);
        assert!((stats.window.avg_ms - 2.0).abs() < 1e-3);
        assert!((stats.last_ms - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_tick_timer_window_rolls() {
        let mut timer = TickTimer::new(2);
        timer.record(0.010, 0);
        timer.record(0.001, 0);
        timer.record(0.001, 0);

        // The 10ms tick has rolled out of the window
        let stats = timer.stats();
        assert!(stats.window.max_ms < 2.0);
        assert_eq!(stats.tick_count, 3);
    }

    #[test]
    fn test_tick_timer_empty() {
        let timer = TickTimer::new(8);
        let stats = timer.stats();
        assert_eq!(stats.window.avg_ms, 0.0);
        assert_eq!(stats.window.min_ms, 0.0);
        assert_eq!(stats.tick_count, 0);
    }
}
