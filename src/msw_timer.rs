// Elapsed-time stopwatch for the header display

use std::time::{Duration, Instant};

/// Start/stop stopwatch. `elapsed` is refreshed by `update` while running
/// and frozen by `stop`.
#[derive(Clone, Debug, Default)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
    running: bool,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin timing; has no effect if already running
    pub fn start(&mut self) {
        if !self.running {
            self.start_time = Some(Instant::now());
            self.elapsed = Duration::ZERO;
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.update();
            self.running = false;
        }
    }

    /// Zero the clock; a running stopwatch keeps running from now
    pub fn reset(&mut self) {
        self.start_time = if self.running { Some(Instant::now()) } else { None };
        self.elapsed = Duration::ZERO;
    }

    pub fn update(&mut self) {
        if self.running {
            if let Some(t0) = self.start_time {
                self.elapsed = t0.elapsed();
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.as_secs()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
