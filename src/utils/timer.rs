//! Timer utilities
//!
//! Wall-clock measurement for attempts, suites and whole runs.

use std::time::{Duration, Instant};

/// Labelled wall-clock timer; the label names what is being measured
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Consume the timer, logging its label with the elapsed time
    pub fn stop(self) -> Duration {
        let elapsed = self.elapsed();
        tracing::debug!("{} took {}ms", self.label, elapsed.as_millis());
        elapsed
    }
}

/// Splits a span of work into named laps, one per round
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
    mark: Instant,
    laps: Vec<(String, Duration)>,
}

impl Stopwatch {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            mark: now,
            laps: Vec::new(),
        }
    }

    /// Close the current lap under `label`
    pub fn lap(&mut self, label: impl Into<String>) {
        let now = Instant::now();
        self.laps.push((label.into(), now - self.mark));
        self.mark = now;
    }

    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }

    /// Duration of each lap on its own
    pub fn laps(&self) -> &[(String, Duration)] {
        &self.laps
    }

    /// One `label: Nms` line per lap, then the total
    pub fn format(&self) -> String {
        let mut lines: Vec<String> = self
            .laps
            .iter()
            .map(|(label, lap)| format!("{label}: {}ms", lap.as_millis()))
            .collect();
        lines.push(format!("Total: {}ms", self.total().as_millis()));
        lines.join("\n")
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
