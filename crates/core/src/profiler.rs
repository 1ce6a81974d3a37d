//! Frame timing helpers.
//!
//! Provides RAII-style profiling scopes and a frame timer the engine feeds once
//! per rendered frame.
use std::time::Instant;

/// A profiling scope that measures elapsed time using RAII.
///
/// On drop the elapsed time is written into the target slot, if one was given.
pub struct ProfilerScope<'a> {
    start: Instant,
    name: &'static str,
    target: Option<&'a mut f64>,
}

impl<'a> ProfilerScope<'a> {
    /// Creates a new profiling scope that only measures.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
            target: None,
        }
    }

    /// Creates a scope that stores its elapsed milliseconds into `target` on drop.
    #[must_use]
    pub fn recording(name: &'static str, target: &'a mut f64) -> Self {
        Self {
            start: Instant::now(),
            name,
            target: Some(target),
        }
    }

    /// Gets elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for ProfilerScope<'_> {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        if let Some(target) = self.target.as_deref_mut() {
            *target = elapsed_ms;
        }
    }
}

/// Frame timer with an exponential moving average.
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    last_frame_time_ms: f64,
    average_ms: f64,
    frames: u64,
}

impl FrameTimer {
    /// Smoothing factor of the moving average.
    const SMOOTHING: f64 = 0.1;

    /// Creates a new frame timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records frame time in milliseconds.
    pub fn record(&mut self, time_ms: f64) {
        self.last_frame_time_ms = time_ms;
        self.average_ms = if self.frames == 0 {
            time_ms
        } else {
            self.average_ms + (time_ms - self.average_ms) * Self::SMOOTHING
        };
        self.frames += 1;
    }

    /// Gets the last recorded frame time.
    #[must_use]
    pub fn last_frame_time_ms(&self) -> f64 {
        self.last_frame_time_ms
    }

    #[must_use]
    pub fn average_ms(&self) -> f64 {
        self.average_ms
    }

    /// Number of frames recorded.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
