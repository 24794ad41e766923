//! Frame timing.
//!
//! ```
//! use sparkfield::time::Time;
//!
//! let mut time = Time::new();
//! let dt = time.update();
//! assert!(dt >= 0.0);
//! assert_eq!(time.frame(), 1);
//! ```

use std::time::{Duration, Instant};

/// Longest step handed to the simulation, in seconds.
pub const MAX_DELTA: f32 = 0.1;

/// Delta time, frame counter and a smoothed FPS reading.
#[derive(Debug)]
pub struct Time {
    last_frame: Instant,
    delta_secs: f32,
    frame_count: u32,
    fps: f32,
    fps_frame_count: u32,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Advance one frame. Returns the clamped delta in seconds.
    pub fn update(&mut self) -> f32 {
        self.tick(Instant::now())
    }

    fn tick(&mut self, now: Instant) -> f32 {
        let raw_delta = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = raw_delta.min(MAX_DELTA);
        self.last_frame = now;
        self.frame_count = self.frame_count.wrapping_add(1);

        let fps_elapsed = now.saturating_duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count.wrapping_sub(self.fps_frame_count);
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames since start; the first `update` returns frame 1.
    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Restart the clock without counting the gap as a frame.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert_eq!(time.delta(), 0.0);
    }

    #[test]
    fn test_frame_counter() {
        let mut time = Time::new();
        let start = time.last_frame;
        for i in 1..=5u32 {
            time.tick(start + Duration::from_millis(16 * i as u64));
        }
        assert_eq!(time.frame(), 5);
        assert!((time.delta() - 0.016).abs() < 1e-4);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut time = Time::new();
        let start = time.last_frame;
        let dt = time.tick(start + Duration::from_secs(3));
        assert_eq!(dt, MAX_DELTA);
    }

    #[test]
    fn test_fps_estimate() {
        let mut time = Time::new();
        let start = time.last_frame;
        for i in 1..=40u64 {
            time.tick(start + Duration::from_millis(i * 20));
        }
        // 50 frames per second
        assert!((time.fps() - 50.0).abs() < 1.0, "fps {}", time.fps());
    }

    #[test]
    fn test_reset() {
        let mut time = Time::new();
        time.update();
        time.reset();
        assert_eq!(time.frame(), 0);
    }
}
