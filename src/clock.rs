//! Frame pacing and time keeping

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of frame times averaged by [`FrameClock::fps`].
const FPS_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy)]
enum TimeSource {
    System(Instant),
    /// Milliseconds, moved forward only by [`FrameClock::advance`].
    Manual(u64),
}

/// Frame clock: caps the frame rate and measures the time between frames.
///
/// All times are whole milliseconds. A manual clock never sleeps and only
/// moves when advanced, which makes frame timing deterministic in tests.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: TimeSource,
    last_tick: u64,
    frame_time: u64,
    frame_count: u64,
    samples: VecDeque<u64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_source(TimeSource::System(Instant::now()))
    }

    pub fn manual() -> Self {
        Self::with_source(TimeSource::Manual(0))
    }

    fn with_source(source: TimeSource) -> Self {
        Self {
            source,
            last_tick: 0,
            frame_time: 0,
            frame_count: 0,
            samples: VecDeque::with_capacity(FPS_WINDOW),
        }
    }

    /// Milliseconds since the clock was created
    pub fn ticks(&self) -> u64 {
        match self.source {
            TimeSource::System(start) => start.elapsed().as_millis() as u64,
            TimeSource::Manual(now) => now,
        }
    }

    /// Moves a manual clock forward. Has no effect on a system clock.
    pub fn advance(&mut self, ms: u64) {
        if let TimeSource::Manual(now) = &mut self.source {
            *now += ms;
        }
    }

    /// Ends a frame: waits until at least `1000 / max_fps` ms have passed
    /// since the previous tick (no wait when `max_fps` is 0) and returns the
    /// measured frame time.
    pub fn tick(&mut self, max_fps: u32) -> u64 {
        if max_fps > 0 {
            if let TimeSource::System(_) = self.source {
                let budget = 1000 / max_fps as u64;
                let spent = self.ticks().saturating_sub(self.last_tick);
                if spent < budget {
                    std::thread::sleep(Duration::from_millis(budget - spent));
                }
            }
        }

        let now = self.ticks();
        self.frame_time = now.saturating_sub(self.last_tick);
        self.last_tick = now;
        self.frame_count += 1;

        if self.samples.len() == FPS_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(self.frame_time);

        self.frame_time
    }

    /// Duration of the last completed frame in ms
    pub fn frame_time(&self) -> u64 {
        self.frame_time
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frame rate averaged over the last few frames
    pub fn fps(&self) -> f32 {
        let total: u64 = self.samples.iter().sum();
        if total == 0 {
            return 0.0;
        }
        self.samples.len() as f32 * 1000.0 / total as f32
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_measures_frame_time() {
        let mut clock = FrameClock::manual();
        clock.advance(40);
        assert_eq!(clock.tick(20), 40);
        assert_eq!(clock.frame_time(), 40);

        clock.advance(10);
        assert_eq!(clock.tick(0), 10);
        assert_eq!(clock.ticks(), 50);
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn test_fps_average() {
        let mut clock = FrameClock::manual();
        for _ in 0..4 {
            clock.advance(50);
            clock.tick(0);
        }
        assert!((clock.fps() - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_system_clock_caps_rate() {
        let mut clock = FrameClock::new();
        clock.tick(0);
        let dt = clock.tick(100);
        assert!(dt >= 9, "frame took {dt} ms, expected a ~10 ms cap");
    }
}
