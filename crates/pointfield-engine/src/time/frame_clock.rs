use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds (clamped).
    pub dt: f32,

    /// Time elapsed since the clock started, in seconds (unclamped).
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// The start instant is fixed when the clock is created; `elapsed` is always
/// measured from it. Delta time is clamped so a debugger pause or a minimized
/// window does not produce a pathological `dt`.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
}

/// Delta-time clamps.
const DT_MIN: Duration = Duration::from_micros(100);
const DT_MAX: Duration = Duration::from_millis(250);

impl FrameClock {
    /// Creates a clock whose start instant is `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last: start,
            frame_index: 0,
        }
    }

    /// Seconds since the start instant, as of `now`.
    fn elapsed_at(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.start).as_secs_f32()
    }

    /// Advances the clock to `now` and returns a new `FrameTime`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(DT_MIN, DT_MAX);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.elapsed_at(now),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_measured_from_start() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        let a = clock.tick_at(t0 + Duration::from_millis(500));
        let b = clock.tick_at(t0 + Duration::from_secs(2));

        assert!((a.elapsed - 0.5).abs() < 1e-6);
        assert!((b.elapsed - 2.0).abs() < 1e-6);
        assert_eq!((a.frame_index, b.frame_index), (0, 1));
    }

    #[test]
    fn dt_is_clamped_but_elapsed_is_not() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        let stalled = clock.tick_at(t0 + Duration::from_secs(10));
        assert!((stalled.dt - 0.25).abs() < 1e-6);
        assert!((stalled.elapsed - 10.0).abs() < 1e-4);

        let same = clock.tick_at(t0 + Duration::from_secs(10));
        assert!((same.dt - 0.0001).abs() < 1e-7);
    }

    #[test]
    fn time_before_start_reads_as_zero() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let clock = FrameClock::starting_at(t0);
        assert_eq!(clock.elapsed_at(t0 - Duration::from_millis(10)), 0.0);
    }
}
