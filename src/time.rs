use std::time::{Duration, Instant};

/// Schedules frames at a fixed target rate.
///
/// The event loop sleeps until [`FramePacer::deadline`] and runs a frame
/// once [`FramePacer::ready`] reports it is due. Missed deadlines are not
/// caught up: after a stall the next frame is scheduled one interval from
/// now.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    next: Instant,
}

impl FramePacer {
    pub fn new(target_fps: u32, now: Instant) -> Self {
        let interval = Duration::from_secs_f64(1.0 / f64::from(target_fps.max(1)));
        Self {
            interval,
            next: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ready(&self, now: Instant) -> bool {
        now >= self.next
    }

    pub fn deadline(&self) -> Instant {
        self.next
    }

    /// Marks the frame started at `now` as run and schedules the next one.
    pub fn advance(&mut self, now: Instant) {
        self.next += self.interval;
        if self.next <= now {
            self.next = now + self.interval;
        }
    }
}

/// Frames-per-second averaged over half-second windows.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_millis(500);

    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Counts a frame. Returns `true` when the average was refreshed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Self::WINDOW {
            return false;
        }
        self.fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        true
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacer_waits_one_interval_between_frames() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(60, start);
        assert!(pacer.ready(start));
        pacer.advance(start);
        assert!(!pacer.ready(start));
        assert_eq!(pacer.deadline(), start + pacer.interval());
        assert!(pacer.ready(start + Duration::from_millis(17)));
    }

    #[test]
    fn pacer_does_not_catch_up_after_stall() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(60, start);
        pacer.advance(start);
        let late = start + Duration::from_secs(1);
        pacer.advance(late);
        assert_eq!(pacer.deadline(), late + pacer.interval());
    }

    #[test]
    fn zero_fps_is_treated_as_one() {
        let pacer = FramePacer::new(0, Instant::now());
        assert_eq!(pacer.interval(), Duration::from_secs(1));
    }

    #[test]
    fn fps_counter_averages_over_window() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(start);
        for frame in 1..30 {
            assert!(!counter.tick(start + Duration::from_millis(frame * 16)));
        }
        assert!(counter.tick(start + Duration::from_millis(500)));
        assert!((counter.fps() - 60.0).abs() < 0.5);
    }
}
