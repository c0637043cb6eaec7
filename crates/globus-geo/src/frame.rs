use std::time::Duration;

const WINDOW: Duration = Duration::from_secs(1);

/// Counts frames over one-second windows.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    frames: u32,
    elapsed: Duration,
    fps: u32,
    total_frames: u64,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame. Returns the new count when a window closes.
    pub fn tick(&mut self, delta: Duration) -> Option<u32> {
        self.total_frames += 1;
        self.frames += 1;
        self.elapsed += delta;
        if self.elapsed < WINDOW {
            return None;
        }
        self.fps = self.frames;
        self.frames = 0;
        self.elapsed = Duration::ZERO;
        Some(self.fps)
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_once_per_second_and_resets() {
        let mut counter = FrameCounter::new();
        let frame = Duration::from_millis(10);
        let published: Vec<u32> = (0..250).filter_map(|_| counter.tick(frame)).collect();
        assert_eq!(published, vec![100, 100]);
        assert_eq!(counter.fps(), 100);
        assert_eq!(counter.total_frames(), 250);
    }

    #[test]
    fn slow_frame_closes_the_window() {
        let mut counter = FrameCounter::new();
        assert_eq!(counter.tick(Duration::from_millis(300)), None);
        assert_eq!(counter.tick(Duration::from_millis(800)), Some(2));
        assert_eq!(counter.tick(Duration::from_millis(16)), None);
        assert_eq!(counter.fps(), 2);
    }
}
