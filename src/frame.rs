//! Frame sequencing and timing.
//!
//! A frame always walks the same stages in the same order. The renderer
//! records its passes by iterating [`FrameStage::PASSES`], and the event loop
//! asks [`FrameStage::next`] whether the cycle continues or shuts down.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    Init,
    FrameBegin,
    OffscreenPass,
    SkyboxPass,
    BlitPass,
    Present,
    Shutdown,
}

impl FrameStage {
    /// GPU passes recorded between `FrameBegin` and `Present`.
    pub const PASSES: [FrameStage; 3] = [
        FrameStage::OffscreenPass,
        FrameStage::SkyboxPass,
        FrameStage::BlitPass,
    ];

    /// Advances the state machine; `close_requested` is only consulted at frame begin.
    pub fn next(self, close_requested: bool) -> FrameStage {
        match self {
            FrameStage::Init => FrameStage::FrameBegin,
            FrameStage::FrameBegin if close_requested => FrameStage::Shutdown,
            FrameStage::FrameBegin => FrameStage::OffscreenPass,
            FrameStage::OffscreenPass => FrameStage::SkyboxPass,
            FrameStage::SkyboxPass => FrameStage::BlitPass,
            FrameStage::BlitPass => FrameStage::Present,
            FrameStage::Present => FrameStage::FrameBegin,
            FrameStage::Shutdown => FrameStage::Shutdown,
        }
    }
}

/// Measures elapsed time between consecutive frames.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frames: u64,
}

impl FrameClock {
    /// Upper bound on a single step so a stalled window does not fling the camera.
    pub const MAX_STEP: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            last: start,
            frames: 0,
        }
    }

    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Seconds since the previous tick, clamped to [`Self::MAX_STEP`].
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.last).min(Self::MAX_STEP);
        self.last = now;
        self.frames += 1;
        elapsed.as_secs_f32()
    }

    pub fn frames(&self) -> u64 {
        self.frames
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
    fn steady_state_cycle_returns_to_frame_begin() {
        let mut stage = FrameStage::Init.next(false);
        assert_eq!(stage, FrameStage::FrameBegin);
        let mut visited = Vec::new();
        for _ in 0..5 {
            stage = stage.next(false);
            visited.push(stage);
        }
        assert_eq!(
            visited,
            vec![
                FrameStage::OffscreenPass,
                FrameStage::SkyboxPass,
                FrameStage::BlitPass,
                FrameStage::Present,
                FrameStage::FrameBegin,
            ]
        );
    }

    #[test]
    fn close_request_only_exits_at_frame_begin() {
        assert_eq!(FrameStage::FrameBegin.next(true), FrameStage::Shutdown);
        assert_eq!(FrameStage::SkyboxPass.next(true), FrameStage::BlitPass);
        assert_eq!(FrameStage::Present.next(true), FrameStage::FrameBegin);
        assert_eq!(FrameStage::Shutdown.next(false), FrameStage::Shutdown);
    }

    #[test]
    fn passes_follow_the_state_machine() {
        let mut stage = FrameStage::FrameBegin;
        for pass in FrameStage::PASSES {
            stage = stage.next(false);
            assert_eq!(stage, pass);
        }
    }

    #[test]
    fn clock_reports_elapsed_seconds() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let dt = clock.tick_at(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);
        let dt = clock.tick_at(start + Duration::from_millis(48));
        assert!((dt - 0.032).abs() < 1e-6);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn clock_clamps_long_stalls() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let dt = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(dt, FrameClock::MAX_STEP.as_secs_f32());
    }
}
