use crate::engine::GameEngine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Paused or over; the engine was not touched.
    Skipped,
    Stepped { dt_ms: u64 },
    /// The tick failed and was logged; the next frame runs normally.
    Failed,
}

/// Turns wall-clock frame timestamps into engine ticks.
pub struct FrameDriver {
    engine: GameEngine,
    paused: bool,
    last_frame_ms: Option<u64>,
    failed_frames: u64,
}

impl FrameDriver {
    pub fn new(engine: GameEngine) -> Self {
        Self {
            engine,
            paused: false,
            last_frame_ms: None,
            failed_frames: 0,
        }
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut GameEngine {
        &mut self.engine
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn failed_frames(&self) -> u64 {
        self.failed_frames
    }

    pub fn pause(&mut self) {
        if !self.paused {
            tracing::debug!(clock_ms = self.engine.clock_ms(), "paused");
        }
        self.paused = true;
    }

    /// The frame after a resume measures from itself, not from the pause.
    pub fn resume(&mut self) {
        if self.paused {
            tracing::debug!(clock_ms = self.engine.clock_ms(), "resumed");
        }
        self.paused = false;
        self.last_frame_ms = None;
    }

    pub fn restart(&mut self) {
        self.engine.reset();
        self.paused = false;
        self.last_frame_ms = None;
    }

    pub fn frame(&mut self, now_ms: u64) -> FrameOutcome {
        if self.paused || self.engine.is_ended() {
            return FrameOutcome::Skipped;
        }
        let dt_ms = match self.last_frame_ms {
            Some(last) => now_ms.saturating_sub(last),
            None => 0,
        };
        self.last_frame_ms = Some(now_ms);

        match self.engine.step(dt_ms) {
            Ok(()) => FrameOutcome::Stepped { dt_ms },
            Err(err) => {
                self.failed_frames += 1;
                tracing::error!(
                    error = %err,
                    clock_ms = self.engine.clock_ms(),
                    failed_frames = self.failed_frames,
                    "tick failed"
                );
                FrameOutcome::Failed
            }
        }
    }
}
