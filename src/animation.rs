//! Node behaviours that change a drawable's pixels over time

use tracing::{debug, info};

use crate::drawable::{Behavior, FrameContext};
use crate::media::FrameSource;
use crate::{Rect, Surface};

/// Converts elapsed milliseconds into whole frame periods.
///
/// Time is accumulated in units of `ms * fps` so integer frame rates and
/// integer frame times never suffer rounding drift.
#[derive(Debug, Clone, Copy, Default)]
struct FrameAccumulator {
    fps: f64,
    acc: f64,
}

impl FrameAccumulator {
    fn new(fps: f64) -> Self {
        Self { fps, acc: 0.0 }
    }

    fn add(&mut self, dt_ms: u64) {
        self.acc += dt_ms as f64 * self.fps;
    }

    /// Consumes one frame period if enough time has accumulated
    fn take(&mut self) -> bool {
        if self.fps > 0.0 && self.acc >= 1000.0 {
            self.acc -= 1000.0;
            true
        } else {
            false
        }
    }
}

/// A vertical strip of equally sized frames played in a loop forever.
pub struct StripAnimation {
    frames: Vec<Surface>,
    current: usize,
    clock: FrameAccumulator,
}

impl StripAnimation {
    /// Cuts `strip` into `count` frames stacked top to bottom. Leftover rows
    /// at the bottom are ignored; a count of 0 is treated as 1.
    pub fn new(strip: &Surface, count: u32, fps: f64) -> Self {
        let count = count.max(1);
        let frame_height = strip.height() / count;

        let frames = (0..count)
            .map(|i| strip.sub_surface(Rect::new(0, (i * frame_height) as i32, strip.width(), frame_height)))
            .collect();

        Self {
            frames,
            current: 0,
            clock: FrameAccumulator::new(fps),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> &Surface {
        &self.frames[self.current]
    }
}

impl Behavior for StripAnimation {
    fn on_update(&mut self, ctx: &mut FrameContext<'_>) -> Option<Surface> {
        self.clock.add(ctx.dt_ms);

        let mut advanced = false;
        while self.clock.take() {
            self.current = (self.current + 1) % self.frames.len();
            advanced = true;
        }

        advanced.then(|| self.frames[self.current].clone())
    }

    fn frame_index(&self) -> Option<usize> {
        Some(self.current)
    }
}

/// Plays a finite [`FrameSource`], at most one new frame per update, and
/// starts the soundtrack on the first update.
pub struct VideoPlayback {
    source: Box<dyn FrameSource>,
    clock: FrameAccumulator,
    audio_started: bool,
    frames_shown: usize,
    finished: bool,
}

impl VideoPlayback {
    /// Wraps a source whose first frame has already been taken for display.
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        let fps = source.fps();
        Self {
            source,
            clock: FrameAccumulator::new(fps),
            audio_started: false,
            frames_shown: 1,
            finished: false,
        }
    }
}

impl Behavior for VideoPlayback {
    fn on_update(&mut self, ctx: &mut FrameContext<'_>) -> Option<Surface> {
        if !self.audio_started {
            self.audio_started = true;
            if let Some(track) = self.source.audio() {
                ctx.audio.play(track);
            }
        }

        if self.finished {
            return None;
        }

        self.clock.add(ctx.dt_ms);
        if !self.clock.take() {
            return None;
        }

        match self.source.next_frame() {
            Some(frame) => {
                self.frames_shown += 1;
                Some(frame)
            }
            None => {
                info!(frames = self.frames_shown, "video finished");
                self.finished = true;
                None
            }
        }
    }

    fn finished(&self) -> bool {
        self.finished
    }

    fn frame_index(&self) -> Option<usize> {
        Some(self.frames_shown.saturating_sub(1))
    }
}

impl Drop for VideoPlayback {
    fn drop(&mut self) {
        debug!(frames = self.frames_shown, finished = self.finished, "video released");
    }
}
