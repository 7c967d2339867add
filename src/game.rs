//! The game loop
//!
//! One iteration: drain input (global hotkeys first, everything else to the
//! active scene), update the active scene, apply the resulting [`Flow`],
//! compose the frame with its overlays, present it, and wait for the next
//! frame boundary.

use tracing::{info, warn};

use crate::clock::FrameClock;
use crate::compositor::Screen;
use crate::error::Result;
use crate::input::{Event, Key};
use crate::media::{AudioSink, NullAudio};
use crate::renderer::Display;
use crate::resources::ResourceStore;
use crate::scene::Flow;
use crate::stack::{SceneRegistry, SceneStack};
use crate::Size;

/// Toggles the debug overlay
pub const DEBUG_HOTKEY: Key = Key::Char('#');
/// Toggles the frame rate cap
pub const UNLOCK_FPS_HOTKEY: Key = Key::Char('!');

/// Everything scenes and scene factories work with.
pub struct Context {
    pub screen: Screen,
    pub clock: FrameClock,
    pub resources: ResourceStore,
    pub audio: Box<dyn AudioSink>,
}

impl Context {
    pub fn new(
        native: Size,
        clock: FrameClock,
        resources: ResourceStore,
        audio: Box<dyn AudioSink>,
    ) -> Self {
        Self {
            screen: Screen::new(native),
            clock,
            resources,
            audio,
        }
    }

    /// A context with a manual clock, no archive and no audio device
    pub fn manual(native: Size) -> Self {
        Self::new(
            native,
            FrameClock::manual(),
            ResourceStore::new(),
            Box::new(NullAudio::new()),
        )
    }
}

pub struct Game<D: Display> {
    ctx: Context,
    scenes: SceneStack,
    display: D,
    max_fps: u32,
    fps_unlocked: bool,
}

impl<D: Display> Game<D> {
    pub fn new(ctx: Context, registry: SceneRegistry, display: D, max_fps: u32) -> Self {
        let display_size = display.native_size();
        if display_size != ctx.screen.size() {
            warn!(
                display = ?display_size,
                screen = ?ctx.screen.size(),
                "display and screen sizes differ, frames will be rescaled"
            );
        }
        Self {
            ctx,
            scenes: SceneStack::new(registry),
            display,
            max_fps,
            fps_unlocked: false,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn scenes(&self) -> &SceneStack {
        &self.scenes
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn fps_unlocked(&self) -> bool {
        self.fps_unlocked
    }

    /// Pushes the scene registered as `name` on the stack
    pub fn push(&mut self, name: &str, args: &[String]) -> Result<()> {
        self.scenes.push(name, args, &mut self.ctx)
    }

    /// Runs until a quit request or until the scene stack is empty
    pub fn run(&mut self) -> Result<()> {
        info!(scenes = ?self.scenes.names(), max_fps = self.max_fps, "game loop started");
        while self.step()? {}
        info!(frames = self.ctx.clock.frame_count(), "game loop finished");
        Ok(())
    }

    /// Runs one loop iteration. Returns whether the loop goes on.
    pub fn step(&mut self) -> Result<bool> {
        if self.scenes.is_empty() {
            info!("scene stack is empty");
            return Ok(false);
        }

        let mut flow = Flow::Continue;
        for event in self.display.poll_events()? {
            match event {
                Event::Quit => {
                    info!("quit requested");
                    return Ok(false);
                }
                Event::Resize(size) => self.display.resize(size)?,
                ref e if e.is_key_up(DEBUG_HOTKEY) => self.ctx.screen.debug_mut().toggle(),
                ref e if e.is_key_up(UNLOCK_FPS_HOTKEY) => {
                    self.fps_unlocked = !self.fps_unlocked;
                    info!(unlocked = self.fps_unlocked, "frame rate cap toggled");
                }
                event => {
                    if let Some((x, y)) = event.position() {
                        self.ctx.screen.cursor_mut().move_to(x, y);
                    }
                    flow = self.scenes.peek_mut()?.on_event(&event, &mut self.ctx);
                    if !flow.is_continue() {
                        // the rest of this frame's input is dropped
                        break;
                    }
                }
            }
        }

        if flow.is_continue() {
            flow = self.scenes.peek_mut()?.update(&mut self.ctx);
        }

        match flow {
            Flow::Continue => {}
            Flow::Complete => {
                self.scenes.pop(&mut self.ctx)?;
                return Ok(!self.scenes.is_empty());
            }
            Flow::Push(request) => {
                if let Err(e) = self.scenes.push(&request.name, &request.args, &mut self.ctx) {
                    warn!(scene = %request.name, "could not start scene: {e}");
                }
                return Ok(true);
            }
            Flow::Quit => {
                info!("quit requested by scene");
                return Ok(false);
            }
        }

        let scene = self.scenes.peek()?.name().to_string();
        let status = self
            .ctx
            .screen
            .debug()
            .status(&scene, self.ctx.clock.fps())
            .unwrap_or_default();
        let frame = self.ctx.screen.compose();
        self.display.present(frame, &status)?;

        self.ctx.clock.tick(if self.fps_unlocked { 0 } else { self.max_fps });
        Ok(true)
    }
}
