//! Scenes: one drawable tree plus the hooks that drive it
//!
//! A scene never talks to the scene stack directly. Its hooks return a
//! [`Flow`] and the game loop applies it after the hook returns.

use tracing::{debug, info};

use crate::drawable::{Drawable, FrameContext};
use crate::game::Context;
use crate::input::Event;
use crate::{Color, BLACK};

/// A scene to construct by name, with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl SceneRequest {
    pub fn new(name: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// What the game loop does after a scene hook returns
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    /// The scene is done and is popped off the stack
    Complete,
    /// Start another scene on top of this one
    Push(SceneRequest),
    /// Leave the game
    Quit,
}

impl Flow {
    pub fn is_continue(&self) -> bool {
        matches!(self, Flow::Continue)
    }
}

/// The part of a scene its hooks work on.
pub struct SceneState {
    /// Root of the drawable tree, covering the native surface
    pub root: Drawable,
    pub cursor_visible: bool,
    /// Color behind the tree
    pub background: Color,
    start_time: u64,
}

impl SceneState {
    /// Milliseconds since the scene's start time
    pub fn elapsed_time(&self, ctx: &Context) -> u64 {
        ctx.clock.ticks().saturating_sub(self.start_time)
    }

    /// Restarts the scene clock at the current time
    pub fn reset_start_time(&mut self, ctx: &Context) {
        self.start_time = ctx.clock.ticks();
    }

    pub fn set_start_time(&mut self, ms: u64) {
        self.start_time = ms;
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }
}

/// Scene behaviour. Every hook defaults to doing nothing.
pub trait SceneHooks {
    fn on_event(&mut self, _state: &mut SceneState, _event: &Event, _ctx: &mut Context) -> Flow {
        Flow::Continue
    }

    fn on_pause(&mut self, _state: &mut SceneState, _ctx: &mut Context) {}

    fn on_resume(&mut self, _state: &mut SceneState, _ctx: &mut Context) {}

    /// Runs once per frame before the tree is updated
    fn on_update(&mut self, _state: &mut SceneState, _ctx: &mut Context) -> Flow {
        Flow::Continue
    }

    fn on_stop(&mut self, _state: &mut SceneState, _ctx: &mut Context) {}
}

/// Hooks of a scene that only shows its tree
pub struct Still;

impl SceneHooks for Still {}

pub struct Scene {
    name: String,
    state: SceneState,
    hooks: Box<dyn SceneHooks>,
}

impl Scene {
    /// An empty scene covering the native surface, started now
    pub fn new(name: impl Into<String>, ctx: &Context, hooks: Box<dyn SceneHooks>) -> Self {
        Self {
            name: name.into(),
            state: SceneState {
                root: Drawable::container(ctx.screen.size()),
                cursor_visible: true,
                background: BLACK,
                start_time: ctx.clock.ticks(),
            },
            hooks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SceneState {
        &mut self.state
    }

    pub fn root(&self) -> &Drawable {
        &self.state.root
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.state.cursor_visible = visible;
    }

    pub fn add_child(&mut self, node: Drawable, position: Option<(i32, i32)>) {
        self.state.root.add_child(node, position);
    }

    pub fn on_event(&mut self, event: &Event, ctx: &mut Context) -> Flow {
        self.hooks.on_event(&mut self.state, event, ctx)
    }

    pub fn on_pause(&mut self, ctx: &mut Context) {
        info!(scene = %self.name, "paused");
        self.hooks.on_pause(&mut self.state, ctx);
    }

    /// Shows the scene again: applies its cursor setting, clears the native
    /// surface to the background and forces a full redraw.
    pub fn on_resume(&mut self, ctx: &mut Context) {
        info!(scene = %self.name, "resumed");
        ctx.screen.cursor_mut().set_visible(self.state.cursor_visible);
        ctx.screen.clear(self.state.background);
        self.state.root.invalidate();
        self.hooks.on_resume(&mut self.state, ctx);
    }

    pub fn on_stop(&mut self, ctx: &mut Context) {
        info!(scene = %self.name, "stopped");
        self.hooks.on_stop(&mut self.state, ctx);
    }

    /// Runs one frame: the update hook, then the tree update and redraw into
    /// the native surface. Nothing is drawn when the hook ends the frame.
    pub fn update(&mut self, ctx: &mut Context) -> Flow {
        let flow = self.hooks.on_update(&mut self.state, ctx);
        if !flow.is_continue() {
            return flow;
        }

        let mut frame = FrameContext {
            dt_ms: ctx.clock.frame_time(),
            audio: &mut *ctx.audio,
        };
        let cleared = self.state.root.update(&mut frame, (0, 0));

        let surface = ctx.screen.surface_mut();
        for rect in &cleared {
            surface.fill_rect(*rect, self.state.background);
        }
        let painted = self.state.root.draw(surface, &cleared, (0, 0));
        if !painted.is_empty() {
            debug!(scene = %self.name, regions = painted.len(), "redrawn");
        }
        ctx.screen.debug_mut().record(&painted);

        Flow::Continue
    }

    pub fn elapsed_time(&self, ctx: &Context) -> u64 {
        self.state.elapsed_time(ctx)
    }

    pub fn reset_start_time(&mut self, ctx: &Context) {
        self.state.reset_start_time(ctx);
    }

    pub fn set_start_time(&mut self, ms: u64) {
        self.state.set_start_time(ms);
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("cursor_visible", &self.state.cursor_visible)
            .field("start_time", &self.state.start_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;
    use crate::overlay::Overlay;
    use crate::{Rect, Size, Surface, WHITE};
    use image::Rgb;

    const GRAY: Color = Rgb([90, 90, 90]);
    const RED: Color = Rgb([255, 0, 0]);

    struct EscapeCompletes;

    impl SceneHooks for EscapeCompletes {
        fn on_event(&mut self, _: &mut SceneState, event: &Event, _: &mut Context) -> Flow {
            if event.is_key_up(Key::Escape) {
                Flow::Complete
            } else {
                Flow::Continue
            }
        }

        fn on_update(&mut self, state: &mut SceneState, ctx: &mut Context) -> Flow {
            if state.elapsed_time(ctx) > 1000 {
                Flow::Complete
            } else {
                Flow::Continue
            }
        }
    }

    fn context() -> Context {
        Context::manual(Size::new(32, 24))
    }

    #[test]
    fn test_resume_applies_properties_and_redraws_everything() {
        let mut ctx = context();
        ctx.screen.clear(WHITE);

        let mut scene = Scene::new("test", &ctx, Box::new(Still));
        scene.set_cursor_visible(false);
        scene.state_mut().background = GRAY;
        scene.add_child(Drawable::solid(Size::new(4, 4), RED), Some((2, 2)));

        scene.on_resume(&mut ctx);
        assert!(!ctx.screen.cursor().is_visible());
        assert_eq!(ctx.screen.surface().get(20, 20), GRAY);

        assert!(scene.update(&mut ctx).is_continue());
        assert_eq!(ctx.screen.surface().get(3, 3), RED);
        assert_eq!(ctx.screen.debug().redraws()[0], Rect::new(0, 0, 32, 24));
    }

    #[test]
    fn test_transparent_damage_is_cleared_to_background() {
        let mut ctx = context();
        let mut scene = Scene::new("test", &ctx, Box::new(Still));
        scene.state_mut().background = GRAY;

        let mut sprite = Surface::filled(Size::new(4, 4), RED);
        sprite.set(0, 0, WHITE);
        sprite.key_color_at(0, 0);
        scene.add_child(Drawable::image(sprite).with_name("sprite"), Some((8, 8)));
        scene.on_resume(&mut ctx);
        scene.update(&mut ctx);

        // paint the keyed pixel over, the next redraw must restore the background
        ctx.screen.surface_mut().set(8, 8, WHITE);
        scene.state_mut().root.find_mut("sprite").unwrap().invalidate();
        scene.update(&mut ctx);

        assert_eq!(ctx.screen.surface().get(8, 8), GRAY);
        assert_eq!(ctx.screen.surface().get(9, 9), RED);
    }

    #[test]
    fn test_hooks_return_flows() {
        let mut ctx = context();
        let mut scene = Scene::new("test", &ctx, Box::new(EscapeCompletes));

        assert_eq!(scene.on_event(&Event::KeyDown(Key::Escape), &mut ctx), Flow::Continue);
        assert_eq!(scene.on_event(&Event::KeyUp(Key::Escape), &mut ctx), Flow::Complete);

        ctx.clock.advance(1000);
        assert_eq!(scene.update(&mut ctx), Flow::Continue);
        ctx.clock.advance(1);
        assert_eq!(scene.update(&mut ctx), Flow::Complete);
    }

    #[test]
    fn test_start_time() {
        let mut ctx = context();
        ctx.clock.advance(500);
        let mut scene = Scene::new("test", &ctx, Box::new(Still));
        ctx.clock.advance(250);
        assert_eq!(scene.elapsed_time(&ctx), 250);

        scene.reset_start_time(&ctx);
        assert_eq!(scene.elapsed_time(&ctx), 0);

        scene.set_start_time(0);
        assert_eq!(scene.elapsed_time(&ctx), 750);
    }

    #[test]
    fn test_scene_request() {
        let request = SceneRequest::new("cutscene", &["intro_logos"]);
        assert_eq!(request.args, vec!["intro_logos".to_string()]);
        assert_eq!(Flow::default(), Flow::Continue);
    }
}
