//! The game's scenes
//!
//! - `cutscene <video>`: a full screen video, skipped with Escape or a click
//! - `intro_splash`: title screen with the burning logo, shown for 10 s
//! - `main_menu`: menu background and logo; plays the intro cinematic
//!   again after 20 s without input

use crate::error::{Error, Result};
use crate::game::Context;
use crate::input::{Event, Key};
use crate::scene::{Flow, Scene, SceneHooks, SceneRequest, SceneState};
use crate::stack::SceneRegistry;
use crate::Rect;

/// Time the intro splash stays up
pub const SPLASH_TIMEOUT_MS: u64 = 10_000;
/// Idle time before the main menu replays the intro
pub const MENU_IDLE_MS: u64 = 20_000;

/// Registers every scene of the game
pub fn register_defaults(registry: &mut SceneRegistry) {
    registry.register("cutscene", cutscene);
    registry.register("intro_splash", intro_splash);
    registry.register("main_menu", main_menu);
}

/// Escape released or any mouse button pressed
fn is_skip(event: &Event) -> bool {
    event.is_key_up(Key::Escape) || matches!(event, Event::MouseDown { .. })
}

struct CutScene;

impl SceneHooks for CutScene {
    fn on_event(&mut self, _: &mut SceneState, event: &Event, _: &mut Context) -> Flow {
        if is_skip(event) {
            Flow::Complete
        } else {
            Flow::Continue
        }
    }

    fn on_update(&mut self, state: &mut SceneState, _: &mut Context) -> Flow {
        if state.root.finished() {
            Flow::Complete
        } else {
            Flow::Continue
        }
    }

    fn on_stop(&mut self, _: &mut SceneState, ctx: &mut Context) {
        ctx.audio.stop_all();
    }
}

/// Plays the video named by the first argument, fitted to the screen
pub fn cutscene(ctx: &mut Context, args: &[String]) -> Result<Scene> {
    let name = args
        .first()
        .ok_or_else(|| Error::InvalidArgument("cutscene needs a video name".into()))?;

    let mut video = ctx.resources.open(name)?.into_drawable()?;
    let screen = ctx.screen.size();
    let fitted = Rect::sized(video.rect().size()).scaled_to(screen).centered_in(screen);
    video.set_rect(fitted);

    let mut scene = Scene::new(format!("cutscene {name}"), ctx, Box::new(CutScene));
    scene.set_cursor_visible(false);
    scene.add_child(video, None);
    Ok(scene)
}

struct IntroSplash;

impl SceneHooks for IntroSplash {
    fn on_event(&mut self, _: &mut SceneState, event: &Event, _: &mut Context) -> Flow {
        if is_skip(event) {
            Flow::Complete
        } else {
            Flow::Continue
        }
    }

    fn on_resume(&mut self, state: &mut SceneState, ctx: &mut Context) {
        state.reset_start_time(ctx);
    }

    fn on_update(&mut self, state: &mut SceneState, ctx: &mut Context) -> Flow {
        if state.elapsed_time(ctx) > SPLASH_TIMEOUT_MS {
            Flow::Complete
        } else {
            Flow::Continue
        }
    }
}

pub fn intro_splash(ctx: &mut Context, _args: &[String]) -> Result<Scene> {
    let mut background = ctx.resources.open("intro_splash")?.into_drawable()?;
    let logo = ctx.resources.open("logo_flames_large")?.into_drawable()?;
    background.add_child(logo, Some((45, 182)));

    let mut scene = Scene::new("intro_splash", ctx, Box::new(IntroSplash));
    scene.set_cursor_visible(false);
    scene.add_child(background, None);
    Ok(scene)
}

struct MainMenu;

impl SceneHooks for MainMenu {
    fn on_event(&mut self, state: &mut SceneState, event: &Event, ctx: &mut Context) -> Flow {
        if matches!(
            event,
            Event::KeyDown(_) | Event::MouseMotion { .. } | Event::MouseDown { .. }
        ) {
            state.reset_start_time(ctx);
        }

        if event.is_key_down(Key::Escape) {
            Flow::Quit
        } else {
            Flow::Continue
        }
    }

    fn on_resume(&mut self, state: &mut SceneState, ctx: &mut Context) {
        state.reset_start_time(ctx);
    }

    fn on_update(&mut self, state: &mut SceneState, ctx: &mut Context) -> Flow {
        if state.elapsed_time(ctx) > MENU_IDLE_MS {
            state.reset_start_time(ctx);
            Flow::Push(SceneRequest::new("cutscene", &["intro_cinematic"]))
        } else {
            Flow::Continue
        }
    }
}

pub fn main_menu(ctx: &mut Context, _args: &[String]) -> Result<Scene> {
    let mut background = ctx.resources.open("menu_background")?.into_drawable()?;
    let logo = ctx.resources.open("logo_flames_medium")?.into_drawable()?;
    background.add_child(logo, Some((125, 0)));

    let mut scene = Scene::new("main_menu", ctx, Box::new(MainMenu));
    scene.add_child(background, None);
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseButton;
    use crate::resources::{MemArchive, ResourceStore};
    use crate::Size;
    use image::codecs::gif::GifEncoder;
    use image::{DynamicImage, Frame, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 7]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    fn gif(width: u32, height: u32, frames: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            for _ in 0..frames {
                let buffer = RgbaImage::from_pixel(width, height, Rgba([10, 200, 10, 255]));
                encoder.encode_frame(Frame::new(buffer)).unwrap();
            }
        }
        bytes
    }

    fn context() -> Context {
        let archive = MemArchive::new()
            .with("ui_art\\title.png", png(64, 48))
            .with("ui_art\\mainmenu.png", png(64, 48))
            .with("ui_art\\logo.png", png(8, 30))
            .with("ui_art\\smlogo.png", png(8, 15))
            .with("gendata\\logo.gif", gif(32, 16, 3));
        let mut ctx = Context::manual(Size::new(64, 48));
        ctx.resources = ResourceStore::with_archive(Box::new(archive));
        ctx
    }

    #[test]
    fn test_defaults_are_registered() {
        let mut registry = SceneRegistry::new();
        register_defaults(&mut registry);
        assert_eq!(registry.names(), vec!["cutscene", "intro_splash", "main_menu"]);
    }

    #[test]
    fn test_cutscene_fits_video_to_screen() {
        let mut ctx = context();
        let scene = cutscene(&mut ctx, &["intro_logos".to_string()]).unwrap();
        assert_eq!(scene.name(), "cutscene intro_logos");
        assert!(!scene.state().cursor_visible);
        assert_eq!(scene.root().children()[0].rect(), Rect::new(0, 8, 64, 32));
    }

    #[test]
    fn test_cutscene_needs_a_video() {
        let mut ctx = context();
        assert!(matches!(cutscene(&mut ctx, &[]), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            cutscene(&mut ctx, &["intro_cinematic".to_string()]),
            Err(Error::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_cutscene_completes_on_skip_or_when_finished() {
        let mut ctx = context();
        let mut scene = cutscene(&mut ctx, &["intro_logos".to_string()]).unwrap();
        scene.on_resume(&mut ctx);

        assert_eq!(scene.on_event(&Event::KeyDown(Key::Escape), &mut ctx), Flow::Continue);
        assert_eq!(scene.on_event(&Event::KeyUp(Key::Escape), &mut ctx), Flow::Complete);
        let click = Event::MouseDown { button: MouseButton::Left, x: 1, y: 1 };
        assert_eq!(scene.on_event(&click, &mut ctx), Flow::Complete);

        // two frames queued behind the first; the third update runs dry
        for _ in 0..3 {
            ctx.clock.advance(100);
            ctx.clock.tick(0);
            assert_eq!(scene.update(&mut ctx), Flow::Continue);
        }
        assert!(scene.root().finished());
        assert_eq!(scene.update(&mut ctx), Flow::Complete);
    }

    #[test]
    fn test_splash_times_out() {
        let mut ctx = context();
        let mut scene = intro_splash(&mut ctx, &[]).unwrap();
        ctx.clock.advance(5_000);
        scene.on_resume(&mut ctx);

        let logo = &scene.root().children()[0].children()[0];
        assert_eq!(logo.rect(), Rect::new(45, 182, 8, 2));

        ctx.clock.advance(SPLASH_TIMEOUT_MS);
        assert_eq!(scene.update(&mut ctx), Flow::Continue);
        ctx.clock.advance(1);
        assert_eq!(scene.update(&mut ctx), Flow::Complete);
    }

    #[test]
    fn test_menu_idles_into_cinematic_and_quits_on_escape() {
        let mut ctx = context();
        let mut scene = main_menu(&mut ctx, &[]).unwrap();
        scene.on_resume(&mut ctx);
        assert!(scene.state().cursor_visible);

        ctx.clock.advance(MENU_IDLE_MS);
        scene.on_event(&Event::MouseMotion { x: 3, y: 3 }, &mut ctx);
        ctx.clock.advance(MENU_IDLE_MS);
        assert_eq!(scene.update(&mut ctx), Flow::Continue);

        ctx.clock.advance(1);
        assert_eq!(
            scene.update(&mut ctx),
            Flow::Push(SceneRequest::new("cutscene", &["intro_cinematic"]))
        );
        assert_eq!(scene.update(&mut ctx), Flow::Continue);

        assert_eq!(scene.on_event(&Event::KeyDown(Key::Escape), &mut ctx), Flow::Quit);
    }
}
