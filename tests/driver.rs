use std::cell::RefCell;

use image::Rgb;
use tristram::drawable::Drawable;
use tristram::game::{Context, Game, DEBUG_HOTKEY, UNLOCK_FPS_HOTKEY};
use tristram::input::{Event, Key};
use tristram::renderer::HeadlessDisplay;
use tristram::scene::{Flow, Scene, SceneHooks, SceneRequest, SceneState};
use tristram::stack::SceneRegistry;
use tristram::{Result, Size};

const NATIVE: Size = Size::new(32, 24);
const RED: tristram::Color = Rgb([255, 0, 0]);

thread_local! {
    static LOG: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

fn record(entry: String) {
    LOG.with(|l| l.borrow_mut().push(entry));
}

fn entries() -> Vec<String> {
    LOG.with(|l| l.borrow().clone())
}

/// Logs its lifecycle; completes on its first update when told to, and
/// forwards a push request given as arguments.
struct Probe {
    label: String,
    complete_on_update: bool,
    push: Option<SceneRequest>,
}

impl SceneHooks for Probe {
    fn on_event(&mut self, _: &mut SceneState, event: &Event, _: &mut Context) -> Flow {
        record(format!("event {} {event:?}", self.label));
        match event {
            Event::KeyUp(Key::Char('q')) => Flow::Quit,
            Event::KeyUp(Key::Char('c')) => Flow::Complete,
            _ => Flow::Continue,
        }
    }

    fn on_pause(&mut self, _: &mut SceneState, _: &mut Context) {
        record(format!("pause {}", self.label));
    }

    fn on_resume(&mut self, _: &mut SceneState, _: &mut Context) {
        record(format!("resume {}", self.label));
    }

    fn on_update(&mut self, _: &mut SceneState, _: &mut Context) -> Flow {
        if self.complete_on_update {
            return Flow::Complete;
        }
        self.push.take().map(Flow::Push).unwrap_or_default()
    }

    fn on_stop(&mut self, _: &mut SceneState, _: &mut Context) {
        record(format!("stop {}", self.label));
    }
}

fn probe(ctx: &mut Context, label: &str, complete_on_update: bool, push: Option<SceneRequest>) -> Scene {
    let hooks = Probe {
        label: label.to_string(),
        complete_on_update,
        push,
    };
    let mut scene = Scene::new(label, ctx, Box::new(hooks));
    scene.add_child(Drawable::solid(Size::new(4, 4), RED), Some((20, 14)));
    scene
}

fn scene_a(ctx: &mut Context, _: &[String]) -> Result<Scene> {
    Ok(probe(ctx, "a", false, None))
}

fn scene_b(ctx: &mut Context, _: &[String]) -> Result<Scene> {
    Ok(probe(ctx, "b", true, None))
}

/// Pushes the scene named by its arguments on its first update
fn launcher(ctx: &mut Context, args: &[String]) -> Result<Scene> {
    let request = args
        .split_first()
        .map(|(name, rest)| SceneRequest {
            name: name.clone(),
            args: rest.to_vec(),
        });
    Ok(probe(ctx, "launcher", false, request))
}

fn game() -> Game<HeadlessDisplay> {
    LOG.with(|l| l.borrow_mut().clear());

    let mut registry = SceneRegistry::new();
    registry.register("a", scene_a);
    registry.register("b", scene_b);
    registry.register("launcher", launcher);
    Game::new(Context::manual(NATIVE), registry, HeadlessDisplay::new(NATIVE), 20)
}

#[test]
fn test_completed_scene_is_popped_and_the_one_below_resumed() {
    let mut game = game();
    game.push("a", &[]).unwrap();
    game.push("b", &[]).unwrap();
    assert_eq!(game.scenes().names(), vec!["a", "b"]);

    assert!(game.step().unwrap());
    assert_eq!(game.scenes().names(), vec!["a"]);
    assert_eq!(
        entries(),
        vec!["resume a", "pause a", "resume b", "stop b", "resume a"]
    );
    // the transition frame is not presented
    assert_eq!(game.display().presented(), 0);

    assert!(game.step().unwrap());
    assert_eq!(game.display().presented(), 1);
    let frame = game.display().last_frame().unwrap();
    assert_eq!(frame.get(21, 15), RED);
}

#[test]
fn test_completing_the_last_scene_ends_the_loop() {
    let mut game = game();
    game.push("b", &[]).unwrap();
    assert!(!game.step().unwrap());
    assert!(game.scenes().is_empty());
    game.run().unwrap();
}

#[test]
fn test_empty_stack_ends_the_loop() {
    let mut game = game();
    assert!(!game.step().unwrap());
    game.run().unwrap();
    assert_eq!(game.display().presented(), 0);
}

#[test]
fn test_hotkeys_are_not_forwarded() {
    let mut game = game();
    game.push("a", &[]).unwrap();
    game.display_mut().push_events(vec![
        Event::KeyDown(DEBUG_HOTKEY),
        Event::KeyUp(DEBUG_HOTKEY),
        Event::KeyUp(UNLOCK_FPS_HOTKEY),
    ]);

    assert!(game.step().unwrap());
    assert!(game.context().screen.debug().is_enabled());
    assert!(game.fps_unlocked());
    assert!(game.display().statuses()[0].starts_with("scene: a"));

    // only the key down reached the scene
    let events: Vec<_> = entries().into_iter().filter(|e| e.starts_with("event")).collect();
    assert_eq!(events.len(), 1);

    game.display_mut().push_events(vec![Event::KeyUp(DEBUG_HOTKEY)]);
    game.step().unwrap();
    assert!(!game.context().screen.debug().is_enabled());
    assert_eq!(game.display().statuses()[1], "");
}

#[test]
fn test_quit_and_resize_events() {
    let mut game = game();
    game.push("a", &[]).unwrap();
    game.display_mut().push_events(vec![Event::Resize(Size::new(120, 40))]);
    assert!(game.step().unwrap());
    assert_eq!(game.display().resizes(), &[Size::new(120, 40)]);

    game.display_mut().push_events(vec![Event::Quit, Event::KeyUp(Key::Char('x'))]);
    assert!(!game.step().unwrap());
    assert!(entries().iter().all(|e| !e.starts_with("event")));
}

#[test]
fn test_scene_flows_from_events() {
    let mut game = game();
    game.push("a", &[]).unwrap();
    game.push("a", &[]).unwrap();

    game.display_mut().push_events(vec![Event::KeyUp(Key::Char('c')), Event::KeyUp(Key::Char('x'))]);
    assert!(game.step().unwrap());
    assert_eq!(game.scenes().len(), 1);
    // input after the completing event is dropped
    assert!(entries().iter().all(|e| !e.contains("'x'")));

    game.display_mut().push_events(vec![Event::KeyUp(Key::Char('q'))]);
    assert!(!game.step().unwrap());
    assert_eq!(game.scenes().len(), 1);
}

#[test]
fn test_push_flow_starts_the_requested_scene() {
    let mut game = game();
    game.push("launcher", &["a".to_string()]).unwrap();
    assert!(game.step().unwrap());
    assert_eq!(game.scenes().names(), vec!["launcher", "a"]);

    // an unknown scene is reported and the loop goes on
    game.push("launcher", &["nowhere".to_string()]).unwrap();
    assert!(game.step().unwrap());
    assert_eq!(game.scenes().names(), vec!["launcher", "a", "launcher"]);
    assert!(matches!(game.push("nowhere", &[]), Err(tristram::Error::UnknownScene(_))));
}

#[test]
fn test_mouse_events_move_the_cursor() {
    let mut game = game();
    game.push("a", &[]).unwrap();
    game.display_mut().push_events(vec![Event::MouseMotion { x: 10, y: 12 }]);
    game.step().unwrap();
    assert_eq!(game.context().screen.cursor().position(), (10, 12));
    assert_eq!(game.display().last_frame().unwrap().get(10, 12), tristram::WHITE);
}

#[test]
fn test_frame_time_drives_updates() {
    let mut game = game();
    game.push("a", &[]).unwrap();
    for _ in 0..3 {
        game.context_mut().clock.advance(50);
        game.step().unwrap();
    }
    assert_eq!(game.context().clock.frame_count(), 3);
    assert_eq!(game.context().clock.frame_time(), 50);
}
