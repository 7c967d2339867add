//! The scene stack and the registry scenes are built from

use std::collections::HashMap;

use tracing::info;

use crate::error::{Error, Result};
use crate::game::Context;
use crate::scene::Scene;

/// Builds a scene from its arguments
pub type SceneFactory = fn(&mut Context, &[String]) -> Result<Scene>;

/// Scene name to factory mapping, filled at startup.
#[derive(Default, Clone)]
pub struct SceneRegistry {
    factories: HashMap<String, SceneFactory>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing an earlier registration
    pub fn register(&mut self, name: impl Into<String>, factory: SceneFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn build(&self, name: &str, args: &[String], ctx: &mut Context) -> Result<Scene> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownScene(name.to_string()))?;
        factory(ctx, args)
    }
}

/// LIFO of live scenes. The top scene is the active one.
///
/// Pause, resume and stop hooks are called on every transition, so each
/// scene sees a resume for every time it becomes active and exactly one
/// stop.
pub struct SceneStack {
    scenes: Vec<Scene>,
    registry: SceneRegistry,
}

impl SceneStack {
    pub fn new(registry: SceneRegistry) -> Self {
        Self {
            scenes: Vec::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Builds the scene registered as `name` and makes it active. The stack
    /// is left untouched when the scene can not be built.
    pub fn push(&mut self, name: &str, args: &[String], ctx: &mut Context) -> Result<()> {
        let scene = self.registry.build(name, args, ctx)?;
        self.push_scene(scene, ctx);
        Ok(())
    }

    /// Makes an already built scene active
    pub fn push_scene(&mut self, mut scene: Scene, ctx: &mut Context) {
        if let Some(top) = self.scenes.last_mut() {
            top.on_pause(ctx);
        }
        info!(scene = scene.name(), depth = self.scenes.len() + 1, "scene pushed");
        scene.on_resume(ctx);
        self.scenes.push(scene);
    }

    /// Stops and removes the active scene; the one below becomes active.
    pub fn pop(&mut self, ctx: &mut Context) -> Result<Scene> {
        let mut scene = self.scenes.pop().ok_or(Error::EmptyStack)?;
        scene.on_stop(ctx);
        info!(scene = scene.name(), depth = self.scenes.len(), "scene popped");

        if let Some(top) = self.scenes.last_mut() {
            top.on_resume(ctx);
        }
        Ok(scene)
    }

    pub fn peek(&self) -> Result<&Scene> {
        self.scenes.last().ok_or(Error::EmptyStack)
    }

    pub fn peek_mut(&mut self) -> Result<&mut Scene> {
        self.scenes.last_mut().ok_or(Error::EmptyStack)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene names, bottom first
    pub fn names(&self) -> Vec<&str> {
        self.scenes.iter().map(Scene::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneHooks, SceneState};
    use crate::Size;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    thread_local! {
        static LOG: Log = Rc::new(RefCell::new(Vec::new()));
    }

    fn log() -> Log {
        LOG.with(Rc::clone)
    }

    fn entries() -> Vec<String> {
        LOG.with(|l| l.borrow().clone())
    }

    struct Recorder(String);

    impl SceneHooks for Recorder {
        fn on_pause(&mut self, _: &mut SceneState, _: &mut Context) {
            log().borrow_mut().push(format!("pause {}", self.0));
        }

        fn on_resume(&mut self, _: &mut SceneState, _: &mut Context) {
            log().borrow_mut().push(format!("resume {}", self.0));
        }

        fn on_stop(&mut self, _: &mut SceneState, _: &mut Context) {
            log().borrow_mut().push(format!("stop {}", self.0));
        }
    }

    fn recorder(ctx: &mut Context, args: &[String]) -> Result<Scene> {
        let label = args.first().cloned().unwrap_or_default();
        Ok(Scene::new("recorder", ctx, Box::new(Recorder(label))))
    }

    fn failing(_: &mut Context, _: &[String]) -> Result<Scene> {
        Err(Error::ResourceNotFound("missing".into()))
    }

    fn setup() -> (SceneStack, Context) {
        LOG.with(|l| l.borrow_mut().clear());
        let mut registry = SceneRegistry::new();
        registry.register("recorder", recorder);
        registry.register("failing", failing);
        (SceneStack::new(registry), Context::manual(Size::new(8, 8)))
    }

    fn args(label: &str) -> Vec<String> {
        vec![label.to_string()]
    }

    #[test]
    fn test_push_on_empty_resumes_once() {
        let (mut stack, mut ctx) = setup();
        stack.push("recorder", &args("a"), &mut ctx).unwrap();
        assert_eq!(entries(), vec!["resume a"]);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_push_over_pauses_then_resumes() {
        let (mut stack, mut ctx) = setup();
        stack.push("recorder", &args("a"), &mut ctx).unwrap();
        stack.push("recorder", &args("b"), &mut ctx).unwrap();
        assert_eq!(entries(), vec!["resume a", "pause a", "resume b"]);
    }

    #[test]
    fn test_pop_only_scene_stops_once() {
        let (mut stack, mut ctx) = setup();
        stack.push("recorder", &args("a"), &mut ctx).unwrap();
        stack.pop(&mut ctx).unwrap();
        assert_eq!(entries(), vec!["resume a", "stop a"]);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_resumes_scene_below() {
        let (mut stack, mut ctx) = setup();
        stack.push("recorder", &args("a"), &mut ctx).unwrap();
        stack.push("recorder", &args("b"), &mut ctx).unwrap();
        let popped = stack.pop(&mut ctx).unwrap();
        assert_eq!(popped.name(), "recorder");
        assert_eq!(entries(), vec!["resume a", "pause a", "resume b", "stop b", "resume a"]);
    }

    #[test]
    fn test_empty_stack_errors() {
        let (mut stack, mut ctx) = setup();
        assert!(matches!(stack.pop(&mut ctx), Err(Error::EmptyStack)));
        assert!(matches!(stack.peek(), Err(Error::EmptyStack)));
        assert!(matches!(stack.peek_mut(), Err(Error::EmptyStack)));
    }

    #[test]
    fn test_failed_push_leaves_stack_unchanged() {
        let (mut stack, mut ctx) = setup();
        stack.push("recorder", &args("a"), &mut ctx).unwrap();

        assert!(matches!(stack.push("nope", &[], &mut ctx), Err(Error::UnknownScene(n)) if n == "nope"));
        assert!(matches!(stack.push("failing", &[], &mut ctx), Err(Error::ResourceNotFound(_))));
        assert_eq!(stack.len(), 1);
        assert_eq!(entries(), vec!["resume a"]);
    }

    #[test]
    fn test_registry_names_are_sorted() {
        let (stack, _) = setup();
        assert_eq!(stack.registry().names(), vec!["failing", "recorder"]);
        assert!(stack.registry().contains("recorder"));
    }
}
