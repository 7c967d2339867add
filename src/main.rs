use std::path::PathBuf;
use std::process;
use std::sync::Mutex;

use anyhow::{Context as _, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tristram::clock::FrameClock;
use tristram::config::GameConfig;
use tristram::game::{Context, Game};
use tristram::media::NullAudio;
use tristram::renderer::TerminalDisplay;
use tristram::resources::ResourceStore;
use tristram::scenes;
use tristram::stack::SceneRegistry;

const USAGE: &str = "tristram [data_dir]";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let (mut config, config_error) = match GameConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (GameConfig::default(), Some(e)),
    };

    let mut args = std::env::args().skip(1);
    if let Some(arg) = args.next() {
        if arg == "-h" || arg == "--help" {
            println!("Usage: {USAGE}");
            return Ok(());
        }
        config.data_dir = PathBuf::from(arg);
    }

    init_logging(&config)?;
    if let Some(e) = config_error {
        warn!(path = %GameConfig::config_path().display(), "invalid config ({e}), using defaults");
    }
    info!(title = %config.title, data_dir = %config.data_dir.display(), "starting");

    let mut resources = ResourceStore::new();
    resources
        .load(&config.data_dir)
        .with_context(|| format!("Failed to open game data in {}", config.data_dir.display()))?;

    let mut ctx = Context::new(
        config.native_size(),
        FrameClock::new(),
        resources,
        Box::new(NullAudio::new()),
    );
    match ctx.resources.open("cursor").and_then(|r| r.into_image()) {
        Ok(cursor) => ctx.screen.cursor_mut().set_image(cursor.surface),
        Err(e) => warn!("using the built-in cursor: {e}"),
    }
    ctx.screen.debug_mut().set_enabled(config.debug_overlay);

    let mut registry = SceneRegistry::new();
    scenes::register_defaults(&mut registry);

    let display = TerminalDisplay::new(config.native_size()).context("Failed to set up the terminal")?;
    let mut game = Game::new(ctx, registry, display, config.max_fps);

    for (name, args) in config.start_requests() {
        if let Err(e) = game.push(&name, &args) {
            warn!(scene = %name, "skipping start scene: {e}");
        }
    }

    game.run().context("Game loop failed")
}

fn init_logging(config: &GameConfig) -> Result<()> {
    let file = std::fs::File::create(&config.log_file)
        .with_context(|| format!("Failed to create log file {}", config.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
