//! Game settings, read from `~/.config/tristram/config.json`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::Size;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub title: String,
    pub native_width: u32,
    pub native_height: u32,
    /// Frame rate cap; 0 runs uncapped
    pub max_fps: u32,
    /// Directory holding the unpacked game archive
    pub data_dir: PathBuf,
    /// Scenes pushed at startup, bottom first. Each entry is a scene name
    /// followed by its whitespace separated arguments.
    pub start_scenes: Vec<String>,
    pub debug_overlay: bool,
    pub log_file: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            title: "Tristram".into(),
            native_width: 640,
            native_height: 480,
            max_fps: 20,
            data_dir: PathBuf::from("resources"),
            start_scenes: vec![
                "main_menu".into(),
                "intro_splash".into(),
                "cutscene intro_logos".into(),
            ],
            debug_overlay: false,
            log_file: PathBuf::from("tristram.log"),
        }
    }
}

impl GameConfig {
    /// Reads the user config; a missing file gives the defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("tristram");
        path.push("config.json");
        path
    }

    pub fn native_size(&self) -> Size {
        Size::new(self.native_width, self.native_height)
    }

    /// Start scenes split into name and arguments. Blank entries are skipped.
    pub fn start_requests(&self) -> Vec<(String, Vec<String>)> {
        self.start_scenes
            .iter()
            .filter_map(|entry| {
                let mut parts = entry.split_whitespace().map(str::to_string);
                let name = parts.next()?;
                Some((name, parts.collect()))
            })
            .collect()
    }
}
