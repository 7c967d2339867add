//! Game resources: an archive of named byte blobs and typed access on top
//!
//! Resource names go through a fixed alias table first. An alias maps a
//! readable name to its archive path together with how to build it (colorkey,
//! animation strip layout, video frame rate and soundtrack). Names without an
//! alias are looked up in the archive as they are, and their type is guessed
//! from the extension.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::drawable::Drawable;
use crate::error::{Error, Result};
use crate::media::{AudioTrack, FrameSource, GifFrames};
use crate::{Size, Surface};

/// Sample rate of the raw soundtracks stored next to videos
pub const SOUNDTRACK_RATE: u32 = 22050;

/// Frame rate used for videos without an alias
const DEFAULT_VIDEO_FPS: f64 = 15.0;

/// Contents of an archive entry. Entries of a [`DirArchive`] stay mapped from
/// disk for as long as a clone of the blob is alive; decoders read straight
/// from the mapping.
#[derive(Clone)]
pub struct Blob(Storage);

#[derive(Clone)]
enum Storage {
    Mapped(Arc<Mmap>),
    Shared(Arc<[u8]>),
}

impl Blob {
    pub fn is_mapped(&self) -> bool {
        matches!(self.0, Storage::Mapped(_))
    }
}

impl Deref for Blob {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.0 {
            Storage::Mapped(map) => &map[..],
            Storage::Shared(bytes) => &bytes[..],
        }
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Storage::Shared(bytes.into()))
    }
}

impl From<Mmap> for Blob {
    fn from(map: Mmap) -> Self {
        Self(Storage::Mapped(Arc::new(map)))
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("len", &self.len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

/// Read-only key to bytes store.
pub trait Archive: Send {
    /// Bytes stored under `path`, or `ResourceNotFound`
    fn read(&self, path: &str) -> Result<Blob>;

    fn contains(&self, path: &str) -> bool;
}

/// An archive unpacked into a directory. Archive paths use backslashes as
/// separators and are matched against the files below the root.
#[derive(Debug, Clone)]
pub struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::ResourceNotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split(['\\', '/'])
            .filter(|part| !part.is_empty() && *part != "..")
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl Archive for DirArchive {
    fn read(&self, path: &str) -> Result<Blob> {
        let file = File::open(self.resolve(path))
            .map_err(|_| Error::ResourceNotFound(path.to_string()))?;
        // zero length files can not be mapped
        if file.metadata()?.len() == 0 {
            return Ok(Blob::from(Vec::new()));
        }

        // SAFETY: the mapping is read-only. Game data files must not be
        // truncated or rewritten while the game holds blobs of them.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Blob::from(map))
    }

    fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }
}

/// Archive held in memory, keyed by archive path.
#[derive(Debug, Clone, Default)]
pub struct MemArchive {
    entries: HashMap<String, Blob>,
}

impl MemArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(path.into(), Blob::from(bytes));
    }

    pub fn with(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl Archive for MemArchive {
    fn read(&self, path: &str) -> Result<Blob> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ResourceNotFound(path.to_string()))
    }

    fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}

/// Layout of an animation strip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParams {
    pub fps: f64,
    pub frames: u32,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Image {
        /// Pixel whose color is keyed out, wrapped around the image size
        colorkey: Option<(i32, i32)>,
        animation: Option<AnimationParams>,
    },
    Video {
        fps: f64,
        soundtrack: Option<&'static str>,
    },
}

#[derive(Debug, Clone, Copy)]
struct Alias {
    path: &'static str,
    kind: Kind,
}

const fn still(path: &'static str) -> Alias {
    Alias {
        path,
        kind: Kind::Image { colorkey: None, animation: None },
    }
}

const fn flames(path: &'static str) -> Alias {
    Alias {
        path,
        kind: Kind::Image {
            colorkey: Some((0, 0)),
            animation: Some(AnimationParams { fps: 15.0, frames: 15 }),
        },
    }
}

const fn video(path: &'static str, soundtrack: &'static str) -> Alias {
    Alias {
        path,
        kind: Kind::Video { fps: 15.0, soundtrack: Some(soundtrack) },
    }
}

static ALIASES: Lazy<HashMap<&'static str, Alias>> = Lazy::new(|| {
    HashMap::from([
        ("intro_logos", video("gendata\\logo.gif", "gendata\\logo.pcm")),
        ("intro_cinematic", video("gendata\\diablo1.gif", "gendata\\diablo1.pcm")),
        ("intro_splash", still("ui_art\\title.png")),
        ("menu_background", still("ui_art\\mainmenu.png")),
        ("logo_flames_large", flames("ui_art\\logo.png")),
        ("logo_flames_medium", flames("ui_art\\smlogo.png")),
        (
            "cursor",
            Alias {
                path: "ui_art\\cursor.png",
                kind: Kind::Image { colorkey: Some((0, -1)), animation: None },
            },
        ),
    ])
});

/// Looks up the alias for `name`, or builds one from the extension
fn resolve(name: &str) -> Option<Alias> {
    if let Some(alias) = ALIASES.get(name) {
        return Some(*alias);
    }

    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)?;
    let kind = match ext.as_str() {
        "gif" => Kind::Video { fps: DEFAULT_VIDEO_FPS, soundtrack: None },
        "png" | "bmp" | "jpg" | "jpeg" | "tga" | "pnm" | "ppm" | "tif" | "tiff" | "ico" => {
            Kind::Image { colorkey: None, animation: None }
        }
        _ => return None,
    };
    Some(Alias { path: "", kind })
}

/// Image resource: decoded pixels, colorkey already applied
#[derive(Debug, Clone)]
pub struct ImageResource {
    pub name: String,
    pub surface: Surface,
    pub animation: Option<AnimationParams>,
}

/// Video resource: a frame source carrying its soundtrack
pub struct VideoResource {
    pub name: String,
    pub source: Box<dyn FrameSource>,
}

impl VideoResource {
    pub fn fps(&self) -> f64 {
        self.source.fps()
    }

    pub fn size(&self) -> Size {
        self.source.size()
    }

    pub fn audio(&self) -> Option<&AudioTrack> {
        self.source.audio()
    }
}

pub enum Resource {
    Raw(Blob),
    Image(ImageResource),
    Video(VideoResource),
}

impl Resource {
    /// Builds the drawable showing this resource. Colorkeyed images are
    /// transparent nodes; raw data can not be shown.
    pub fn into_drawable(self) -> Result<Drawable> {
        match self {
            Resource::Raw(bytes) => Err(Error::InvalidArgument(format!(
                "raw resource of {} bytes can not be drawn",
                bytes.len()
            ))),
            Resource::Image(ImageResource { name, surface, animation: None }) => {
                Ok(Drawable::image(surface).with_name(name))
            }
            Resource::Image(ImageResource { name, surface, animation: Some(params) }) => {
                Ok(Drawable::animated(&surface, params.frames, params.fps).with_name(name))
            }
            Resource::Video(VideoResource { name, source }) => {
                Ok(Drawable::video(source).with_name(name))
            }
        }
    }

    pub fn into_image(self) -> Result<ImageResource> {
        match self {
            Resource::Image(image) => Ok(image),
            _ => Err(Error::InvalidArgument("resource is not an image".to_string())),
        }
    }
}

/// Typed access to the game archive.
#[derive(Default)]
pub struct ResourceStore {
    archive: Option<Box<dyn Archive>>,
}

impl ResourceStore {
    /// A store without an archive. Every lookup fails until `load`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_archive(archive: Box<dyn Archive>) -> Self {
        Self { archive: Some(archive) }
    }

    /// Opens the unpacked archive below `dir`
    pub fn load(&mut self, dir: &Path) -> Result<()> {
        let archive = DirArchive::open(dir)?;
        info!(dir = %dir.display(), "resource archive loaded");
        self.archive = Some(Box::new(archive));
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.archive.is_some()
    }

    fn archive(&self) -> Result<&dyn Archive> {
        self.archive.as_deref().ok_or(Error::StoreUninitialized)
    }

    /// Raw bytes of `name` after alias resolution
    pub fn open_raw(&self, name: &str) -> Result<Blob> {
        let archive = self.archive()?;
        let path = match ALIASES.get(name) {
            Some(alias) => alias.path,
            None => name,
        };
        archive.read(path)
    }

    /// Opens and decodes the resource called `name`
    pub fn open(&self, name: &str) -> Result<Resource> {
        let archive = self.archive()?;

        let Some(alias) = resolve(name) else {
            debug!(name, "opening raw resource");
            return archive.read(name).map(Resource::Raw);
        };
        let path = if alias.path.is_empty() { name } else { alias.path };
        let bytes = archive.read(path)?;
        debug!(name, path, bytes = bytes.len(), "opening resource");

        match alias.kind {
            Kind::Image { colorkey, animation } => {
                let decoded = image::load_from_memory(&bytes).map_err(|source| Error::Decode {
                    name: name.to_string(),
                    source,
                })?;
                let mut surface = Surface::from_dynamic(&decoded);
                if let Some((x, y)) = colorkey {
                    surface.key_color_at(x, y);
                }
                Ok(Resource::Image(ImageResource {
                    name: name.to_string(),
                    surface,
                    animation,
                }))
            }
            Kind::Video { fps, soundtrack } => {
                let audio = soundtrack.and_then(|track| match archive.read(track) {
                    Ok(pcm) => Some(AudioTrack::from_pcm_s16le(SOUNDTRACK_RATE, &pcm)),
                    Err(e) => {
                        warn!(name, "playing without soundtrack: {e}");
                        None
                    }
                });
                let source = GifFrames::decode(name, bytes, fps)?.with_audio(audio);
                Ok(Resource::Video(VideoResource {
                    name: name.to_string(),
                    source: Box::new(source),
                }))
            }
        }
    }
}
