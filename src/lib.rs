//! Tristram: the presentation layer of a classic action RPG, rebuilt around a
//! scene stack and a dirty-rectangle scene graph.
//!
//! Provides:
//! - `Surface`, an RGB pixel buffer with colorkey blitting and pooled storage
//! - a drawable tree with node-granular damage tracking (`drawable`)
//! - image strip animations and video playback nodes (`animation`, `media`)
//! - scenes with lifecycle hooks and a LIFO scene stack (`scene`, `stack`)
//! - a resource store with an alias table over a key/bytes archive (`resources`)
//! - cursor and debug overlays composited over the frame (`overlay`, `compositor`)
//! - a terminal display backend and a headless one for tests (`renderer`, `input`)
//! - the frame-capped game loop tying it together (`game`)

use image::{DynamicImage, Rgb, RgbImage};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rayon::prelude::*;

pub mod animation;
pub mod clock;
pub mod compositor;
pub mod config;
pub mod drawable;
pub mod error;
pub mod game;
pub mod geometry;
pub mod input;
pub mod media;
pub mod overlay;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod scenes;
pub mod stack;

pub use error::{Error, Result};
pub use geometry::{Rect, Size};

/// Pixel type of every surface.
pub type Color = Rgb<u8>;

pub const BLACK: Color = Rgb([0, 0, 0]);
pub const WHITE: Color = Rgb([255, 255, 255]);
pub const GREEN: Color = Rgb([0, 255, 0]);

/// Buffers larger than this are not kept in the pool.
const POOL_MAX_PIXELS: usize = 4 * 1024 * 1024;
const POOL_MAX_BUFFERS: usize = 8;

static SURFACE_POOL: Lazy<Mutex<Vec<Vec<Color>>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Surface: a row-major matrix of RGB pixels with an optional colorkey.
///
/// Pixels equal to the colorkey are skipped when this surface is blitted onto
/// another one.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<Color>,
    colorkey: Option<Color>,
}

impl Surface {
    /// Creates a black surface
    pub fn new(size: Size) -> Self {
        Self::filled(size, BLACK)
    }

    /// Creates a surface filled with one color
    pub fn filled(size: Size, color: Color) -> Self {
        Self {
            width: size.width,
            height: size.height,
            data: vec![color; size.area() as usize],
            colorkey: None,
        }
    }

    /// Creates a black surface reusing storage from the pool when possible
    pub fn new_pooled(size: Size) -> Self {
        let len = size.area() as usize;

        let data = {
            let mut pool = SURFACE_POOL.lock();
            if let Some(mut reused) = pool.pop() {
                reused.clear();
                reused.resize(len, BLACK);
                reused
            } else {
                vec![BLACK; len]
            }
        };

        Self {
            width: size.width,
            height: size.height,
            data,
            colorkey: None,
        }
    }

    /// Hands the pixel storage back to the pool
    pub fn release_to_pool(mut self) {
        if self.data.capacity() <= POOL_MAX_PIXELS {
            let mut pool = SURFACE_POOL.lock();
            if pool.len() < POOL_MAX_BUFFERS {
                self.data.clear();
                pool.push(self.data);
            }
        }
    }

    pub fn from_rgb_image(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.pixels().copied().collect(),
            colorkey: None,
        }
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgb_image(&image.to_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn rect(&self) -> Rect {
        Rect::sized(self.size())
    }

    pub fn pixels(&self) -> &[Color] {
        &self.data
    }

    pub fn colorkey(&self) -> Option<Color> {
        self.colorkey
    }

    pub fn set_colorkey(&mut self, colorkey: Option<Color>) {
        self.colorkey = colorkey;
    }

    /// Keys out the color found at `(x, y)`, wrapping negative and
    /// out-of-range coordinates around the surface size. `(0, -1)` picks the
    /// bottom-left pixel.
    pub fn key_color_at(&mut self, x: i32, y: i32) {
        if self.data.is_empty() {
            return;
        }
        let px = x.rem_euclid(self.width as i32) as u32;
        let py = y.rem_euclid(self.height as i32) as u32;
        self.colorkey = Some(self.get(px, py));
    }

    /// Pixel at `(x, y)`, black outside the surface
    pub fn get(&self, x: u32, y: u32) -> Color {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize]
        } else {
            BLACK
        }
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = color;
        }
    }

    pub fn fill(&mut self, color: Color) {
        self.data.fill(color);
    }

    /// Fills the part of `rect` that lies on this surface
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(area) = rect.intersection(&self.rect()) else {
            return;
        };

        for y in area.top..area.bottom() {
            let start = (y as u32 * self.width + area.left as u32) as usize;
            self.data[start..start + area.width as usize].fill(color);
        }
    }

    /// Draws a one pixel border along the inside of `rect`
    pub fn outline_rect(&mut self, rect: Rect, color: Color) {
        if rect.is_empty() {
            return;
        }

        let (right, bottom) = (rect.right() - 1, rect.bottom() - 1);
        self.fill_rect(Rect::new(rect.left, rect.top, rect.width, 1), color);
        self.fill_rect(Rect::new(rect.left, bottom, rect.width, 1), color);
        self.fill_rect(Rect::new(rect.left, rect.top, 1, rect.height), color);
        self.fill_rect(Rect::new(right, rect.top, 1, rect.height), color);
    }

    /// Copies the `area` of `src` so that its top-left lands on `dest`.
    ///
    /// Both the source area and the destination are clipped; source pixels
    /// equal to the source colorkey are left out.
    pub fn blit(&mut self, src: &Surface, area: Rect, dest: (i32, i32)) {
        let Some(clipped) = area.intersection(&src.rect()) else {
            return;
        };
        let dest_x = dest.0 + (clipped.left - area.left);
        let dest_y = dest.1 + (clipped.top - area.top);

        let Some(target) = Rect::new(dest_x, dest_y, clipped.width, clipped.height)
            .intersection(&self.rect())
        else {
            return;
        };

        let src_x = (clipped.left + (target.left - dest_x)) as u32;
        let src_y = (clipped.top + (target.top - dest_y)) as u32;
        let run = target.width as usize;

        for row in 0..target.height {
            let s = ((src_y + row) * src.width + src_x) as usize;
            let d = ((target.top as u32 + row) * self.width + target.left as u32) as usize;
            let src_row = &src.data[s..s + run];
            let dst_row = &mut self.data[d..d + run];

            match src.colorkey {
                None => dst_row.copy_from_slice(src_row),
                Some(key) => {
                    for (dst, &px) in dst_row.iter_mut().zip(src_row) {
                        if px != key {
                            *dst = px;
                        }
                    }
                }
            }
        }
    }

    /// Blits the whole of `src` at `dest`
    pub fn blit_all(&mut self, src: &Surface, dest: (i32, i32)) {
        self.blit(src, src.rect(), dest);
    }

    /// Copies out the part of `rect` that lies on this surface. The colorkey
    /// is carried over.
    pub fn sub_surface(&self, rect: Rect) -> Surface {
        let mut out = Surface::new(rect.size());
        out.colorkey = self.colorkey;
        let Some(area) = rect.intersection(&self.rect()) else {
            return out;
        };

        let (dx, dy) = ((area.left - rect.left) as u32, (area.top - rect.top) as u32);
        let run = area.width as usize;
        for row in 0..area.height {
            let s = ((area.top as u32 + row) * self.width + area.left as u32) as usize;
            let d = ((dy + row) * out.width + dx) as usize;
            out.data[d..d + run].copy_from_slice(&self.data[s..s + run]);
        }
        out
    }

    /// Nearest-neighbour resize. The colorkey is carried over.
    pub fn scaled(&self, size: Size) -> Surface {
        if size == self.size() {
            return self.clone();
        }

        let mut out = Surface::new(size);
        out.colorkey = self.colorkey;
        if self.data.is_empty() || size.is_empty() {
            return out;
        }

        let (sw, sh) = (self.width as u64, self.height as u64);
        let (dw, dh) = (size.width as u64, size.height as u64);

        out.data
            .par_chunks_mut(size.width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                let sy = (y as u64 * sh / dh) as usize;
                let src_row = &self.data[sy * sw as usize..(sy + 1) * sw as usize];
                for (x, px) in row.iter_mut().enumerate() {
                    *px = src_row[(x as u64 * sw / dw) as usize];
                }
            });

        out
    }
}
