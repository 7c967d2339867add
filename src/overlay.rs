//! Overlays drawn over the finished frame: the mouse cursor and debug info

use crate::{Color, Rect, Size, Surface, BLACK, GREEN, WHITE};

/// Something drawn on top of a composed frame
pub trait Overlay {
    fn draw(&self, frame: &mut Surface);

    fn is_visible(&self) -> bool;
}

/// Software mouse cursor.
pub struct CursorOverlay {
    visible: bool,
    position: (i32, i32),
    image: Surface,
}

impl CursorOverlay {
    pub fn new() -> Self {
        Self {
            visible: true,
            position: (0, 0),
            image: arrow(),
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Replaces the cursor sprite. Its colorkey decides which pixels show.
    pub fn set_image(&mut self, image: Surface) {
        self.image = image;
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.position = (x, y);
    }

    pub fn position(&self) -> (i32, i32) {
        self.position
    }
}

impl Default for CursorOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Overlay for CursorOverlay {
    fn draw(&self, frame: &mut Surface) {
        if self.visible {
            frame.blit_all(&self.image, self.position);
        }
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Built-in arrow used until a cursor image is loaded
fn arrow() -> Surface {
    const KEY: Color = image::Rgb([255, 0, 255]);
    let mut s = Surface::filled(Size::new(8, 12), KEY);
    for y in 0..12u32 {
        let width = (y + 1).min(8).min(12 - y.saturating_sub(4));
        s.fill_rect(Rect::new(0, y as i32, width, 1), WHITE);
        if width > 2 {
            s.fill_rect(Rect::new(1, y as i32, width - 2, 1), BLACK);
        }
    }
    s.set_colorkey(Some(KEY));
    s
}

/// Debug overlay: outlines every region redrawn since the last frame and
/// produces a status line with the scene name and frame rate.
#[derive(Debug, Default)]
pub struct DebugOverlay {
    enabled: bool,
    redraws: Vec<Rect>,
}

impl DebugOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    /// Records regions repainted this frame
    pub fn record(&mut self, regions: &[Rect]) {
        self.redraws.extend_from_slice(regions);
    }

    pub fn redraws(&self) -> &[Rect] {
        &self.redraws
    }

    /// Forgets the recorded regions. Called once per presented frame.
    pub fn clear(&mut self) {
        self.redraws.clear();
    }

    /// Status text shown while enabled
    pub fn status(&self, scene: &str, fps: f32) -> Option<String> {
        self.enabled.then(|| format!("scene: {scene}  fps: {fps:.1}"))
    }
}

impl Overlay for DebugOverlay {
    fn draw(&self, frame: &mut Surface) {
        if !self.enabled {
            return;
        }
        for rect in &self.redraws {
            frame.outline_rect(*rect, GREEN);
        }
    }

    fn is_visible(&self) -> bool {
        self.enabled
    }
}
