//! Frame composition: the native surface with overlays on top

use crate::overlay::{CursorOverlay, DebugOverlay, Overlay};
use crate::{Color, Size, Surface};

/// The native resolution frame buffer every scene draws into, and the
/// overlays composed over it before presenting.
pub struct Screen {
    native: Surface,
    cursor: CursorOverlay,
    debug: DebugOverlay,
    output: Option<Surface>,
}

impl Screen {
    pub fn new(size: Size) -> Self {
        Self {
            native: Surface::new(size),
            cursor: CursorOverlay::new(),
            debug: DebugOverlay::new(),
            output: None,
        }
    }

    pub fn size(&self) -> Size {
        self.native.size()
    }

    pub fn surface(&self) -> &Surface {
        &self.native
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.native
    }

    pub fn clear(&mut self, color: Color) {
        self.native.fill(color);
    }

    pub fn cursor(&self) -> &CursorOverlay {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut CursorOverlay {
        &mut self.cursor
    }

    pub fn debug(&self) -> &DebugOverlay {
        &self.debug
    }

    pub fn debug_mut(&mut self) -> &mut DebugOverlay {
        &mut self.debug
    }

    /// Copies the native surface and draws the visible overlays over it,
    /// debug first and cursor last. Recorded redraw regions are consumed.
    pub fn compose(&mut self) -> &Surface {
        let size = self.native.size();
        let mut frame = match self.output.take() {
            Some(previous) if previous.size() == size => previous,
            Some(previous) => {
                previous.release_to_pool();
                Surface::new_pooled(size)
            }
            None => Surface::new_pooled(size),
        };
        frame.blit_all(&self.native, (0, 0));

        let overlays: [&dyn Overlay; 2] = [&self.debug, &self.cursor];
        for overlay in overlays {
            if overlay.is_visible() {
                overlay.draw(&mut frame);
            }
        }
        self.debug.clear();

        self.output.insert(frame)
    }
}
