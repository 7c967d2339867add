//! Presenting frames: the terminal backend and a headless one
//!
//! The terminal backend draws two native pixel rows per terminal cell with
//! the upper half block glyph (foreground = upper pixel, background = lower
//! pixel). The native frame is scaled to the largest area with the same
//! aspect ratio and centered; the last terminal row carries a status line.

use std::collections::VecDeque;
use std::io::{stdout, Write};
use std::time::Duration;

use crossterm::{cursor, queue, terminal};
use image::Rgb;
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::input::{self, Event, TerminalSession};
use crate::{Color, Rect, Size, Surface, BLACK};

/// Where frames go and where input comes from.
pub trait Display {
    /// Size of the frames passed to `present`
    fn native_size(&self) -> Size;

    /// Every event queued since the last call, without blocking
    fn poll_events(&mut self) -> Result<Vec<Event>>;

    /// The output area changed size (terminal cells)
    fn resize(&mut self, size: Size) -> Result<()>;

    fn present(&mut self, frame: &Surface, status: &str) -> Result<()>;
}

/// One terminal cell: the upper and the lower pixel
type Cell = (Color, Color);

/// Maps the native frame onto a grid of `cols x rows` cells.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    native: Size,
    cols: u16,
    rows: u16,
    /// Area of the scaled frame on the pixel grid (two pixels per cell row)
    area: Rect,
}

impl Layout {
    fn new(native: Size, cols: u16, rows: u16) -> Self {
        // one row is kept for the status line
        let grid = Size::new(cols as u32, rows.saturating_sub(1) as u32 * 2);
        let area = Rect::sized(native).scaled_to(grid).centered_in(grid);
        Self { native, cols, rows, area }
    }

    fn frame_rows(&self) -> u16 {
        self.rows.saturating_sub(1)
    }

    /// Native coordinates under a terminal cell, clamped to the frame
    fn to_native(&self, col: u16, row: u16) -> (i32, i32) {
        if self.area.is_empty() || self.native.is_empty() {
            return (0, 0);
        }
        let px = col as i64 - self.area.left as i64;
        let py = row as i64 * 2 - self.area.top as i64;
        let x = px * self.native.width as i64 / self.area.width as i64;
        let y = py * self.native.height as i64 / self.area.height as i64;
        (
            x.clamp(0, self.native.width as i64 - 1) as i32,
            y.clamp(0, self.native.height as i64 - 1) as i32,
        )
    }

    /// Cells of one terminal row of a frame already scaled to `area`
    fn row_cells(&self, scaled: &Surface, row: u16) -> Vec<Cell> {
        let pixel = |x: i32, y: i32| {
            if self.area.contains_point(x, y) {
                scaled.get((x - self.area.left) as u32, (y - self.area.top) as u32)
            } else {
                BLACK
            }
        };
        let y = row as i32 * 2;
        (0..self.cols as i32)
            .map(|x| (pixel(x, y), pixel(x, y + 1)))
            .collect()
    }
}

/// Escape sequence drawing one row of cells at terminal row `row`, batching
/// runs of identical colors
fn encode_row(row: u16, cells: &[Cell]) -> String {
    let mut out = String::with_capacity(cells.len() * 20);
    out.push_str(&format!("\x1b[{};1H", row + 1));

    let mut current = None;
    for &cell in cells {
        if current != Some(cell) {
            let (Rgb([fr, fg, fb]), Rgb([br, bg, bb])) = cell;
            out.push_str(&format!("\x1b[38;2;{fr};{fg};{fb}m\x1b[48;2;{br};{bg};{bb}m"));
            current = Some(cell);
        }
        out.push('▀');
    }
    out.push_str("\x1b[0m");
    out
}

/// Truecolor terminal output and input.
pub struct TerminalDisplay {
    session: TerminalSession,
    layout: Layout,
    last_rows: Vec<Vec<Cell>>,
    last_status: String,
    force_full_refresh: bool,
}

impl TerminalDisplay {
    pub fn new(native: Size) -> Result<Self> {
        let session = TerminalSession::new()?;
        let (cols, rows) = session.size();
        Ok(Self {
            session,
            layout: Layout::new(native, cols, rows),
            last_rows: Vec::new(),
            last_status: String::new(),
            force_full_refresh: true,
        })
    }
}

impl Display for TerminalDisplay {
    fn native_size(&self) -> Size {
        self.layout.native
    }

    fn poll_events(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        let release = self.session.release_events();
        while let Some(raw) = self.session.poll(Duration::ZERO)? {
            let layout = self.layout;
            events.extend(input::translate(raw, release, |c, r| layout.to_native(c, r)));
        }
        Ok(events)
    }

    fn resize(&mut self, size: Size) -> Result<()> {
        let cols = size.width.min(u16::MAX as u32) as u16;
        let rows = size.height.min(u16::MAX as u32) as u16;
        self.layout = Layout::new(self.layout.native, cols, rows);
        self.force_full_refresh = true;
        debug!(cols, rows, area = %self.layout.area, "terminal resized");

        let mut out = stdout();
        queue!(out, terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))?;
        out.flush()?;
        Ok(())
    }

    fn present(&mut self, frame: &Surface, status: &str) -> Result<()> {
        let layout = self.layout;
        let scaled = frame.scaled(layout.area.size());

        if self.force_full_refresh || self.last_rows.len() != layout.frame_rows() as usize {
            self.last_rows = vec![Vec::new(); layout.frame_rows() as usize];
            self.last_status.clear();
        }

        let last_rows = &self.last_rows;
        let rendered: Vec<(Vec<Cell>, Option<String>)> = (0..layout.frame_rows())
            .into_par_iter()
            .map(|row| {
                let cells = layout.row_cells(&scaled, row);
                let changed = last_rows[row as usize] != cells;
                let encoded = changed.then(|| encode_row(row, &cells));
                (cells, encoded)
            })
            .collect();

        let mut out = stdout().lock();
        let mut changed_rows = 0;
        for (row, (cells, encoded)) in rendered.into_iter().enumerate() {
            if let Some(encoded) = encoded {
                out.write_all(encoded.as_bytes())?;
                self.last_rows[row] = cells;
                changed_rows += 1;
            }
        }

        if status != self.last_status {
            let line: String = status.chars().take(layout.cols as usize).collect();
            queue!(
                out,
                cursor::MoveTo(0, layout.frame_rows()),
                terminal::Clear(terminal::ClearType::CurrentLine)
            )?;
            out.write_all(line.as_bytes())?;
            self.last_status = status.to_string();
        }

        out.flush()?;
        self.force_full_refresh = false;
        if changed_rows > 0 {
            debug!(changed_rows, "frame presented");
        }
        Ok(())
    }
}

/// Display without a terminal. Events are scripted per frame and presented
/// frames are kept for inspection.
#[derive(Debug)]
pub struct HeadlessDisplay {
    native: Size,
    script: VecDeque<Vec<Event>>,
    presented: usize,
    last_frame: Option<Surface>,
    statuses: Vec<String>,
    resizes: Vec<Size>,
}

impl HeadlessDisplay {
    pub fn new(native: Size) -> Self {
        Self {
            native,
            script: VecDeque::new(),
            presented: 0,
            last_frame: None,
            statuses: Vec::new(),
            resizes: Vec::new(),
        }
    }

    /// Queues the events returned by one future `poll_events` call
    pub fn push_events(&mut self, events: Vec<Event>) {
        self.script.push_back(events);
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn last_frame(&self) -> Option<&Surface> {
        self.last_frame.as_ref()
    }

    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    pub fn resizes(&self) -> &[Size] {
        &self.resizes
    }
}

impl Display for HeadlessDisplay {
    fn native_size(&self) -> Size {
        self.native
    }

    fn poll_events(&mut self) -> Result<Vec<Event>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }

    fn resize(&mut self, size: Size) -> Result<()> {
        self.resizes.push(size);
        Ok(())
    }

    fn present(&mut self, frame: &Surface, status: &str) -> Result<()> {
        self.presented += 1;
        self.last_frame = Some(frame.clone());
        self.statuses.push(status.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_keeps_aspect_and_centers() {
        // 100 x 40 cells: pixel grid 100 x 78
        let layout = Layout::new(Size::new(640, 480), 100, 40);
        assert_eq!(layout.area.size(), Size::new(100, 75));
        assert_eq!(layout.area.left, 0);
        assert_eq!(layout.area.top, 2);
    }

    #[test]
    fn test_layout_maps_cells_back_to_native() {
        let layout = Layout::new(Size::new(640, 480), 100, 40);
        assert_eq!(layout.to_native(0, 0), (0, 0));
        assert_eq!(layout.to_native(50, 20), (320, 243));
        assert_eq!(layout.to_native(99, 39), (633, 479));
    }

    #[test]
    fn test_row_cells_pack_two_pixel_rows() {
        let mut frame = Surface::new(Size::new(2, 2));
        frame.set(0, 0, Rgb([255, 0, 0]));
        frame.set(0, 1, Rgb([0, 0, 255]));

        let layout = Layout::new(Size::new(2, 2), 2, 2);
        assert_eq!(layout.area, Rect::new(0, 0, 2, 2));

        let cells = layout.row_cells(&frame, 0);
        assert_eq!(cells[0], (Rgb([255, 0, 0]), Rgb([0, 0, 255])));
        assert_eq!(cells[1], (BLACK, BLACK));
    }

    #[test]
    fn test_encode_row_batches_colors() {
        let cells = vec![(BLACK, BLACK); 3];
        let encoded = encode_row(4, &cells);
        assert!(encoded.starts_with("\x1b[5;1H"));
        assert_eq!(encoded.matches("\x1b[38;2;").count(), 1);
        assert_eq!(encoded.matches('▀').count(), 3);
    }

    #[test]
    fn test_headless_display_replays_script() {
        let mut display = HeadlessDisplay::new(Size::new(4, 4));
        assert_eq!(display.native_size(), Size::new(4, 4));
        display.push_events(vec![Event::Quit]);
        assert_eq!(display.poll_events().unwrap(), vec![Event::Quit]);
        assert!(display.poll_events().unwrap().is_empty());

        display.present(&Surface::new(Size::new(4, 4)), "ok").unwrap();
        assert_eq!(display.presented(), 1);
        assert_eq!(display.statuses(), &["ok".to_string()]);
    }
}
