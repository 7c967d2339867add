//! Rectangle and size value types

use crate::error::{Error, Result};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// An axis aligned rectangle. Position is signed so rects may hang off the
/// top-left of a surface; the size is unsigned and so never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self { left, top, width, height }
    }

    /// A rect of the given size at the origin.
    pub const fn sized(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Builds a rect from signed components, rejecting negative sizes.
    pub fn checked(left: i64, top: i64, width: i64, height: i64) -> Result<Self> {
        let coord = |v: i64, what: &str| {
            i32::try_from(v).map_err(|_| Error::InvalidArgument(format!("{what} {v} out of range")))
        };
        let extent = |v: i64, what: &str| {
            if v < 0 {
                return Err(Error::InvalidArgument(format!("{what} must be >= 0, got {v}")));
            }
            i32::try_from(v)
                .map(|v| v as u32)
                .map_err(|_| Error::InvalidArgument(format!("{what} {v} out of range")))
        };

        let rect = Self {
            left: coord(left, "left")?,
            top: coord(top, "top")?,
            width: extent(width, "width")?,
            height: extent(height, "height")?,
        };
        // far edges must be representable too
        coord(left + width, "right edge")?;
        coord(top + height, "bottom edge")?;
        Ok(rect)
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub fn right(&self) -> i32 {
        edge(self.left, self.width)
    }

    pub fn bottom(&self) -> i32 {
        edge(self.top, self.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn offset(&self) -> (i32, i32) {
        (self.left, self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.left as f64 + self.width as f64 / 2.0,
            self.top as f64 + self.height as f64 / 2.0,
        )
    }

    /// Same size, moved to the given top-left corner.
    pub fn moved_to(&self, left: i32, top: i32) -> Self {
        Self { left, top, ..*self }
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right()
            && self.right() > other.left
            && self.top < other.bottom()
            && self.bottom() > other.top
    }

    /// The overlapping area, or `None` when the rects do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }

        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(left, top, (right - left) as u32, (bottom - top) as u32))
    }

    /// Smallest rect covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        let span = |from: i32, to: i32| (to as i64 - from as i64).min(u32::MAX as i64) as u32;
        Rect::new(left, top, span(left, right), span(top, bottom))
    }

    /// Scale to the largest rect with the same aspect ratio that fits in
    /// `target`. The top-left corner is kept.
    pub fn scaled_to(&self, target: Size) -> Rect {
        if self.is_empty() {
            return *self;
        }

        let factor = (target.width as f64 / self.width as f64)
            .min(target.height as f64 / self.height as f64);

        Rect {
            width: (self.width as f64 * factor).round() as u32,
            height: (self.height as f64 * factor).round() as u32,
            ..*self
        }
    }

    /// Same size, offset so that it sits in the middle of `target`.
    pub fn centered_in(&self, target: Size) -> Rect {
        let half = |outer: u32, inner: u32| ((outer as f64 - inner as f64) / 2.0).round() as i32;

        Rect {
            left: half(target.width, self.width),
            top: half(target.height, self.height),
            ..*self
        }
    }
}

fn edge(start: i32, extent: u32) -> i32 {
    (start as i64 + extent as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl TryFrom<&[i64]> for Rect {
    type Error = Error;

    /// `[w, h]` or `[left, top, w, h]`.
    fn try_from(args: &[i64]) -> Result<Self> {
        match *args {
            [width, height] => Rect::checked(0, 0, width, height),
            [left, top, width, height] => Rect::checked(left, top, width, height),
            _ => Err(Error::InvalidArgument(format!("can not understand Rect{args:?}"))),
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect(({}, {}), ({}, {}))",
            self.left, self.top, self.width, self.height
        )
    }
}
