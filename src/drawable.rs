//! The drawable tree and its dirty-rectangle redraw
//!
//! Every node owns its children. A node's `rect` is relative to its parent;
//! traversals pass the parent's absolute origin down, so all rects produced
//! by `update` and `draw` are absolute (native surface) coordinates.
//!
//! Damage is tracked per node: a dirty node repaints its whole rect, and a
//! dirty ancestor repaints its whole rect no matter which descendant changed.

use tracing::trace;

use crate::animation::{StripAnimation, VideoPlayback};
use crate::media::{AudioSink, FrameSource};
use crate::{Color, Rect, Size, Surface};

/// Per-frame input to node updates.
pub struct FrameContext<'a> {
    /// Milliseconds since the previous frame
    pub dt_ms: u64,
    pub audio: &'a mut dyn AudioSink,
}

/// Time dependent behaviour of a node.
pub trait Behavior {
    /// Advances by `ctx.dt_ms`. Returns the node's new pixels when they
    /// changed this frame.
    fn on_update(&mut self, ctx: &mut FrameContext<'_>) -> Option<Surface>;

    /// True once a finite behaviour has nothing more to show
    fn finished(&self) -> bool {
        false
    }

    fn frame_index(&self) -> Option<usize> {
        None
    }
}

/// A node of the drawable tree.
pub struct Drawable {
    name: Option<String>,
    rect: Rect,
    surface: Option<Surface>,
    dirty: bool,
    transparent: bool,
    children: Vec<Drawable>,
    behavior: Option<Box<dyn Behavior>>,
    /// Regions this node repaints on the next draw
    redraw: Vec<Rect>,
    /// Whether this node or a descendant has regions to repaint
    pending: bool,
}

impl Drawable {
    fn with_parts(rect: Rect, surface: Option<Surface>, transparent: bool) -> Self {
        Self {
            name: None,
            rect,
            surface,
            dirty: false,
            transparent,
            children: Vec::new(),
            behavior: None,
            redraw: Vec::new(),
            pending: false,
        }
    }

    /// A node without pixels of its own, used to group children. It lets
    /// whatever lies below show through, so it is transparent.
    pub fn container(size: Size) -> Self {
        Self::with_parts(Rect::sized(size), None, true)
    }

    /// A static image. Colorkeyed images are transparent.
    pub fn image(surface: Surface) -> Self {
        let transparent = surface.colorkey().is_some();
        Self::with_parts(surface.rect(), Some(surface), transparent)
    }

    /// An opaque rectangle of one color
    pub fn solid(size: Size, color: Color) -> Self {
        Self::image(Surface::filled(size, color))
    }

    /// A looping animation cut from a vertical strip of `count` frames.
    pub fn animated(strip: &Surface, count: u32, fps: f64) -> Self {
        let animation = StripAnimation::new(strip, count, fps);
        let mut node = Self::image(animation.current_frame().clone());
        node.behavior = Some(Box::new(animation));
        node
    }

    /// A video node showing the first frame of `source` right away.
    pub fn video(mut source: Box<dyn FrameSource>) -> Self {
        let first = source
            .next_frame()
            .unwrap_or_else(|| Surface::new(source.size()));
        let mut node = Self::image(first);
        node.behavior = Some(Box::new(VideoPlayback::new(source)));
        node
    }

    /// A node driven by a custom behaviour.
    pub fn with_behavior(mut self, behavior: Box<dyn Behavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_position(mut self, left: i32, top: i32) -> Self {
        self.rect = self.rect.moved_to(left, top);
        self
    }

    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Position relative to the parent, and size
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Moves and resizes the node. The surface is rescaled when the size
    /// changes. The node becomes dirty.
    pub fn set_rect(&mut self, rect: Rect) {
        if rect.size() != self.rect.size() {
            if let Some(surface) = &self.surface {
                self.surface = Some(surface.scaled(rect.size()));
            }
        }
        self.rect = rect;
        self.dirty = true;
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forces a full repaint of this node on the next frame
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn children(&self) -> &[Drawable] {
        &self.children
    }

    /// Depth-first search by name
    pub fn find(&self, name: &str) -> Option<&Drawable> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Drawable> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }

    /// Current frame of an animation or video node
    pub fn frame_index(&self) -> Option<usize> {
        self.behavior.as_ref().and_then(|b| b.frame_index())
    }

    /// True when a finite behaviour in this subtree has run out
    pub fn finished(&self) -> bool {
        self.behavior.as_ref().is_some_and(|b| b.finished())
            || self.children.iter().any(Drawable::finished)
    }

    /// Appends `child`, placing it at `position` (relative to this node)
    /// when given. The child is marked dirty so it gets drawn once.
    pub fn add_child(&mut self, mut child: Drawable, position: Option<(i32, i32)>) {
        if let Some((left, top)) = position {
            child.rect = child.rect.moved_to(left, top);
        }
        child.dirty = true;
        self.children.push(child);
    }

    /// Removes and returns the child at `index`. This node becomes dirty so
    /// the area the child covered is repainted on the next frame.
    pub fn remove_child(&mut self, index: usize) -> Option<Drawable> {
        let child = (index < self.children.len()).then(|| self.children.remove(index))?;
        self.dirty = true;
        Some(child)
    }

    /// Runs the node's behaviour; new pixels replace the surface (scaled to
    /// the node size) and mark the node dirty.
    pub fn on_update(&mut self, ctx: &mut FrameContext<'_>) {
        let Some(behavior) = self.behavior.as_mut() else {
            return;
        };

        if let Some(mut frame) = behavior.on_update(ctx) {
            if frame.size() != self.rect.size() {
                frame = frame.scaled(self.rect.size());
            }
            if frame.colorkey().is_none() {
                frame.set_colorkey(self.surface.as_ref().and_then(Surface::colorkey));
            }
            self.surface = Some(frame);
            self.dirty = true;
        }
    }

    /// Advances this subtree by one frame and works out what to repaint.
    ///
    /// `origin` is the parent's absolute top-left. Returns the regions the
    /// parent has to repaint underneath this node, which is empty unless the
    /// node is transparent.
    pub fn update(&mut self, ctx: &mut FrameContext<'_>, origin: (i32, i32)) -> Vec<Rect> {
        self.on_update(ctx);

        let abs = self.rect.translate(origin.0, origin.1);
        let mut dirty = Vec::new();
        let mut pending = false;
        for child in &mut self.children {
            dirty.extend(child.update(ctx, (abs.left, abs.top)));
            pending |= child.pending;
        }

        if self.dirty {
            dirty = vec![abs];
            self.dirty = false;
        }

        self.pending = pending || !dirty.is_empty();
        self.redraw = dirty;

        if self.transparent {
            self.redraw.clone()
        } else {
            Vec::new()
        }
    }

    /// Regions computed by the last `update` for this node alone
    pub fn redraw_regions(&self) -> &[Rect] {
        &self.redraw
    }

    /// Every region the next `draw` repaints, across the subtree
    pub fn damage(&self) -> Vec<Rect> {
        let mut out = Vec::new();
        self.collect_damage(&mut out);
        out
    }

    fn collect_damage(&self, out: &mut Vec<Rect>) {
        for rect in &self.redraw {
            push_unique(out, *rect);
        }
        for child in &self.children {
            child.collect_damage(out);
        }
    }

    /// Repaints this subtree into `target`.
    ///
    /// The node paints its own redraw regions plus the incoming `rects`
    /// clipped to its rect. Children repaint wherever they intersect what was
    /// painted before them (parent and earlier siblings), and wherever their
    /// own update asked for. Returns every region painted.
    pub fn draw(&mut self, target: &mut Surface, rects: &[Rect], origin: (i32, i32)) -> Vec<Rect> {
        let abs = self.rect.translate(origin.0, origin.1);

        let mut painted = std::mem::take(&mut self.redraw);
        for rect in rects {
            if let Some(clipped) = rect.intersection(&abs) {
                push_unique(&mut painted, clipped);
            }
        }

        if let Some(surface) = &self.surface {
            for region in &painted {
                let area = region.translate(-abs.left, -abs.top);
                target.blit(surface, area, (region.left, region.top));
            }
        }

        for child in &mut self.children {
            let child_abs = child.rect.translate(abs.left, abs.top);
            let clipped: Vec<Rect> = painted
                .iter()
                .filter_map(|r| r.intersection(&child_abs))
                .collect();

            if clipped.is_empty() && !child.pending {
                continue;
            }

            for region in child.draw(target, &clipped, (abs.left, abs.top)) {
                push_unique(&mut painted, region);
            }
        }

        self.pending = false;
        if !painted.is_empty() {
            trace!(node = self.name.as_deref().unwrap_or("-"), regions = painted.len(), "drawn");
        }
        painted
    }
}

impl std::fmt::Debug for Drawable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drawable")
            .field("name", &self.name)
            .field("rect", &self.rect)
            .field("dirty", &self.dirty)
            .field("transparent", &self.transparent)
            .field("children", &self.children)
            .finish()
    }
}

fn push_unique(out: &mut Vec<Rect>, rect: Rect) {
    if !rect.is_empty() && !out.contains(&rect) {
        out.push(rect);
    }
}
