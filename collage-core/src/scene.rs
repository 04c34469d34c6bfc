//! Scene/View Synchronizer
//!
//! The scene is a projection of the model into view pixels. It never mutates
//! the model; callers push model state in with `sync` / `sync_placement`
//! right after each mutation.

use std::path::{Path, PathBuf};

use crate::geometry::{Point, Rect, Size};
use crate::gesture::Handle;
use crate::model::{Canvas, Collage, ImagePlacement, PlacementId};

/// Side of a square resize handle, in view pixels.
pub const DEFAULT_HANDLE_SIZE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affordance {
    pub handle: Handle,
    pub hit_rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    placement: PlacementId,
    source: PathBuf,
    bounds: Rect,
    affordances: Vec<Affordance>,
}

impl ViewNode {
    pub fn placement(&self) -> PlacementId {
        self.placement
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Bounds in view pixels.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Eight resize handles followed by the body.
    pub fn affordances(&self) -> &[Affordance] {
        &self.affordances
    }

    pub fn affordance(&self, handle: Handle) -> Option<&Affordance> {
        self.affordances.iter().find(|a| a.handle == handle)
    }
}

fn hit_priority(handle: Handle) -> u8 {
    match handle {
        h if h.is_corner() => 0,
        Handle::Body => 2,
        _ => 1,
    }
}

/// Hit rectangle of a resize handle on bounds `b`; `None` for the body.
fn handle_rect(handle: Handle, b: Rect, side: f64) -> Option<Rect> {
    let left = b.x;
    let top = b.y;
    let right = b.right() - side;
    let bottom = b.bottom() - side;

    let rect = match handle {
        Handle::Body => return None,
        Handle::Top => Rect::new(left, top, b.width, side),
        Handle::Bottom => Rect::new(left, bottom, b.width, side),
        Handle::Left => Rect::new(left, top, side, b.height),
        Handle::Right => Rect::new(right, top, side, b.height),
        Handle::TopLeft => Rect::new(left, top, side, side),
        Handle::TopRight => Rect::new(right, top, side, side),
        Handle::BottomLeft => Rect::new(left, bottom, side, side),
        Handle::BottomRight => Rect::new(right, bottom, side, side),
    };
    Some(rect)
}

fn layout_affordances(b: Rect, side: f64) -> Vec<Affordance> {
    Handle::RESIZE
        .into_iter()
        .filter_map(|handle| {
            handle_rect(handle, b, side).map(|hit_rect| Affordance { handle, hit_rect })
        })
        .chain(std::iter::once(Affordance {
            handle: Handle::Body,
            hit_rect: b,
        }))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    canvas_size: Size,
    background: [u8; 4],
    view_scale: f64,
    handle_size: f64,
    nodes: Vec<ViewNode>,
    revision: u64,
}

impl Scene {
    pub fn new(canvas: &Canvas) -> Self {
        Self {
            canvas_size: Size::new(f64::from(canvas.width()), f64::from(canvas.height())),
            background: canvas.background().rgba(),
            view_scale: 1.0,
            handle_size: DEFAULT_HANDLE_SIZE,
            nodes: vec![],
            revision: 0,
        }
    }

    pub fn from_collage(collage: &Collage) -> Self {
        let mut scene = Self::new(collage.canvas());
        scene.sync(collage);
        scene
    }

    pub fn with_handle_size(mut self, side: f64) -> Self {
        if side.is_finite() && side > 0.0 {
            self.handle_size = side;
            self.relayout();
        }
        self
    }

    pub fn view_scale(&self) -> f64 {
        self.view_scale
    }

    /// Change the display scale and re-project every node from `collage`.
    /// Non-positive or non-finite scales are ignored.
    pub fn set_view_scale(&mut self, scale: f64, collage: &Collage) {
        if !(scale.is_finite() && scale > 0.0) {
            tracing::warn!(scale, "ignoring invalid view scale");
            return;
        }
        self.view_scale = scale;
        self.sync(collage);
    }

    pub fn background(&self) -> [u8; 4] {
        self.background
    }

    /// Logical canvas size, in model units.
    pub fn canvas_size(&self) -> Size {
        self.canvas_size
    }

    /// Canvas size in whole view pixels.
    pub fn view_pixel_size(&self) -> (u32, u32) {
        let w = (self.canvas_size.width * self.view_scale).round();
        let h = (self.canvas_size.height * self.view_scale).round();
        (w as u32, h as u32)
    }

    /// Nodes in paint order.
    pub fn nodes(&self) -> &[ViewNode] {
        &self.nodes
    }

    pub fn node(&self, id: PlacementId) -> Option<&ViewNode> {
        self.nodes.iter().find(|n| n.placement == id)
    }

    /// Bumped on every sync; lets hosts skip redraws.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Rebuild every node from the collage, in collage order.
    pub fn sync(&mut self, collage: &Collage) {
        self.canvas_size = Size::new(
            f64::from(collage.canvas().width()),
            f64::from(collage.canvas().height()),
        );
        self.background = collage.canvas().background().rgba();
        self.nodes = collage
            .placements()
            .iter()
            .map(|p| self.project(p))
            .collect();
        self.revision += 1;
        tracing::trace!(nodes = self.nodes.len(), revision = self.revision, "scene synced");
    }

    /// Update the node for one placement, appending it if new.
    pub fn sync_placement(&mut self, placement: &ImagePlacement) {
        let node = self.project(placement);
        match self.nodes.iter_mut().find(|n| n.placement == node.placement) {
            Some(existing) => *existing = node,
            None => self.nodes.push(node),
        }
        self.revision += 1;
    }

    pub fn remove(&mut self, id: PlacementId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.placement != id);
        let removed = self.nodes.len() != before;
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// Topmost placement and handle under a view-space point.
    pub fn hit_test(&self, point: Point) -> Option<(PlacementId, Handle)> {
        self.nodes.iter().rev().find_map(|node| {
            node.affordances
                .iter()
                .filter(|a| a.hit_rect.contains(point))
                .min_by_key(|a| hit_priority(a.handle))
                .map(|a| (node.placement, a.handle))
        })
    }

    fn project(&self, placement: &ImagePlacement) -> ViewNode {
        let bounds = placement.bounds().scaled(self.view_scale);
        ViewNode {
            placement: placement.id(),
            source: placement.file_path().to_path_buf(),
            bounds,
            affordances: layout_affordances(bounds, self.handle_size),
        }
    }

    fn relayout(&mut self) {
        for node in &mut self.nodes {
            node.affordances = layout_affordances(node.bounds, self.handle_size);
        }
    }
}
