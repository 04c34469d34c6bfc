//! Geometry Primitives - Points, Sizes, Rects, Anchors

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(self) -> f64 {
        self.width / self.height
    }
}

/// Axis-aligned rectangle, top-left origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Half-open containment: left/top edges inclusive, right/bottom exclusive.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}

/// Which side of an axis stays fixed while a resize handle is dragged.
///
/// `Start` pins the left/top edge, so the handle sits on the far side and the
/// pointer delta applies as-is. `End` pins the right/bottom edge: the delta is
/// negated and the start coordinate is recomputed so the end edge does not
/// move. `Center` marks an axis the handle does not drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    Center,
    End,
}

impl Anchor {
    /// Multiplier applied to the raw pointer delta on this axis.
    pub fn delta_sign(self) -> f64 {
        match self {
            Anchor::Start => 1.0,
            Anchor::End => -1.0,
            Anchor::Center => 0.0,
        }
    }

    /// Start coordinate after the axis length changed from `initial_len` to `new_len`.
    pub fn reposition(self, initial_pos: f64, initial_len: f64, new_len: f64) -> f64 {
        match self {
            Anchor::End => initial_pos + (initial_len - new_len),
            Anchor::Start | Anchor::Center => initial_pos,
        }
    }
}
