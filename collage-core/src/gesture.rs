//! Gesture Interpreter - Handle Table and Gesture Sessions
//!
//! Every Running update is recomputed from the snapshot taken at Started.
//! Nothing accumulates between updates, so dropped or repeated updates only
//! ever leave the result of the latest one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Anchor, Point, Size};
use crate::model::{ImagePlacement, PlacementId};

#[derive(Debug, Error, PartialEq)]
pub enum GestureError {
    #[error("Unknown handle: {0}")]
    UnknownHandle(String),

    #[error("{update} update does not apply to a {kind} gesture")]
    UpdateMismatch {
        kind: &'static str,
        update: &'static str,
    },
}

/// Interactive affordance that can start a gesture on a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Handle {
    Body,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Axis flags and anchors wired to a resize handle.
///
/// The adjust flags only matter for edges; corners always recompute both
/// axes through the aspect-locked path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleConfig {
    pub adjust_width: bool,
    pub adjust_height: bool,
    pub anchor_x: Anchor,
    pub anchor_y: Anchor,
}

const fn handle_config(
    adjust_width: bool,
    adjust_height: bool,
    anchor_x: Anchor,
    anchor_y: Anchor,
) -> HandleConfig {
    HandleConfig {
        adjust_width,
        adjust_height,
        anchor_x,
        anchor_y,
    }
}

impl Handle {
    /// Resize handles in the order they are attached to a node.
    pub const RESIZE: [Handle; 8] = [
        Handle::Top,
        Handle::Bottom,
        Handle::Left,
        Handle::Right,
        Handle::BottomRight,
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
    ];

    /// Handle lookup table. `None` for the body, which moves instead of resizing.
    pub const fn config(self) -> Option<HandleConfig> {
        use Anchor::{Center, End, Start};

        let cfg = match self {
            Handle::Body => return None,
            Handle::Top => handle_config(false, true, Center, End),
            Handle::Bottom => handle_config(false, true, Center, Start),
            Handle::Left => handle_config(true, false, End, Center),
            Handle::Right => handle_config(true, false, Start, Center),
            Handle::BottomRight => handle_config(true, true, Start, Start),
            Handle::TopLeft => handle_config(true, true, End, End),
            Handle::TopRight => handle_config(true, false, Start, End),
            Handle::BottomLeft => handle_config(false, true, End, Start),
        };
        Some(cfg)
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Handle::TopLeft | Handle::TopRight | Handle::BottomLeft | Handle::BottomRight
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Handle::Body => "body",
            Handle::Top => "top",
            Handle::Bottom => "bottom",
            Handle::Left => "left",
            Handle::Right => "right",
            Handle::TopLeft => "top-left",
            Handle::TopRight => "top-right",
            Handle::BottomLeft => "bottom-left",
            Handle::BottomRight => "bottom-right",
        }
    }

    /// Gesture algorithm a drag on this handle runs.
    pub fn gesture_kind(self) -> GestureKind {
        match self.config() {
            None => GestureKind::Move,
            Some(cfg) if self.is_corner() => GestureKind::CornerResize {
                anchor_x: cfg.anchor_x,
                anchor_y: cfg.anchor_y,
            },
            Some(cfg) => GestureKind::EdgeResize(cfg),
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Handle {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        std::iter::once(Handle::Body)
            .chain(Handle::RESIZE)
            .find(|h| h.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GestureError::UnknownHandle(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    CornerResize { anchor_x: Anchor, anchor_y: Anchor },
    EdgeResize(HandleConfig),
    Pinch,
}

impl GestureKind {
    pub fn name(&self) -> &'static str {
        match self {
            GestureKind::Move => "move",
            GestureKind::CornerResize { .. } => "corner-resize",
            GestureKind::EdgeResize(_) => "edge-resize",
            GestureKind::Pinch => "pinch",
        }
    }
}

/// Cumulative input since the gesture started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GestureUpdate {
    Pan { total_x: f64, total_y: f64 },
    Pinch { scale: f64 },
}

impl GestureUpdate {
    /// Convert pan totals from view pixels to canvas units. Pinch scales are unitless.
    pub fn in_canvas_units(self, view_scale: f64) -> Self {
        match self {
            GestureUpdate::Pan { total_x, total_y } => GestureUpdate::Pan {
                total_x: total_x / view_scale,
                total_y: total_y / view_scale,
            },
            pinch => pinch,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            GestureUpdate::Pan { .. } => "pan",
            GestureUpdate::Pinch { .. } => "pinch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePhase {
    Started,
    Running(GestureUpdate),
    Completed,
    Cancelled,
}

/// Geometry captured at gesture start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub position: Point,
    pub size: Size,
    pub min_size: f64,
}

impl Snapshot {
    pub fn of(placement: &ImagePlacement) -> Self {
        Self {
            position: placement.position(),
            size: placement.size(),
            min_size: placement.min_size(),
        }
    }
}

/// State of one active gesture on one placement.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    placement: PlacementId,
    kind: GestureKind,
    snapshot: Snapshot,
    aspect_ratio: f64,
    snap_grid: Option<f64>,
}

impl GestureSession {
    pub fn begin(kind: GestureKind, placement: &ImagePlacement) -> Self {
        let snapshot = Snapshot::of(placement);
        Self {
            placement: placement.id(),
            kind,
            aspect_ratio: snapshot.size.aspect_ratio(),
            snapshot,
            snap_grid: None,
        }
    }

    /// Round Move results to multiples of `grid`. Ignored for other kinds.
    pub fn with_snap_grid(mut self, grid: Option<f64>) -> Self {
        self.snap_grid = grid.filter(|g| g.is_finite() && *g > 0.0);
        self
    }

    pub fn placement(&self) -> PlacementId {
        self.placement
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Geometry for `update`, computed from the snapshot only.
    pub fn compute(&self, update: GestureUpdate) -> Result<(Point, Size), GestureError> {
        let s = &self.snapshot;
        match (self.kind, update) {
            (GestureKind::Move, GestureUpdate::Pan { total_x, total_y }) => {
                let mut position = move_position(s, total_x, total_y);
                if let Some(grid) = self.snap_grid {
                    position = Point::new(
                        snap_to_grid(position.x, grid),
                        snap_to_grid(position.y, grid),
                    );
                }
                Ok((position, s.size))
            }
            (
                GestureKind::CornerResize { anchor_x, anchor_y },
                GestureUpdate::Pan { total_x, total_y },
            ) => Ok(corner_resize(
                s,
                self.aspect_ratio,
                anchor_x,
                anchor_y,
                total_x,
                total_y,
            )),
            (GestureKind::EdgeResize(cfg), GestureUpdate::Pan { total_x, total_y }) => {
                Ok(edge_resize(s, cfg, total_x, total_y))
            }
            (GestureKind::Pinch, GestureUpdate::Pinch { scale }) => Ok(pinch(s, scale)),
            (kind, update) => Err(GestureError::UpdateMismatch {
                kind: kind.name(),
                update: update.name(),
            }),
        }
    }

    /// Compute and write the result into `placement`.
    pub fn apply(
        &self,
        update: GestureUpdate,
        placement: &mut ImagePlacement,
    ) -> Result<(), GestureError> {
        let (position, size) = self.compute(update)?;
        placement.set_size(size.width, size.height);
        placement.set_position(position.x, position.y);
        Ok(())
    }

    /// Roll `placement` back to the snapshot and end the session.
    pub fn cancel(self, placement: &mut ImagePlacement) {
        placement.restore(self.snapshot.position, self.snapshot.size);
    }
}

pub fn move_position(s: &Snapshot, total_x: f64, total_y: f64) -> Point {
    s.position.offset(total_x, total_y)
}

/// Aspect-locked resize driven by whichever signed axis delta is larger.
pub fn corner_resize(
    s: &Snapshot,
    aspect_ratio: f64,
    anchor_x: Anchor,
    anchor_y: Anchor,
    total_x: f64,
    total_y: f64,
) -> (Point, Size) {
    let dx = total_x * anchor_x.delta_sign();
    let dy = total_y * anchor_y.delta_sign();
    let driving = if dx.abs() > dy.abs() { dx } else { dy };

    let width = (s.size.width + driving).max(s.min_size);
    let height = (width / aspect_ratio).max(s.min_size);

    let position = Point::new(
        anchor_x.reposition(s.position.x, s.size.width, width),
        anchor_y.reposition(s.position.y, s.size.height, height),
    );
    (position, Size::new(width, height))
}

/// Independent-axis resize; only the axes the handle adjusts change.
pub fn edge_resize(s: &Snapshot, cfg: HandleConfig, total_x: f64, total_y: f64) -> (Point, Size) {
    let dx = if cfg.adjust_width {
        total_x * cfg.anchor_x.delta_sign()
    } else {
        0.0
    };
    let dy = if cfg.adjust_height {
        total_y * cfg.anchor_y.delta_sign()
    } else {
        0.0
    };

    let width = (s.size.width + dx).max(s.min_size);
    let height = (s.size.height + dy).max(s.min_size);

    let position = Point::new(
        cfg.anchor_x.reposition(s.position.x, s.size.width, width),
        cfg.anchor_y.reposition(s.position.y, s.size.height, height),
    );
    (position, Size::new(width, height))
}

/// Uniform scale of the snapshot size; top-left stays put.
/// Uniform scale from the snapshot. A non-finite scale leaves the snapshot as is.
pub fn pinch(s: &Snapshot, scale: f64) -> (Point, Size) {
    if !scale.is_finite() {
        return (s.position, s.size);
    }
    let width = (s.size.width * scale).max(s.min_size);
    let height = (s.size.height * scale).max(s.min_size);
    (s.position, Size::new(width, height))
}

pub fn snap_to_grid(value: f64, grid: f64) -> f64 {
    (value / grid).round() * grid
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn placement_at(x: f64, y: f64, w: f64, h: f64) -> ImagePlacement {
        ImagePlacement::new("p.png", Size::new(w, h), Point::new(x, y))
    }

    fn pan(total_x: f64, total_y: f64) -> GestureUpdate {
        GestureUpdate::Pan { total_x, total_y }
    }

    #[test]
    fn test_handle_table_matches_layout() {
        let right = Handle::Right.config().unwrap();
        assert!(right.adjust_width && !right.adjust_height);
        assert_eq!((right.anchor_x, right.anchor_y), (Anchor::Start, Anchor::Center));

        let top = Handle::Top.config().unwrap();
        assert!(!top.adjust_width && top.adjust_height);
        assert_eq!((top.anchor_x, top.anchor_y), (Anchor::Center, Anchor::End));

        let tr = Handle::TopRight.config().unwrap();
        assert_eq!((tr.anchor_x, tr.anchor_y), (Anchor::Start, Anchor::End));

        let bl = Handle::BottomLeft.config().unwrap();
        assert_eq!((bl.anchor_x, bl.anchor_y), (Anchor::End, Anchor::Start));

        assert!(Handle::Body.config().is_none());
        assert_eq!(Handle::Body.gesture_kind(), GestureKind::Move);
    }

    #[test]
    fn test_handle_names_round_trip() {
        for handle in std::iter::once(Handle::Body).chain(Handle::RESIZE) {
            assert_eq!(handle.name().parse::<Handle>().unwrap(), handle);
        }
        assert!("middle".parse::<Handle>().is_err());
    }

    #[test]
    fn test_bottom_right_corner_uses_larger_delta() {
        let p = placement_at(0.0, 0.0, 300.0, 300.0);
        let session = GestureSession::begin(Handle::BottomRight.gesture_kind(), &p);
        let (pos, size) = session.compute(pan(100.0, 20.0)).unwrap();
        assert_eq!(size, Size::new(400.0, 400.0));
        assert_eq!(pos, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_top_left_corner_keeps_bottom_right_fixed() {
        let p = placement_at(100.0, 100.0, 200.0, 100.0);
        let session = GestureSession::begin(Handle::TopLeft.gesture_kind(), &p);
        // Dragging up-left grows the placement
        let (pos, size) = session.compute(pan(-40.0, -10.0)).unwrap();
        assert!((size.width - 240.0).abs() < EPS);
        assert!((size.height - 120.0).abs() < EPS);
        assert!((pos.x + size.width - 300.0).abs() < EPS);
        assert!((pos.y + size.height - 200.0).abs() < EPS);
    }

    #[test]
    fn test_top_right_corner_pins_left_and_bottom() {
        let p = placement_at(10.0, 20.0, 200.0, 100.0);
        let session = GestureSession::begin(Handle::TopRight.gesture_kind(), &p);
        let (pos, size) = session.compute(pan(50.0, 0.0)).unwrap();
        assert!((size.width - 250.0).abs() < EPS);
        assert!((size.height - 125.0).abs() < EPS);
        assert_eq!(pos.x, 10.0);
        assert!((pos.y + size.height - 120.0).abs() < EPS);
    }

    #[test]
    fn test_vertical_delta_can_drive_corner() {
        let p = placement_at(0.0, 0.0, 200.0, 100.0);
        let session = GestureSession::begin(Handle::BottomRight.gesture_kind(), &p);
        let (_, size) = session.compute(pan(5.0, 30.0)).unwrap();
        // Driving delta 30 applies to width; height follows the ratio
        assert!((size.width - 230.0).abs() < EPS);
        assert!((size.height - 115.0).abs() < EPS);
    }

    #[test]
    fn test_left_edge_negates_delta_and_moves_x() {
        let p = placement_at(0.0, 0.0, 300.0, 300.0);
        let session = GestureSession::begin(Handle::Left.gesture_kind(), &p);
        let (pos, size) = session.compute(pan(-30.0, 80.0)).unwrap();
        assert_eq!(size, Size::new(330.0, 300.0));
        assert_eq!(pos, Point::new(-30.0, 0.0));
    }

    #[test]
    fn test_top_edge_clamped_keeps_bottom_fixed() {
        let p = placement_at(0.0, 100.0, 300.0, 80.0);
        let session = GestureSession::begin(Handle::Top.gesture_kind(), &p);
        let (pos, size) = session.compute(pan(0.0, 70.0)).unwrap();
        assert_eq!(size, Size::new(300.0, 50.0));
        assert_eq!(pos.y + size.height, 180.0);
    }

    #[test]
    fn test_shrink_clamps_to_min_bound() {
        let p = placement_at(0.0, 0.0, 60.0, 60.0);
        let session = GestureSession::begin(Handle::Right.gesture_kind(), &p);
        let (_, size) = session.compute(pan(-40.0, 0.0)).unwrap();
        assert_eq!(size.width, 50.0);

        let session = GestureSession::begin(Handle::BottomRight.gesture_kind(), &p);
        let (_, size) = session.compute(pan(-40.0, -10.0)).unwrap();
        assert_eq!(size, Size::new(50.0, 50.0));
    }

    #[test]
    fn test_running_updates_do_not_compound() {
        let mut p = placement_at(0.0, 0.0, 300.0, 300.0);
        let session = GestureSession::begin(Handle::Right.gesture_kind(), &p);
        session.apply(pan(10.0, 0.0), &mut p).unwrap();
        session.apply(pan(10.0, 0.0), &mut p).unwrap();
        session.apply(pan(10.0, 0.0), &mut p).unwrap();
        assert_eq!(p.width(), 310.0);
    }

    #[test]
    fn test_move_snaps_to_grid() {
        let p = placement_at(0.0, 0.0, 100.0, 100.0);
        let session = GestureSession::begin(GestureKind::Move, &p).with_snap_grid(Some(10.0));
        let (pos, size) = session.compute(pan(14.0, 26.0)).unwrap();
        assert_eq!(pos, Point::new(10.0, 30.0));
        assert_eq!(size, Size::new(100.0, 100.0));
    }

    #[test]
    fn test_pinch_scales_from_snapshot() {
        let mut p = placement_at(5.0, 5.0, 200.0, 100.0);
        let session = GestureSession::begin(GestureKind::Pinch, &p);
        session.apply(GestureUpdate::Pinch { scale: 1.5 }, &mut p).unwrap();
        session.apply(GestureUpdate::Pinch { scale: 0.25 }, &mut p).unwrap();
        assert_eq!(p.size(), Size::new(50.0, 50.0));
        assert_eq!(p.position(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_non_finite_pinch_keeps_snapshot() {
        let mut p = placement_at(5.0, 5.0, 200.0, 100.0);
        let session = GestureSession::begin(GestureKind::Pinch, &p);
        session.apply(GestureUpdate::Pinch { scale: 1.5 }, &mut p).unwrap();
        session.apply(GestureUpdate::Pinch { scale: f64::INFINITY }, &mut p).unwrap();
        assert_eq!(p.size(), Size::new(200.0, 100.0));

        session.apply(GestureUpdate::Pinch { scale: f64::NAN }, &mut p).unwrap();
        assert_eq!(p.size(), Size::new(200.0, 100.0));
        assert!(p.width().is_finite() && p.height().is_finite());
    }

    #[test]
    fn test_huge_pan_never_leaves_infinite_size() {
        let mut p = placement_at(0.0, 0.0, 100.0, 100.0);
        let session = GestureSession::begin(Handle::Right.gesture_kind(), &p);
        session.apply(pan(f64::INFINITY, 0.0), &mut p).unwrap();
        assert!(p.width().is_finite());
        assert_eq!(p.height(), 100.0);
    }

    #[test]
    fn test_mismatched_update_rejected() {
        let mut p = placement_at(0.0, 0.0, 100.0, 100.0);
        let session = GestureSession::begin(GestureKind::Move, &p);
        let err = session.apply(GestureUpdate::Pinch { scale: 2.0 }, &mut p).unwrap_err();
        assert_eq!(
            err,
            GestureError::UpdateMismatch {
                kind: "move",
                update: "pinch"
            }
        );
        assert_eq!(p.size(), Size::new(100.0, 100.0));
    }

    #[test]
    fn test_cancel_restores_snapshot() {
        let mut p = placement_at(12.5, -7.25, 120.0, 90.0);
        let session = GestureSession::begin(Handle::TopLeft.gesture_kind(), &p);
        session.apply(pan(-300.0, 10.0), &mut p).unwrap();
        assert_ne!(p.size(), Size::new(120.0, 90.0));
        session.cancel(&mut p);
        assert_eq!(p.position(), Point::new(12.5, -7.25));
        assert_eq!(p.size(), Size::new(120.0, 90.0));
    }
}
