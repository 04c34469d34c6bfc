//! Geometry Model - Canvas, Placements, Collage
//!
//! Size mutators never fail. Requests below the minimum bound are clamped.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::geometry::{Point, Rect, Size};

/// Smallest width or height a placement may take.
pub const MIN_PLACEMENT_SIZE: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Canvas dimensions must be positive, got {0}x{1}")]
    InvalidCanvasSize(u32, u32),

    #[error("Unrecognized background descriptor: {0}")]
    InvalidBackground(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementId(Uuid);

impl PlacementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlacementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlacementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Canvas background, kept as the descriptor it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Background {
    descriptor: String,
    rgba: [u8; 4],
}

impl Background {
    pub fn white() -> Self {
        Self {
            descriptor: "White".to_string(),
            rgba: [255, 255, 255, 255],
        }
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn rgba(&self) -> [u8; 4] {
        self.rgba
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::white()
    }
}

impl FromStr for Background {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let rgba = match trimmed.strip_prefix('#') {
            Some(hex) => parse_hex(hex),
            None => named_color(&trimmed.to_ascii_lowercase()),
        }
        .ok_or_else(|| ModelError::InvalidBackground(s.to_string()))?;

        Ok(Self {
            descriptor: trimmed.to_string(),
            rgba,
        })
    }
}

impl TryFrom<String> for Background {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Background> for String {
    fn from(bg: Background) -> Self {
        bg.descriptor
    }
}

fn named_color(name: &str) -> Option<[u8; 4]> {
    let rgba = match name {
        "white" => [255, 255, 255, 255],
        "black" => [0, 0, 0, 255],
        "transparent" => [0, 0, 0, 0],
        "gray" | "grey" => [128, 128, 128, 255],
        "red" => [255, 0, 0, 255],
        "green" => [0, 128, 0, 255],
        "blue" => [0, 0, 255, 255],
        "yellow" => [255, 255, 0, 255],
        _ => return None,
    };
    Some(rgba)
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);

    match hex.len() {
        3 => Some([nibble(0)?, nibble(1)?, nibble(2)?, 255]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CanvasRecord")]
pub struct Canvas {
    width: u32,
    height: u32,
    background: Background,
}

#[derive(Deserialize)]
struct CanvasRecord {
    width: u32,
    height: u32,
    #[serde(default)]
    background: Background,
}

impl TryFrom<CanvasRecord> for Canvas {
    type Error = ModelError;

    fn try_from(r: CanvasRecord) -> Result<Self, Self::Error> {
        Canvas::new(r.width, r.height, r.background)
    }
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Background) -> Result<Self, ModelError> {
        if width == 0 || height == 0 {
            return Err(ModelError::InvalidCanvasSize(width, height));
        }
        Ok(Self {
            width,
            height,
            background,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn background(&self) -> &Background {
        &self.background
    }
}

/// One image instance on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlacementRecord", rename_all = "camelCase")]
pub struct ImagePlacement {
    id: PlacementId,
    file_path: PathBuf,
    width: f64,
    height: f64,
    position: Point,
    min_size: f64,
}

/// Serialized shape of a placement; converted through the clamping constructor.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacementRecord {
    #[serde(default)]
    id: PlacementId,
    file_path: PathBuf,
    width: f64,
    height: f64,
    #[serde(default)]
    position: Point,
    #[serde(default = "default_min_size")]
    min_size: f64,
}

fn default_min_size() -> f64 {
    MIN_PLACEMENT_SIZE
}

impl From<PlacementRecord> for ImagePlacement {
    fn from(r: PlacementRecord) -> Self {
        let size = Size::new(r.width, r.height);
        let mut placement = ImagePlacement::with_min_size(r.file_path, size, r.position, r.min_size);
        placement.id = r.id;
        placement
    }
}

impl ImagePlacement {
    pub fn new(file_path: impl Into<PathBuf>, size: Size, position: Point) -> Self {
        Self::with_min_size(file_path, size, position, MIN_PLACEMENT_SIZE)
    }

    pub fn with_min_size(
        file_path: impl Into<PathBuf>,
        size: Size,
        position: Point,
        min_size: f64,
    ) -> Self {
        let min_size = if min_size.is_finite() && min_size > 0.0 {
            min_size
        } else {
            MIN_PLACEMENT_SIZE
        };
        let mut placement = Self {
            id: PlacementId::new(),
            file_path: file_path.into(),
            width: min_size,
            height: min_size,
            position: Point::default(),
            min_size,
        };
        placement.set_size(size.width, size.height);
        placement.set_position(position.x, position.y);
        placement
    }

    pub fn id(&self) -> PlacementId {
        self.id
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size())
    }

    /// Clamp a requested length to this placement's minimum bound.
    pub fn clamp_len(&self, len: f64) -> f64 {
        len.max(self.min_size)
    }

    /// Non-finite lengths leave that axis unchanged.
    pub fn set_size(&mut self, width: f64, height: f64) {
        if width.is_finite() {
            self.width = self.clamp_len(width);
        }
        if height.is_finite() {
            self.height = self.clamp_len(height);
        }
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        if x.is_finite() {
            self.position.x = x;
        }
        if y.is_finite() {
            self.position.y = y;
        }
    }

    /// Uniform scale of both dimensions, clamped like any other size change.
    pub fn resize(&mut self, scale: f64) {
        self.set_size(self.width * scale, self.height * scale);
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.set_position(self.position.x + dx, self.position.y + dy);
    }

    /// Put back geometry captured earlier.
    pub fn restore(&mut self, position: Point, size: Size) {
        self.set_size(size.width, size.height);
        self.set_position(position.x, position.y);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CollageRecord", rename_all = "camelCase")]
pub struct Collage {
    pub title: String,
    pub created_at: DateTime<Utc>,
    canvas: Canvas,
    placements: Vec<ImagePlacement>,
}

/// Serialized shape of a collage; placements are re-added so ids stay unique.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollageRecord {
    title: String,
    created_at: DateTime<Utc>,
    canvas: Canvas,
    #[serde(default)]
    placements: Vec<ImagePlacement>,
}

impl From<CollageRecord> for Collage {
    fn from(r: CollageRecord) -> Self {
        let mut collage = Collage {
            title: r.title,
            created_at: r.created_at,
            canvas: r.canvas,
            placements: Vec::with_capacity(r.placements.len()),
        };
        for placement in r.placements {
            collage.add_placement(placement);
        }
        collage
    }
}

impl Collage {
    pub fn new(title: impl Into<String>, canvas: Canvas) -> Self {
        Self {
            title: title.into(),
            created_at: Utc::now(),
            canvas,
            placements: vec![],
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Placements in paint order; the last one is drawn on top.
    pub fn placements(&self) -> &[ImagePlacement] {
        &self.placements
    }

    pub fn placement(&self, id: PlacementId) -> Option<&ImagePlacement> {
        self.placements.iter().find(|p| p.id == id)
    }

    pub fn placement_mut(&mut self, id: PlacementId) -> Option<&mut ImagePlacement> {
        self.placements.iter_mut().find(|p| p.id == id)
    }

    /// Append on top. A placement whose id is already taken gets a fresh one,
    /// which is the id returned.
    pub fn add_placement(&mut self, mut placement: ImagePlacement) -> PlacementId {
        if self.placement(placement.id).is_some() {
            placement.id = PlacementId::new();
        }
        let id = placement.id;
        self.placements.push(placement);
        id
    }

    pub fn remove_placement(&mut self, id: PlacementId) -> Option<ImagePlacement> {
        let index = self.placements.iter().position(|p| p.id == id)?;
        Some(self.placements.remove(index))
    }

    /// Remove every placement; the canvas itself is kept.
    pub fn clear(&mut self) {
        self.placements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(w: f64, h: f64) -> ImagePlacement {
        ImagePlacement::new("a.png", Size::new(w, h), Point::new(0.0, 0.0))
    }

    #[test]
    fn test_set_size_clamps_to_min_bound() {
        let mut p = placement(300.0, 300.0);
        p.set_size(20.0, -5.0);
        assert_eq!(p.size(), Size::new(50.0, 50.0));
    }

    #[test]
    fn test_set_size_ignores_non_finite_axis() {
        let mut p = placement(300.0, 300.0);
        p.set_size(f64::NAN, 120.0);
        assert_eq!(p.size(), Size::new(300.0, 120.0));

        p.set_size(f64::INFINITY, f64::NEG_INFINITY);
        assert_eq!(p.size(), Size::new(300.0, 120.0));

        p.resize(f64::INFINITY);
        assert_eq!(p.size(), Size::new(300.0, 120.0));
    }

    #[test]
    fn test_non_finite_construction_falls_back_to_min() {
        let p = placement(f64::NAN, f64::INFINITY);
        assert_eq!(p.size(), Size::new(50.0, 50.0));
    }

    #[test]
    fn test_resize_enforces_min_bound() {
        let mut p = placement(100.0, 200.0);
        p.resize(0.1);
        assert_eq!(p.width(), 50.0);
        assert_eq!(p.height(), 50.0);

        p.resize(3.0);
        assert_eq!(p.size(), Size::new(150.0, 150.0));
    }

    #[test]
    fn test_translate_is_additive_and_unconstrained() {
        let mut p = placement(100.0, 100.0);
        p.translate(-40.0, 10.0);
        p.translate(-40.0, 10.0);
        assert_eq!(p.position(), Point::new(-80.0, 20.0));
        assert_eq!(p.size(), Size::new(100.0, 100.0));
    }

    #[test]
    fn test_set_position_ignores_non_finite_axis() {
        let mut p = placement(100.0, 100.0);
        p.set_position(5.0, 7.0);
        p.set_position(f64::INFINITY, 9.0);
        assert_eq!(p.position(), Point::new(5.0, 9.0));
    }

    #[test]
    fn test_canvas_rejects_zero_size() {
        assert_eq!(
            Canvas::new(0, 600, Background::white()),
            Err(ModelError::InvalidCanvasSize(0, 600))
        );
    }

    #[test]
    fn test_deserialized_canvas_is_validated() {
        let err = serde_json::from_str::<Canvas>(r#"{"width": 0, "height": 600}"#).unwrap_err();
        assert!(err.to_string().contains("Canvas dimensions must be positive"));

        let canvas: Canvas = serde_json::from_str(r#"{"width": 640, "height": 480}"#).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (640, 480));
        assert_eq!(canvas.background().descriptor(), "White");
    }

    #[test]
    fn test_background_descriptors() {
        assert_eq!("White".parse::<Background>().unwrap().rgba(), [255, 255, 255, 255]);
        assert_eq!("#0f8".parse::<Background>().unwrap().rgba(), [0, 255, 136, 255]);
        assert_eq!("#10203040".parse::<Background>().unwrap().rgba(), [16, 32, 48, 64]);
        assert!("#12345".parse::<Background>().is_err());
        assert!("chartreuse-ish".parse::<Background>().is_err());
    }

    #[test]
    fn test_deserialized_placement_is_clamped() {
        let json = r#"{"filePath": "a.png", "width": 10.0, "height": 400.0}"#;
        let p: ImagePlacement = serde_json::from_str(json).unwrap();
        assert_eq!(p.size(), Size::new(50.0, 400.0));
        assert_eq!(p.position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_duplicate_id_gets_fresh_one() {
        let canvas = Canvas::new(800, 600, Background::white()).unwrap();
        let mut collage = Collage::new("Dup", canvas);
        let p = placement(100.0, 100.0);

        let first = collage.add_placement(p.clone());
        let second = collage.add_placement(p.clone());
        assert_eq!(first, p.id());
        assert_ne!(second, first);
        assert_eq!(collage.placement(second).unwrap().file_path(), p.file_path());

        let json = serde_json::to_string(&collage).unwrap();
        let dup = json.replace(&second.to_string(), &first.to_string());
        let loaded: Collage = serde_json::from_str(&dup).unwrap();
        assert_eq!(loaded.placements().len(), 2);
        assert_eq!(loaded.placements()[0].id(), first);
        assert_ne!(loaded.placements()[1].id(), first);
    }

    #[test]
    fn test_collage_keeps_insertion_order() {
        let canvas = Canvas::new(800, 600, Background::white()).unwrap();
        let mut collage = Collage::new("Test", canvas);
        let a = collage.add_placement(placement(100.0, 100.0));
        let b = collage.add_placement(placement(100.0, 100.0));
        let c = collage.add_placement(placement(100.0, 100.0));

        let order: Vec<_> = collage.placements().iter().map(|p| p.id()).collect();
        assert_eq!(order, vec![a, b, c]);

        assert!(collage.remove_placement(b).is_some());
        assert!(collage.remove_placement(b).is_none());
        let order: Vec<_> = collage.placements().iter().map(|p| p.id()).collect();
        assert_eq!(order, vec![a, c]);

        collage.clear();
        assert!(collage.placements().is_empty());
        assert_eq!(collage.canvas().width(), 800);
    }
}
