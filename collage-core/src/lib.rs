//! Collage Core - Direct-manipulation geometry engine
//!
//! Images are placed on a fixed-size canvas, moved and resized through
//! pointer gestures, and exported to a single PNG.
//!
//! # Guarantees
//! 1. Every placement stays at least `MIN_PLACEMENT_SIZE` wide and tall
//! 2. Corner resizes keep the aspect ratio captured at gesture start
//! 3. Resizes keep the anchored edge fixed in canvas space
//! 4. Cancelling a gesture restores the pre-gesture geometry exactly
//! 5. Paint order is insertion order

pub mod config;
pub mod document;
pub mod editor;
pub mod export;
pub mod geometry;
pub mod gesture;
pub mod hashing;
pub mod model;
pub mod scene;
pub mod surface;

pub use config::{EditorConfig, ExportResolution};
pub use document::{CollageDocument, DocumentError};
pub use editor::{CollageEditor, EditorError};
pub use export::{export_png, ExportError, ExportReport, RasterOptions, Rasterizer};
pub use geometry::{Anchor, Point, Rect, Size};
pub use gesture::{GestureKind, GesturePhase, GestureSession, GestureUpdate, Handle, HandleConfig};
pub use hashing::{canonical_json, collage_digest, sha256_hex};
pub use model::{Background, Canvas, Collage, ImagePlacement, PlacementId, MIN_PLACEMENT_SIZE};
pub use scene::{Scene, ViewNode};
pub use surface::{pixel_rgba, to_bitmap, PixmapSurface, Surface};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
