//! Collage Editor - Single entry point for hosts
//!
//! Owns the collage, its scene projection, and the active gesture sessions.
//! Every model mutation goes through here and is followed immediately by a
//! scene sync, so the view never lags the model.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::config::EditorConfig;
use crate::export::{export_png, ExportError, ExportReport, RasterOptions, Rasterizer};
use crate::geometry::{Point, Size};
use crate::gesture::{
    GestureError, GestureKind, GesturePhase, GestureSession, GestureUpdate, Handle,
};
use crate::model::{Collage, ImagePlacement, ModelError, PlacementId};
use crate::scene::Scene;
use crate::surface::PixmapSurface;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Unknown placement: {0}")]
    UnknownPlacement(PlacementId),

    #[error("A gesture is already active on placement {0}")]
    GestureInProgress(PlacementId),

    #[error("No active gesture on placement {0}")]
    NoActiveGesture(PlacementId),

    #[error("Gesture error: {0}")]
    Gesture(#[from] GestureError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

pub struct CollageEditor {
    config: EditorConfig,
    collage: Collage,
    scene: Scene,
    sessions: HashMap<PlacementId, GestureSession>,
}

impl CollageEditor {
    /// Start an empty collage from the configured canvas.
    pub fn new(config: EditorConfig) -> Result<Self, EditorError> {
        let canvas = config.canvas.build()?;
        let collage = Collage::new(config.title.clone(), canvas);
        Ok(Self::with_collage(config, collage))
    }

    /// Edit an existing collage.
    pub fn with_collage(config: EditorConfig, collage: Collage) -> Self {
        let scene = Scene::new(collage.canvas()).with_handle_size(config.handle_size);
        let mut editor = Self {
            config,
            collage,
            scene,
            sessions: HashMap::new(),
        };
        editor.scene.sync(&editor.collage);
        editor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn collage(&self) -> &Collage {
        &self.collage
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn into_collage(self) -> Collage {
        self.collage
    }

    pub fn set_view_scale(&mut self, scale: f64) {
        self.scene.set_view_scale(scale, &self.collage);
    }

    /// Decode `path` and place it at the origin with the default size.
    ///
    /// Nothing is added when the file cannot be decoded.
    pub fn add_image(&mut self, path: impl AsRef<Path>) -> Result<PlacementId, EditorError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "image rejected");
            EditorError::Decode {
                path: path.display().to_string(),
                source,
            }
        })?;

        let side = self.config.default_placement_size;
        let placement = ImagePlacement::with_min_size(
            path,
            Size::new(side, side),
            Point::new(0.0, 0.0),
            self.config.min_placement_size,
        );
        tracing::info!(
            path = %path.display(),
            pixels_w = image.width(),
            pixels_h = image.height(),
            "image placed"
        );
        Ok(self.add_placement(placement))
    }

    /// Add an already-built placement on top of the others. Returns the id it
    /// was stored under, which is fresh if `placement`'s id was already taken.
    pub fn add_placement(&mut self, placement: ImagePlacement) -> PlacementId {
        let id = self.collage.add_placement(placement);
        if let Some(stored) = self.collage.placement(id) {
            self.scene.sync_placement(stored);
        }
        id
    }

    pub fn remove_image(&mut self, id: PlacementId) -> bool {
        self.sessions.remove(&id);
        let removed = self.collage.remove_placement(id).is_some();
        if removed {
            self.scene.remove(id);
        }
        removed
    }

    /// Remove every placement and drop any gesture in flight.
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.collage.clear();
        self.scene.sync(&self.collage);
    }

    pub fn is_gesture_active(&self, id: PlacementId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Started phase for a drag on `handle`.
    pub fn begin_gesture(&mut self, id: PlacementId, handle: Handle) -> Result<(), EditorError> {
        self.begin(id, handle.gesture_kind())
    }

    /// Started phase for a two-finger pinch on the placement body.
    pub fn begin_pinch(&mut self, id: PlacementId) -> Result<(), EditorError> {
        self.begin(id, GestureKind::Pinch)
    }

    fn begin(&mut self, id: PlacementId, kind: GestureKind) -> Result<(), EditorError> {
        if self.sessions.contains_key(&id) {
            return Err(EditorError::GestureInProgress(id));
        }
        let placement = self
            .collage
            .placement(id)
            .ok_or(EditorError::UnknownPlacement(id))?;

        let session =
            GestureSession::begin(kind, placement).with_snap_grid(self.config.snap_grid);
        tracing::debug!(placement = %id, kind = kind.name(), "gesture started");
        self.sessions.insert(id, session);
        Ok(())
    }

    /// Running phase. Recomputes from the Started snapshot and syncs the view.
    ///
    /// Pan totals are in view pixels, the same space as `Scene::hit_test`.
    pub fn update_gesture(
        &mut self,
        id: PlacementId,
        update: GestureUpdate,
    ) -> Result<(), EditorError> {
        let update = update.in_canvas_units(self.scene.view_scale());
        let session = self
            .sessions
            .get(&id)
            .ok_or(EditorError::NoActiveGesture(id))?;
        let placement = self
            .collage
            .placement_mut(id)
            .ok_or(EditorError::UnknownPlacement(id))?;

        if let Err(e) = session.apply(update, placement) {
            tracing::warn!(placement = %id, error = %e, "gesture update rejected");
            return Err(e.into());
        }
        self.scene.sync_placement(placement);
        Ok(())
    }

    /// Completed phase. The last Running values stay. Returns `false` when no
    /// gesture was active, which makes repeated completion a no-op.
    pub fn complete_gesture(&mut self, id: PlacementId) -> bool {
        let Some(session) = self.sessions.remove(&id) else {
            return false;
        };
        tracing::debug!(placement = %id, kind = session.kind().name(), "gesture completed");
        true
    }

    /// Cancelled phase. Restores the Started snapshot exactly.
    pub fn cancel_gesture(&mut self, id: PlacementId) -> bool {
        let Some(session) = self.sessions.remove(&id) else {
            return false;
        };
        if let Some(placement) = self.collage.placement_mut(id) {
            session.cancel(placement);
            self.scene.sync_placement(placement);
        }
        tracing::debug!(placement = %id, "gesture cancelled");
        true
    }

    /// Route one host gesture callback to the matching phase handler.
    pub fn dispatch(
        &mut self,
        id: PlacementId,
        handle: Handle,
        phase: GesturePhase,
    ) -> Result<(), EditorError> {
        match phase {
            GesturePhase::Started => self.begin_gesture(id, handle),
            GesturePhase::Running(update) => self.update_gesture(id, update),
            GesturePhase::Completed => {
                self.complete_gesture(id);
                Ok(())
            }
            GesturePhase::Cancelled => {
                self.cancel_gesture(id);
                Ok(())
            }
        }
    }

    fn raster_options(&self, draw_affordances: bool) -> RasterOptions {
        RasterOptions {
            resolution: self.config.export.resolution,
            draw_affordances,
        }
    }

    /// Export to the configured location (`Collage.png` in the picture directory by default).
    pub fn export(&self) -> Result<ExportReport, EditorError> {
        self.export_to(&self.config.export.output_path())
    }

    pub fn export_to(&self, path: &Path) -> Result<ExportReport, EditorError> {
        export_png(&self.scene, self.raster_options(false), path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "export failed");
            e.into()
        })
    }

    /// Offscreen render with outlines and handles, for on-screen preview.
    pub fn render_preview(&self) -> Result<PixmapSurface, EditorError> {
        Ok(Rasterizer::new(self.raster_options(true)).render(&self.scene)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn editor_with_placement() -> (CollageEditor, PlacementId) {
        let mut editor = CollageEditor::new(EditorConfig::default()).unwrap();
        let id = editor.add_placement(ImagePlacement::new(
            "p.png",
            Size::new(300.0, 300.0),
            Point::new(0.0, 0.0),
        ));
        (editor, id)
    }

    fn pan(total_x: f64, total_y: f64) -> GestureUpdate {
        GestureUpdate::Pan { total_x, total_y }
    }

    #[test]
    fn test_scene_follows_every_update() {
        let (mut editor, id) = editor_with_placement();
        editor.begin_gesture(id, Handle::BottomRight).unwrap();
        editor.update_gesture(id, pan(100.0, 20.0)).unwrap();

        let node = editor.scene().node(id).unwrap();
        assert_eq!(node.bounds(), Rect::new(0.0, 0.0, 400.0, 400.0));
    }

    #[test]
    fn test_second_begin_on_same_placement_rejected() {
        let (mut editor, id) = editor_with_placement();
        editor.begin_gesture(id, Handle::Body).unwrap();
        assert!(matches!(
            editor.begin_gesture(id, Handle::Left),
            Err(EditorError::GestureInProgress(_))
        ));
    }

    #[test]
    fn test_update_without_session_rejected() {
        let (mut editor, id) = editor_with_placement();
        assert!(matches!(
            editor.update_gesture(id, pan(1.0, 1.0)),
            Err(EditorError::NoActiveGesture(_))
        ));
    }

    #[test]
    fn test_unknown_placement_rejected() {
        let (mut editor, _) = editor_with_placement();
        let stranger = PlacementId::new();
        assert!(matches!(
            editor.begin_gesture(stranger, Handle::Body),
            Err(EditorError::UnknownPlacement(_))
        ));
    }

    #[test]
    fn test_remove_drops_session_and_node() {
        let (mut editor, id) = editor_with_placement();
        editor.begin_gesture(id, Handle::Body).unwrap();
        assert!(editor.remove_image(id));
        assert!(!editor.is_gesture_active(id));
        assert!(editor.scene().node(id).is_none());
        assert!(!editor.remove_image(id));
    }

    #[test]
    fn test_dispatch_runs_phases() {
        let (mut editor, id) = editor_with_placement();
        editor.dispatch(id, Handle::Body, GesturePhase::Started).unwrap();
        editor
            .dispatch(id, Handle::Body, GesturePhase::Running(pan(25.0, -5.0)))
            .unwrap();
        editor.dispatch(id, Handle::Body, GesturePhase::Completed).unwrap();

        let p = editor.collage().placement(id).unwrap();
        assert_eq!(p.position(), Point::new(25.0, -5.0));
        assert!(!editor.is_gesture_active(id));
    }

    #[test]
    fn test_cloned_placement_keeps_view_in_step() {
        let (mut editor, id) = editor_with_placement();
        let clone = editor.collage().placement(id).unwrap().clone();

        let second = editor.add_placement(clone);
        assert_ne!(second, id);
        assert_eq!(editor.collage().placements().len(), 2);
        assert_eq!(editor.scene().nodes().len(), 2);
        assert_eq!(editor.scene().nodes()[1].placement(), second);
    }

    #[test]
    fn test_pan_totals_follow_view_scale() {
        let (mut editor, id) = editor_with_placement();
        editor.set_view_scale(2.0);
        editor.begin_gesture(id, Handle::Body).unwrap();
        editor.update_gesture(id, pan(100.0, -40.0)).unwrap();
        editor.complete_gesture(id);

        assert_eq!(editor.collage().placement(id).unwrap().position(), Point::new(50.0, -20.0));
        let bounds = editor.scene().node(id).unwrap().bounds();
        assert_eq!((bounds.x, bounds.y), (100.0, -40.0));
    }

    #[test]
    fn test_clear_empties_scene() {
        let (mut editor, _) = editor_with_placement();
        editor.clear();
        assert!(editor.collage().placements().is_empty());
        assert!(editor.scene().nodes().is_empty());
    }
}
