//! Rasterizer/Exporter
//!
//! Paints the scene in z-order onto a surface and writes the result as PNG.
//! Export only reads the scene; the model is never touched.

use std::collections::hash_map::{Entry, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tiny_skia::Pixmap;

use crate::config::ExportResolution;
use crate::hashing::sha256_hex;
use crate::scene::Scene;
use crate::surface::{to_bitmap, PixmapSurface, Surface};

const OUTLINE_COLOR: [u8; 4] = [52, 152, 219, 255];
const HANDLE_COLOR: [u8; 4] = [255, 0, 0, 255];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot allocate a {0}x{1} surface")]
    SurfaceAllocation(u32, u32),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterOptions {
    pub resolution: ExportResolution,
    /// Stroke node outlines and resize handles on top (preview only).
    pub draw_affordances: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub placements: usize,
    pub sha256: String,
}

pub struct Rasterizer {
    options: RasterOptions,
}

impl Rasterizer {
    pub fn new(options: RasterOptions) -> Self {
        Self { options }
    }

    /// Pixel size of the surface `scene` renders to.
    pub fn surface_size(&self, scene: &Scene) -> (u32, u32) {
        match self.options.resolution {
            ExportResolution::Logical => {
                let size = scene.canvas_size();
                (size.width as u32, size.height as u32)
            }
            ExportResolution::View => scene.view_pixel_size(),
        }
    }

    /// Paint `scene` onto `surface`. Returns the number of placements drawn.
    pub fn paint<S: Surface + ?Sized>(
        &self,
        scene: &Scene,
        surface: &mut S,
    ) -> Result<usize, ExportError> {
        let factor = match self.options.resolution {
            ExportResolution::Logical => 1.0 / scene.view_scale(),
            ExportResolution::View => 1.0,
        };

        surface.clear(scene.background());

        let mut decoded: HashMap<&Path, Pixmap> = HashMap::new();
        for node in scene.nodes() {
            let bitmap = match decoded.entry(node.source()) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(decode(node.source())?),
            };
            surface.draw_bitmap(bitmap, node.bounds().scaled(factor));
        }

        if self.options.draw_affordances {
            for node in scene.nodes() {
                surface.stroke_rect(node.bounds().scaled(factor), OUTLINE_COLOR, 1.0);
                for affordance in node.affordances().iter().filter(|a| a.handle.config().is_some()) {
                    surface.stroke_rect(affordance.hit_rect.scaled(factor), HANDLE_COLOR, 1.0);
                }
            }
        }

        Ok(scene.nodes().len())
    }

    /// Allocate an offscreen surface and paint into it.
    pub fn render(&self, scene: &Scene) -> Result<PixmapSurface, ExportError> {
        let (width, height) = self.surface_size(scene);
        let mut surface = PixmapSurface::new(width, height)
            .ok_or(ExportError::SurfaceAllocation(width, height))?;
        self.paint(scene, &mut surface)?;
        Ok(surface)
    }
}

/// Decode `path` straight into a premultiplied bitmap.
fn decode(path: &Path) -> Result<Pixmap, ExportError> {
    let rgba = image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| ExportError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    to_bitmap(&rgba).ok_or(ExportError::SurfaceAllocation(rgba.width(), rgba.height()))
}

/// Render `scene` and write it to `path` as PNG.
///
/// Nothing is written unless rendering and encoding both succeed.
pub fn export_png(
    scene: &Scene,
    options: RasterOptions,
    path: &Path,
) -> Result<ExportReport, ExportError> {
    let rasterizer = Rasterizer::new(options);
    let surface = rasterizer.render(scene)?;
    let png = surface.encode_png().map_err(ExportError::Encode)?;

    write_atomic(path, &png).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = surface.size();
    let report = ExportReport {
        path: path.to_path_buf(),
        width,
        height,
        placements: scene.nodes().len(),
        sha256: sha256_hex(&png),
    };
    tracing::info!(path = %path.display(), width, height, placements = report.placements, "collage exported");
    Ok(report)
}

/// Write through a temp file in the destination directory, then rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
