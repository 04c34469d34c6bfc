//! Drawing Surface - Host 2D primitives
//!
//! The rasterizer needs exactly three primitives: clear, stroke a rectangle,
//! and draw a bitmap scaled into a rectangle.

use image::RgbaImage;
use tiny_skia::{
    Color, ColorU8, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::geometry::Rect;

pub trait Surface {
    /// Pixel dimensions of the surface.
    fn size(&self) -> (u32, u32);

    fn clear(&mut self, rgba: [u8; 4]);

    fn stroke_rect(&mut self, rect: Rect, rgba: [u8; 4], width: f32);

    /// Draw `bitmap` stretched to fill `dest`, blended over existing pixels.
    fn draw_bitmap(&mut self, bitmap: &Pixmap, dest: Rect);
}

/// Offscreen surface backed by a tiny-skia pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
}

impl PixmapSurface {
    /// `None` when either dimension is zero or the allocation is too large.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, String> {
        self.pixmap.encode_png().map_err(|e| e.to_string())
    }

    /// Straight (non-premultiplied) RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        pixel_rgba(&self.pixmap, x, y)
    }
}

/// Straight RGBA of one pixel of `pixmap`, `None` outside its bounds.
pub fn pixel_rgba(pixmap: &Pixmap, x: u32, y: u32) -> Option<[u8; 4]> {
    // tiny-skia only checks the flat index, so x past the width wraps rows
    if x >= pixmap.width() || y >= pixmap.height() {
        return None;
    }
    let c = pixmap.pixel(x, y)?.demultiply();
    Some([c.red(), c.green(), c.blue(), c.alpha()])
}

/// Premultiplied copy of a decoded image, ready for `Surface::draw_bitmap`.
pub fn to_bitmap(bitmap: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(bitmap.width(), bitmap.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(bitmap.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

fn color([r, g, b, a]: [u8; 4]) -> Color {
    Color::from_rgba8(r, g, b, a)
}

impl Surface for PixmapSurface {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn clear(&mut self, rgba: [u8; 4]) {
        self.pixmap.fill(color(rgba));
    }

    fn stroke_rect(&mut self, rect: Rect, rgba: [u8; 4], width: f32) {
        let Some(r) = tiny_skia::Rect::from_xywh(
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
        ) else {
            return;
        };
        let path = PathBuilder::from_rect(r);

        let mut paint = Paint::default();
        paint.set_color(color(rgba));
        paint.anti_alias = true;
        let stroke = Stroke {
            width,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn draw_bitmap(&mut self, src: &Pixmap, dest: Rect) {
        if dest.width <= 0.0 || dest.height <= 0.0 {
            return;
        }

        let sx = (dest.width / f64::from(src.width())) as f32;
        let sy = (dest.height / f64::from(src.height())) as f32;
        let transform = Transform::from_row(sx, 0.0, 0.0, sy, dest.x as f32, dest.y as f32);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
    }
}
