//! tiny-skia raster backend.
//!
//! Keeps a canvas-style state stack (transform, global alpha, fill, font)
//! over a premultiplied [`Pixmap`].  Text is rasterised with fontdue into a
//! single coverage run which is then composited through the current
//! transform, so rotated tiles are resampled rather than re-rasterised.
//! Both the text run and the converted bitmap are cached across tiles.

use std::path::Path;
use std::sync::Arc;

use fontdue::Font;
use image::{Rgba, RgbaImage};
use tiny_skia::{BlendMode, ColorU8, FilterQuality, Paint, Pixmap, PixmapPaint, Rect, Transform};

use crate::core::color::Color;
use crate::core::font::FontSpec;
use crate::core::options::Bitmap;
use crate::core::sizing::Size;
use crate::error::WatermarkError;

use super::context::{DrawingContext, Surface};
use super::fonts::FontBook;

/// Canvas default backing buffer.
pub const DEFAULT_BUFFER: (u32, u32) = (300, 150);

#[derive(Clone)]
struct State {
    transform: Transform,
    alpha: f32,
    fill: Color,
    font: FontSpec,
    face: Option<Arc<Font>>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            alpha: 1.0,
            fill: Color::BLACK,
            font: FontSpec::default(),
            face: None,
        }
    }
}

/// A rasterised text run, positioned relative to its baseline origin.
struct TextRun {
    key: (String, String, Color),
    pixmap: Pixmap,
    left: f32,
    top: f32,
}

pub struct RasterContext {
    pixmap: Option<Pixmap>,
    state: State,
    stack: Vec<State>,
    fonts: FontBook,
    text_cache: Option<TextRun>,
    image_cache: Option<(usize, Pixmap)>,
}

impl RasterContext {
    fn new(width: u32, height: u32, fonts: FontBook) -> Self {
        Self {
            pixmap: new_pixmap(width, height),
            state: State::default(),
            stack: Vec::new(),
            fonts,
            text_cache: None,
            image_cache: None,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.pixmap = new_pixmap(width, height);
        self.state = State::default();
        self.stack.clear();
    }

    fn paint(&self) -> PixmapPaint {
        PixmapPaint {
            opacity: self.state.alpha,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        }
    }
}

impl DrawingContext for RasterContext {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.pre_translate(x, y);
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform = self
            .state
            .transform
            .pre_concat(Transform::from_rotate(radians.to_degrees()));
    }

    fn set_font(&mut self, font: &FontSpec) {
        if self.state.face.is_some() && &self.state.font == font {
            return;
        }
        self.state.face = self.fonts.resolve(font);
        self.state.font = font.clone();
    }

    fn set_fill_style(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        // Out-of-range values are ignored, as on a canvas.
        if (0.0..=1.0).contains(&alpha) {
            self.state.alpha = alpha;
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        let Some(face) = self.state.face.clone() else {
            return;
        };
        let paint = self.paint();
        let key = (text.to_string(), self.state.font.to_string(), self.state.fill);
        let stale = self.text_cache.as_ref().map_or(true, |run| run.key != key);
        if stale {
            self.text_cache = rasterize_run(&face, self.state.font.size_px, key);
        }

        let (Some(pixmap), Some(run)) = (self.pixmap.as_mut(), self.text_cache.as_ref()) else {
            return;
        };
        let transform = self.state.transform.pre_translate(x + run.left, y + run.top);
        pixmap.draw_pixmap(0, 0, run.pixmap.as_ref(), &paint, transform, None);
    }

    fn draw_image(&mut self, bitmap: &Bitmap, x: f32, y: f32, width: f32, height: f32) {
        let (iw, ih) = bitmap.pixels().dimensions();
        if iw == 0 || ih == 0 || width <= 0.0 || height <= 0.0 {
            return;
        }
        let paint = self.paint();
        if self.image_cache.as_ref().map_or(true, |(id, _)| *id != bitmap.id()) {
            self.image_cache = bitmap_to_pixmap(bitmap.pixels()).map(|p| (bitmap.id(), p));
        }

        let (Some(pixmap), Some((_, src))) = (self.pixmap.as_mut(), self.image_cache.as_ref()) else {
            return;
        };
        let transform = self
            .state
            .transform
            .pre_translate(x, y)
            .pre_scale(width / iw as f32, height / ih as f32);
        pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
    }

    fn begin_path(&mut self) {
        tracing::trace!("begin_path: no path state in raster backend");
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let (Some(pixmap), Some(rect)) = (self.pixmap.as_mut(), Rect::from_xywh(x, y, width, height))
        else {
            return;
        };
        let paint = Paint {
            blend_mode: BlendMode::Clear,
            ..Paint::default()
        };
        pixmap.fill_rect(rect, &paint, self.state.transform, None);
    }
}

/// An in-memory raster surface.
pub struct RasterSurface {
    measured: Size,
    context: RasterContext,
}

impl RasterSurface {
    /// A surface laid out at `measured`, searching the system font dirs.
    pub fn new(measured: Size) -> Self {
        Self::with_fonts(measured, FontBook::new(Vec::new()))
    }

    pub fn with_fonts(measured: Size, fonts: FontBook) -> Self {
        let (w, h) = DEFAULT_BUFFER;
        Self {
            measured,
            context: RasterContext::new(w, h, fonts),
        }
    }

    pub fn set_measured_size(&mut self, size: Size) {
        self.measured = size;
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.context.pixmap.as_ref()
    }

    /// Copy the buffer out as straight-alpha RGBA.
    pub fn to_image(&self) -> RgbaImage {
        let Some(pixmap) = self.context.pixmap.as_ref() else {
            return RgbaImage::new(0, 0);
        };
        let width = pixmap.width();
        let pixels = pixmap.pixels();
        RgbaImage::from_fn(width, pixmap.height(), |x, y| {
            let c = pixels[(y * width + x) as usize].demultiply();
            Rgba([c.red(), c.green(), c.blue(), c.alpha()])
        })
    }

    pub fn save_png(&self, path: &Path) -> Result<(), WatermarkError> {
        self.to_image().save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

impl Surface for RasterSurface {
    type Context = RasterContext;

    fn measured_size(&self) -> Size {
        self.measured
    }

    fn buffer_size(&self) -> (u32, u32) {
        self.context
            .pixmap
            .as_ref()
            .map_or((0, 0), |p| (p.width(), p.height()))
    }

    fn set_buffer_size(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    fn context_2d(&mut self) -> Option<&mut RasterContext> {
        Some(&mut self.context)
    }
}

fn new_pixmap(width: u32, height: u32) -> Option<Pixmap> {
    let pixmap = Pixmap::new(width, height);
    if pixmap.is_none() {
        tracing::warn!("cannot allocate a {width}x{height} buffer; drawing disabled until resized");
    }
    pixmap
}

fn bitmap_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, px) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        *dst = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
    }
    Some(pixmap)
}

/// Lay out `text` on one baseline and rasterise it into a coverage pixmap
/// tinted with the fill colour.
fn rasterize_run(face: &Font, px: f32, key: (String, String, Color)) -> Option<TextRun> {
    struct Glyph {
        left: f32,
        top: f32,
        width: usize,
        height: usize,
        coverage: Vec<u8>,
    }

    let color = key.2;
    let mut glyphs = Vec::new();
    let mut pen = 0.0f32;
    let mut prev: Option<char> = None;
    for c in key.0.chars() {
        if let Some(p) = prev {
            pen += face.horizontal_kern(p, c, px).unwrap_or(0.0);
        }
        let (metrics, coverage) = face.rasterize(c, px);
        if metrics.width > 0 && metrics.height > 0 {
            glyphs.push(Glyph {
                left: (pen + metrics.xmin as f32).round(),
                top: -(metrics.ymin as f32 + metrics.height as f32),
                width: metrics.width,
                height: metrics.height,
                coverage,
            });
        }
        pen += metrics.advance_width;
        prev = Some(c);
    }

    let min_x = glyphs.iter().map(|g| g.left).fold(f32::MAX, f32::min);
    let min_y = glyphs.iter().map(|g| g.top).fold(f32::MAX, f32::min);
    let max_x = glyphs.iter().map(|g| g.left + g.width as f32).fold(f32::MIN, f32::max);
    let max_y = glyphs.iter().map(|g| g.top + g.height as f32).fold(f32::MIN, f32::max);
    if glyphs.is_empty() {
        return None;
    }

    let run_w = (max_x - min_x).ceil() as u32;
    let run_h = (max_y - min_y).ceil() as u32;
    let mut pixmap = Pixmap::new(run_w, run_h)?;
    let stride = run_w as usize;
    let pixels = pixmap.pixels_mut();
    for g in &glyphs {
        let ox = (g.left - min_x) as usize;
        let oy = (g.top - min_y) as usize;
        for row in 0..g.height {
            for col in 0..g.width {
                let cov = g.coverage[row * g.width + col];
                if cov == 0 {
                    continue;
                }
                let alpha = (color.a as u16 * cov as u16 / 255) as u8;
                let idx = (oy + row) * stride + ox + col;
                // Overlapping glyph boxes keep the stronger coverage.
                if pixels[idx].alpha() < alpha {
                    pixels[idx] = ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply();
                }
            }
        }
    }

    Some(TextRun {
        key,
        pixmap,
        left: min_x,
        top: min_y,
    })
}
