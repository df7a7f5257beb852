//! Drawing seams: the 2-D context a watermark pass draws through, and the
//! host surface that owns it.

use crate::core::color::Color;
use crate::core::font::FontSpec;
use crate::core::options::Bitmap;
use crate::core::sizing::Size;

/// Immediate-mode 2-D drawing context (a subset of the canvas model).
///
/// State set through `set_*` and the current transform are saved and
/// restored as a unit by [`save`](Self::save) / [`restore`](Self::restore).
pub trait DrawingContext {
    fn save(&mut self);
    fn restore(&mut self);

    fn translate(&mut self, x: f32, y: f32);
    /// Rotate the current transform clockwise by `radians`.
    fn rotate(&mut self, radians: f32);

    fn set_font(&mut self, font: &FontSpec);
    fn set_fill_style(&mut self, color: Color);
    fn set_global_alpha(&mut self, alpha: f32);

    /// Fill `text` with its alphabetic baseline starting at `(x, y)`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32);
    /// Draw `bitmap` scaled into the `width × height` box at `(x, y)`.
    fn draw_image(&mut self, bitmap: &Bitmap, x: f32, y: f32, width: f32, height: f32);

    /// Discard any path under construction.
    fn begin_path(&mut self);
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
}

/// A host surface: something with a laid-out size, a backing pixel buffer,
/// and (usually) a 2-D context.
pub trait Surface {
    type Context: DrawingContext;

    /// Laid-out size in layout pixels, before any density multiplier.
    fn measured_size(&self) -> Size;

    /// Current backing buffer size in device pixels.
    fn buffer_size(&self) -> (u32, u32);

    /// Resize the backing buffer.  Like a canvas, this discards the raster
    /// and resets context state.
    fn set_buffer_size(&mut self, width: u32, height: u32);

    /// The surface's 2-D context, or `None` if it can't provide one.
    fn context_2d(&mut self) -> Option<&mut Self::Context>;
}
