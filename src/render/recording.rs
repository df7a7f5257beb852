//! A backend that records every context call instead of rasterising.
//!
//! Used by tests to check the draw protocol (transform scoping, pass-level
//! alpha, clear-before-redraw) without depending on fonts or pixels.

use crate::core::color::Color;
use crate::core::font::FontSpec;
use crate::core::options::Bitmap;
use crate::core::sizing::Size;

use super::context::{DrawingContext, Surface};

/// One recorded context call.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Save,
    Restore,
    Translate(f32, f32),
    Rotate(f32),
    SetFont(FontSpec),
    SetFillStyle(Color),
    SetGlobalAlpha(f32),
    FillText { text: String, x: f32, y: f32 },
    DrawImage { x: f32, y: f32, width: f32, height: f32 },
    BeginPath,
    ClearRect { x: f32, y: f32, width: f32, height: f32 },
    /// Emitted by the surface when its buffer is resized.
    Resize(u32, u32),
}

#[derive(Debug, Default)]
pub struct RecordingContext {
    ops: Vec<Op>,
    depth: usize,
    max_depth: usize,
    /// Transform depth observed at every `fill_text` / `draw_image`.
    draw_depths: Vec<usize>,
}

impl RecordingContext {
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<Op> {
        self.draw_depths.clear();
        std::mem::take(&mut self.ops)
    }

    /// Current save/restore nesting.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn draw_depths(&self) -> &[usize] {
        &self.draw_depths
    }

    /// Number of tile draws (`fill_text` + `draw_image`) recorded.
    pub fn tile_draws(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::FillText { .. } | Op::DrawImage { .. }))
            .count()
    }

    fn reset_state(&mut self) {
        self.depth = 0;
    }
}

impl DrawingContext for RecordingContext {
    fn save(&mut self) {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.ops.push(Op::Save);
    }

    fn restore(&mut self) {
        // Unbalanced restore is ignored, as on a canvas.
        self.depth = self.depth.saturating_sub(1);
        self.ops.push(Op::Restore);
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.ops.push(Op::Translate(x, y));
    }

    fn rotate(&mut self, radians: f32) {
        self.ops.push(Op::Rotate(radians));
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.ops.push(Op::SetFont(font.clone()));
    }

    fn set_fill_style(&mut self, color: Color) {
        self.ops.push(Op::SetFillStyle(color));
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.ops.push(Op::SetGlobalAlpha(alpha));
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.draw_depths.push(self.depth);
        self.ops.push(Op::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn draw_image(&mut self, _bitmap: &Bitmap, x: f32, y: f32, width: f32, height: f32) {
        self.draw_depths.push(self.depth);
        self.ops.push(Op::DrawImage {
            x,
            y,
            width,
            height,
        });
    }

    fn begin_path(&mut self) {
        self.ops.push(Op::BeginPath);
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ops.push(Op::ClearRect {
            x,
            y,
            width,
            height,
        });
    }
}

/// Surface wrapper around [`RecordingContext`].
#[derive(Debug)]
pub struct RecordingSurface {
    measured: Size,
    buffer: (u32, u32),
    context: Option<RecordingContext>,
}

impl RecordingSurface {
    /// A surface laid out at `measured`, with the canvas default buffer.
    pub fn new(measured: Size) -> Self {
        Self {
            measured,
            buffer: (300, 150),
            context: Some(RecordingContext::default()),
        }
    }

    /// A surface that refuses to hand out a context.
    pub fn without_context(measured: Size) -> Self {
        Self {
            context: None,
            ..Self::new(measured)
        }
    }

    /// Simulate the host re-laying the surface out.
    pub fn set_measured_size(&mut self, size: Size) {
        self.measured = size;
    }

    pub fn recorder(&self) -> Option<&RecordingContext> {
        self.context.as_ref()
    }

    pub fn recorder_mut(&mut self) -> Option<&mut RecordingContext> {
        self.context.as_mut()
    }
}

impl Surface for RecordingSurface {
    type Context = RecordingContext;

    fn measured_size(&self) -> Size {
        self.measured
    }

    fn buffer_size(&self) -> (u32, u32) {
        self.buffer
    }

    fn set_buffer_size(&mut self, width: u32, height: u32) {
        self.buffer = (width, height);
        if let Some(ctx) = self.context.as_mut() {
            ctx.reset_state();
            ctx.ops.push(Op::Resize(width, height));
        }
    }

    fn context_2d(&mut self) -> Option<&mut RecordingContext> {
        self.context.as_mut()
    }
}
