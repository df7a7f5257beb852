//! Interactive preview — state and key handling for `tilemark preview`.
//!
//! The watermark renders into a [`RasterSurface`] sized from the terminal
//! area (each cell counts as [`CELL_WIDTH_PX`] × [`CELL_HEIGHT_PX`] layout
//! pixels).  Terminal resizes go through the same notification channel a
//! host would use, so resize redraw is exercised exactly as in a library
//! embedding.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use image::RgbaImage;
use ratatui::layout::Rect;

use crate::core::grid::MIN_GAP;
use crate::core::options::Options;
use crate::core::sizing::Size;
use crate::error::Result;
use crate::render::context::Surface;
use crate::render::fonts::FontBook;
use crate::render::raster::RasterSurface;

use super::event::{surface_channel, SurfaceEvents, SurfaceNotifier};
use super::watermark::Watermark;

pub const CELL_WIDTH_PX: f32 = 8.0;
pub const CELL_HEIGHT_PX: f32 = 16.0;

const ROTATE_STEP: f32 = 5.0;
const GAP_STEP: f32 = 10.0;

/// Layout size of a terminal area.
pub fn measured_for(area: Rect) -> Size {
    Size::new(
        f32::from(area.width) * CELL_WIDTH_PX,
        f32::from(area.height) * CELL_HEIGHT_PX,
    )
}

pub struct PreviewState {
    watermark: Watermark<RasterSurface>,
    notifier: SurfaceNotifier,
    events: SurfaceEvents,
    area: Rect,
    snapshot_dir: PathBuf,
    snapshots: u32,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl PreviewState {
    pub fn new(options: Options, fonts: FontBook, area: Rect, snapshot_dir: PathBuf) -> Result<Self> {
        let surface = RasterSurface::with_fonts(measured_for(area), fonts);
        let watermark = Watermark::new(surface, options)?;
        let (notifier, events) = surface_channel();
        Ok(Self {
            watermark,
            notifier,
            events,
            area,
            snapshot_dir,
            snapshots: 0,
            status_message: None,
            should_quit: false,
        })
    }

    pub fn watermark(&self) -> &Watermark<RasterSurface> {
        &self.watermark
    }

    /// Straight-alpha copy of the current pass.
    pub fn image(&self) -> RgbaImage {
        self.watermark.surface().to_image()
    }

    /// Track the area the preview is drawn into; redraws when it changes.
    pub fn set_area(&mut self, area: Rect) -> Result<()> {
        if area.width == self.area.width && area.height == self.area.height {
            return Ok(());
        }
        self.area = area;
        let size = measured_for(area);
        self.watermark.surface_mut().set_measured_size(size);
        self.notifier.resized(size.width, size.height);
        self.watermark.pump(&mut self.events)?;
        Ok(())
    }

    pub fn status_line(&self) -> String {
        let options = self.watermark.options();
        let (w, h) = self.watermark.surface().buffer_size();
        format!(
            " {}  rotate {}°  gap {}×{}  {}×{}{}  │  ←/→ rotate  ↑/↓ gap  d density  s snapshot  q quit",
            options.content.kind(),
            options.rotate,
            options.x_gap,
            options.y_gap,
            w,
            h,
            if options.high_density { " HD" } else { "" },
        )
    }

    fn snapshot(&mut self) -> Result<PathBuf> {
        self.snapshots += 1;
        let path = self
            .snapshot_dir
            .join(format!("tilemark-{:03}.png", self.snapshots));
        self.watermark.surface().save_png(&path)?;
        Ok(path)
    }
}

/// Process a key event.
pub fn handle_key(state: &mut PreviewState, key: KeyEvent) -> Result<()> {
    if key.kind != KeyEventKind::Press {
        return Ok(());
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return Ok(());
    }

    state.status_message = None;
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => state.should_quit = true,
        KeyCode::Left => state
            .watermark
            .reconfigure(|o| o.rotate = (o.rotate - ROTATE_STEP).rem_euclid(360.0))?,
        KeyCode::Right => state
            .watermark
            .reconfigure(|o| o.rotate = (o.rotate + ROTATE_STEP).rem_euclid(360.0))?,
        KeyCode::Up => state.watermark.reconfigure(|o| {
            o.x_gap += GAP_STEP;
            o.y_gap += GAP_STEP;
        })?,
        KeyCode::Down => state.watermark.reconfigure(|o| {
            o.x_gap = (o.x_gap - GAP_STEP).max(MIN_GAP);
            o.y_gap = (o.y_gap - GAP_STEP).max(MIN_GAP);
        })?,
        KeyCode::Char('d') => state
            .watermark
            .reconfigure(|o| o.high_density = !o.high_density)?,
        KeyCode::Char('s') => {
            state.status_message = Some(match state.snapshot() {
                Ok(path) => format!(" saved {}", path.display()),
                Err(e) => {
                    tracing::warn!("snapshot failed: {e}");
                    format!(" snapshot failed: {e}")
                }
            });
        }
        _ => {}
    }
    Ok(())
}
