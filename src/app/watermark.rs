//! The watermark component: sizes the surface, lays out the tile grid,
//! draws every tile, and reacts to surface notifications.

use crate::core::grid::{sanitize_gap, TileGrid};
use crate::core::options::{Bitmap, Options, ResolvedOptions, TileContent};
use crate::core::sizing::{resolve_surface_size, scaled_size, Size};
use crate::core::tree::MutationRecord;
use crate::error::{Result, WatermarkError};
use crate::render::context::{DrawingContext, Surface};

use super::event::{SurfaceEvent, SurfaceEvents};
use super::guard::{Repair, TamperGuard};

/// A tiled watermark bound to a surface.
///
/// Construction renders the first pass.  Afterwards the component redraws
/// on [`draw`](Self::draw), on resize notifications (while resize
/// observation is connected), and on [`reconfigure`](Self::reconfigure).
pub struct Watermark<S: Surface> {
    surface: S,
    options: ResolvedOptions,
    /// Width/height given at construction; re-applied on density changes.
    explicit: (Option<f32>, Option<f32>),
    guard: Option<TamperGuard>,
    resize_observed: bool,
    mutation_observed: bool,
}

impl<S: Surface> Watermark<S> {
    /// Resolve `options` against the surface, size its buffer, and draw.
    ///
    /// Fails with [`WatermarkError::ContextUnavailable`] if the surface has
    /// no 2-D context.
    pub fn new(mut surface: S, options: Options) -> Result<Self> {
        let explicit = (options.width, options.height);
        let (options, size) = options.resolve(surface.measured_size());
        if size.resize_buffer {
            surface.set_buffer_size(size.width, size.height);
        }
        if surface.context_2d().is_none() {
            return Err(WatermarkError::ContextUnavailable);
        }

        let mut watermark = Self {
            surface,
            resize_observed: options.resize_render,
            options,
            explicit,
            guard: None,
            mutation_observed: false,
        };
        watermark.draw()?;
        Ok(watermark)
    }

    /// Install a tamper guard and start reacting to mutation events.
    pub fn with_guard(mut self, guard: TamperGuard) -> Self {
        self.guard = Some(guard);
        self.mutation_observed = true;
        self
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn guard(&self) -> Option<&TamperGuard> {
        self.guard.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// The grid the next pass will draw.
    pub fn grid(&self) -> TileGrid {
        TileGrid::new(
            self.options.width,
            self.options.height,
            self.options.x_gap,
            self.options.y_gap,
        )
    }

    /// Render one full pass with the current options.
    pub fn draw(&mut self) -> Result<()> {
        let grid = self.grid();
        let ctx = self
            .surface
            .context_2d()
            .ok_or(WatermarkError::ContextUnavailable)?;

        match &self.options.content {
            TileContent::Text(text) => draw_text(ctx, &self.options, text, &grid),
            TileContent::Bitmap {
                bitmap,
                width,
                height,
                opacity,
            } => draw_bitmap(ctx, &self.options, bitmap, (*width, *height), *opacity, &grid),
        }

        tracing::debug!(
            "drew {} watermark: {} tiles over {}x{}",
            self.options.content.kind(),
            grid.len(),
            self.options.width,
            self.options.height,
        );
        Ok(())
    }

    /// React to one notification.  Returns the repairs the tamper guard
    /// wants applied to the host tree (empty for resizes).
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Result<Vec<Repair>> {
        match event {
            SurfaceEvent::Resized(size) => {
                self.on_resize(size)?;
                Ok(Vec::new())
            }
            SurfaceEvent::Mutated(records) => Ok(self.on_mutation(&records)),
        }
    }

    /// Handle every event already queued, without waiting.
    pub fn pump(&mut self, events: &mut SurfaceEvents) -> Result<Vec<Repair>> {
        let mut repairs = Vec::new();
        while let Some(event) = events.try_next() {
            repairs.extend(self.handle_event(event)?);
        }
        Ok(repairs)
    }

    /// Handle events until every notifier is dropped or both observations
    /// are disconnected.  Each repair is passed to `apply` as it's produced.
    pub async fn run<F>(&mut self, events: &mut SurfaceEvents, mut apply: F) -> Result<()>
    where
        F: FnMut(Repair),
    {
        while self.is_observing() {
            let Some(event) = events.next().await else {
                break;
            };
            for repair in self.handle_event(event)? {
                apply(repair);
            }
        }
        Ok(())
    }

    /// Whether resize or mutation events still have any effect.
    pub fn is_observing(&self) -> bool {
        self.resize_observed || self.mutation_observed
    }

    /// Stop redrawing on resize notifications.
    pub fn disconnect_resize(&mut self) {
        self.resize_observed = false;
    }

    /// Stop reacting to mutation notifications.
    pub fn disconnect_mutation(&mut self) {
        self.mutation_observed = false;
    }

    /// Edit the resolved options, then clear and redraw.
    pub fn reconfigure<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut ResolvedOptions),
    {
        let high_density = self.options.high_density;
        edit(&mut self.options);
        self.options.x_gap = sanitize_gap(self.options.x_gap).0;
        self.options.y_gap = sanitize_gap(self.options.y_gap).0;

        if self.options.high_density != high_density {
            // Density changes the buffer, not just the pass.
            let size = resolve_surface_size(
                self.explicit.0,
                self.explicit.1,
                self.surface.measured_size(),
                self.options.high_density,
            );
            if size.resize_buffer {
                self.surface.set_buffer_size(size.width, size.height);
            }
            self.options.width = size.width;
            self.options.height = size.height;
            self.clear()?;
            self.draw()
        } else {
            self.clear()?;
            self.draw()
        }
    }

    fn on_resize(&mut self, size: Size) -> Result<bool> {
        if !self.resize_observed {
            return Ok(false);
        }
        tracing::debug!("surface resized to {}x{}", size.width, size.height);
        self.resize_to(size)?;
        Ok(true)
    }

    fn resize_to(&mut self, size: Size) -> Result<()> {
        let (width, height) = scaled_size(size, self.options.high_density);
        self.surface.set_buffer_size(width, height);
        self.options.width = width;
        self.options.height = height;
        self.clear()?;
        self.draw()
    }

    fn clear(&mut self) -> Result<()> {
        let (width, height) = self.surface.buffer_size();
        let ctx = self
            .surface
            .context_2d()
            .ok_or(WatermarkError::ContextUnavailable)?;
        ctx.clear_rect(0.0, 0.0, width as f32, height as f32);
        Ok(())
    }

    fn on_mutation(&self, records: &[MutationRecord]) -> Vec<Repair> {
        if !self.mutation_observed {
            return Vec::new();
        }
        let repairs = self
            .guard
            .as_ref()
            .map(|guard| guard.inspect(records))
            .unwrap_or_default();
        if !repairs.is_empty() {
            tracing::debug!("tamper guard requested {} repairs", repairs.len());
        }
        repairs
    }
}

/// Draw every tile inside its own save/restore scope, rotated about its anchor.
fn for_each_tile<C, F>(ctx: &mut C, grid: &TileGrid, radians: f32, mut draw: F)
where
    C: DrawingContext,
    F: FnMut(&mut C),
{
    for anchor in grid.anchors() {
        ctx.save();
        ctx.translate(anchor.x, anchor.y);
        ctx.rotate(radians);
        draw(ctx);
        ctx.restore();
    }
}

fn draw_text<C: DrawingContext>(ctx: &mut C, options: &ResolvedOptions, text: &str, grid: &TileGrid) {
    ctx.set_font(&options.font);
    ctx.set_fill_style(options.color);
    for_each_tile(ctx, grid, options.rotate_radians(), |ctx| {
        ctx.fill_text(text, 0.0, 0.0);
    });
    ctx.begin_path();
}

fn draw_bitmap<C: DrawingContext>(
    ctx: &mut C,
    options: &ResolvedOptions,
    bitmap: &Bitmap,
    (width, height): (f32, f32),
    opacity: f32,
    grid: &TileGrid,
) {
    ctx.set_global_alpha(opacity);
    for_each_tile(ctx, grid, options.rotate_radians(), |ctx| {
        ctx.draw_image(bitmap, 0.0, 0.0, width, height);
    });
    ctx.set_global_alpha(1.0);
}
