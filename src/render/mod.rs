//! Drawing layer — the context/surface seams and the backends behind them.
//!
//! The watermark pass only ever talks to [`context::DrawingContext`]; the
//! raster backend turns those calls into pixels, the recording backend into
//! an inspectable op log.

pub mod context;
pub mod fonts;
pub mod raster;
pub mod recording;
