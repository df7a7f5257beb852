//! Tiled watermarks for 2-D drawing surfaces.
//!
//! A [`Watermark`] covers its surface with a grid of rotated tiles (a text
//! string or a bitmap), redraws when the surface is resized, and can guard
//! the surface against tampering in a host node tree.
//!
//! ```no_run
//! use tilemark::{Options, RasterSurface, Size, Watermark};
//!
//! let surface = RasterSurface::new(Size::new(800.0, 600.0));
//! let watermark = Watermark::new(surface, Options::text("CONFIDENTIAL").rotate(30.0))?;
//! watermark.surface().save_png("out.png".as_ref())?;
//! # Ok::<(), tilemark::WatermarkError>(())
//! ```

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod render;
pub mod ui;

pub use app::event::{surface_channel, SurfaceEvent, SurfaceEvents, SurfaceNotifier};
pub use app::guard::{Repair, TamperGuard};
pub use app::watermark::Watermark;
pub use config::WatermarkConfig;
pub use core::options::{Bitmap, Content, ImageInfo, Options, ResolvedOptions};
pub use core::sizing::Size;
pub use core::tree::{MutationRecord, NodeId, NodeTree, SceneTree};
pub use error::{Result, WatermarkError};
pub use render::context::{DrawingContext, Surface};
pub use render::raster::RasterSurface;
pub use render::recording::RecordingSurface;
