//! Watermark configuration and its resolved, fully-defaulted form.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;

use super::color::Color;
use super::font::FontSpec;
use super::grid::sanitize_gap;
use super::sizing::{resolve_surface_size, Size, SurfaceSize};

pub const DEFAULT_ROTATE: f32 = 45.0;
pub const DEFAULT_FONT: &str = "20px Arial";
pub const DEFAULT_COLOR: &str = "#000";
pub const DEFAULT_GAP: f32 = 50.0;
pub const DEFAULT_OPACITY: f32 = 1.0;

// ───────────────────────────────────────── bitmap ────────────

/// Shared handle to decoded RGBA pixels plus an optional display size.
///
/// The display size plays the role of a laid-out image's rendered box; when
/// absent the natural size is the pixel size.
#[derive(Clone)]
pub struct Bitmap {
    pixels: Arc<RgbaImage>,
    display_size: Option<Size>,
}

impl Bitmap {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
            display_size: None,
        }
    }

    /// Decode an image file.
    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        Ok(Self::new(image::open(path)?.to_rgba8()))
    }

    pub fn with_display_size(mut self, size: Size) -> Self {
        self.display_size = Some(size);
        self
    }

    /// The size this bitmap naturally occupies when laid out.
    pub fn natural_size(&self) -> Size {
        self.display_size.unwrap_or(Size::new(
            self.pixels.width() as f32,
            self.pixels.height() as f32,
        ))
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Stable identity of the underlying pixel buffer (for backend caches).
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.pixels) as usize
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("pixels", &(self.pixels.width(), self.pixels.height()))
            .field("display_size", &self.display_size)
            .finish()
    }
}

// ───────────────────────────────────────── input ─────────────

/// What gets tiled: a text run or a bitmap, never both.
#[derive(Debug, Clone)]
pub enum Content {
    Text(String),
    Bitmap(Bitmap),
}

/// Intrinsic draw size and pass opacity for bitmap content.
/// A zero width or height means "measure the bitmap".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImageInfo {
    pub width: f32,
    pub height: f32,
    pub opacity: Option<f32>,
}

/// User-facing configuration.  Unset fields take the documented defaults.
#[derive(Debug, Clone)]
pub struct Options {
    pub content: Content,
    pub rotate: Option<f32>,
    pub font: Option<String>,
    pub color: Option<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub x_gap: Option<f32>,
    pub y_gap: Option<f32>,
    pub resize_render: Option<bool>,
    pub high_density: bool,
    pub image_info: Option<ImageInfo>,
}

impl Options {
    pub fn new(content: Content) -> Self {
        Self {
            content,
            rotate: None,
            font: None,
            color: None,
            width: None,
            height: None,
            x_gap: None,
            y_gap: None,
            resize_render: None,
            high_density: false,
            image_info: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Content::Text(text.into()))
    }

    pub fn bitmap(bitmap: Bitmap) -> Self {
        Self::new(Content::Bitmap(bitmap))
    }

    pub fn rotate(mut self, degrees: f32) -> Self {
        self.rotate = Some(degrees);
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn gap(mut self, x_gap: f32, y_gap: f32) -> Self {
        self.x_gap = Some(x_gap);
        self.y_gap = Some(y_gap);
        self
    }

    pub fn resize_render(mut self, enabled: bool) -> Self {
        self.resize_render = Some(enabled);
        self
    }

    pub fn high_density(mut self, enabled: bool) -> Self {
        self.high_density = enabled;
        self
    }

    pub fn image_info(mut self, info: ImageInfo) -> Self {
        self.image_info = Some(info);
        self
    }

    /// Default every field against the host's measured size.
    ///
    /// Never fails: unparsable colours/fonts and unusable gaps fall back to
    /// safe values with a warning.
    pub fn resolve(self, measured: Size) -> (ResolvedOptions, SurfaceSize) {
        let surface = resolve_surface_size(self.width, self.height, measured, self.high_density);

        let font = match self.font.as_deref() {
            None => FontSpec::parse(DEFAULT_FONT).unwrap_or_default(),
            Some(s) => FontSpec::parse(s).unwrap_or_else(|e| {
                tracing::warn!("{e}; falling back to {}", FontSpec::default());
                FontSpec::default()
            }),
        };

        let color = match self.color.as_deref() {
            None => Color::BLACK,
            Some(s) => Color::parse(s).unwrap_or_else(|e| {
                tracing::warn!("{e}; falling back to black");
                Color::BLACK
            }),
        };

        let x_gap = checked_gap("x_gap", self.x_gap.unwrap_or(DEFAULT_GAP));
        let y_gap = checked_gap("y_gap", self.y_gap.unwrap_or(DEFAULT_GAP));

        let content = match self.content {
            Content::Text(text) => TileContent::Text(text),
            Content::Bitmap(bitmap) => resolve_bitmap(bitmap, self.image_info.unwrap_or_default()),
        };

        let resolved = ResolvedOptions {
            content,
            rotate: self.rotate.filter(|r| r.is_finite()).unwrap_or(DEFAULT_ROTATE),
            font,
            color,
            width: surface.width,
            height: surface.height,
            x_gap,
            y_gap,
            resize_render: self.resize_render.unwrap_or(true),
            high_density: self.high_density,
        };
        (resolved, surface)
    }
}

fn checked_gap(name: &str, gap: f32) -> f32 {
    let (gap, corrected) = sanitize_gap(gap);
    if corrected {
        tracing::warn!("{name} must be a positive spacing; using {gap}px");
    }
    gap
}

fn resolve_bitmap(bitmap: Bitmap, info: ImageInfo) -> TileContent {
    let (width, height) = if info.width > 0.0 && info.height > 0.0 {
        (info.width, info.height)
    } else {
        let natural = bitmap.natural_size();
        (natural.width, natural.height)
    };
    TileContent::Bitmap {
        bitmap,
        width,
        height,
        opacity: info.opacity.unwrap_or(DEFAULT_OPACITY).clamp(0.0, 1.0),
    }
}

// ───────────────────────────────────────── resolved ──────────

/// Content with everything the draw pass needs already resolved.
#[derive(Debug, Clone)]
pub enum TileContent {
    Text(String),
    Bitmap {
        bitmap: Bitmap,
        width: f32,
        height: f32,
        opacity: f32,
    },
}

impl TileContent {
    pub fn kind(&self) -> &'static str {
        match self {
            TileContent::Text(_) => "text",
            TileContent::Bitmap { .. } => "bitmap",
        }
    }
}

/// Fully-defaulted options.  Immutable for the duration of a draw pass.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub content: TileContent,
    /// Degrees.
    pub rotate: f32,
    pub font: FontSpec,
    pub color: Color,
    pub width: u32,
    pub height: u32,
    pub x_gap: f32,
    pub y_gap: f32,
    pub resize_render: bool,
    pub high_density: bool,
}

impl ResolvedOptions {
    pub fn rotate_radians(&self) -> f32 {
        self.rotate.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bitmap(w: u32, h: u32) -> Bitmap {
        Bitmap::new(RgbaImage::new(w, h))
    }

    #[test]
    fn test_defaults() {
        let (opts, surface) = Options::text("wm").resolve(Size::new(300.0, 150.0));
        assert_eq!(opts.rotate, 45.0);
        assert_eq!(opts.font.size_px, 20.0);
        assert_eq!(opts.font.families, vec!["Arial"]);
        assert_eq!(opts.color, Color::BLACK);
        assert_eq!((opts.x_gap, opts.y_gap), (50.0, 50.0));
        assert!(opts.resize_render);
        assert!(!opts.high_density);
        assert_eq!((opts.width, opts.height), (300, 150));
        assert!(surface.resize_buffer);
        assert!(matches!(opts.content, TileContent::Text(ref t) if t == "wm"));
    }

    #[test]
    fn test_invalid_color_and_font_fall_back() {
        let (opts, _) = Options::text("wm")
            .color("not-a-colour")
            .font("huge")
            .resolve(Size::new(10.0, 10.0));
        assert_eq!(opts.color, Color::BLACK);
        assert_eq!(opts.font, FontSpec::default());
    }

    #[test]
    fn test_named_and_hsl_colours_resolve() {
        let (opts, _) = Options::text("wm").color("navy").resolve(Size::new(10.0, 10.0));
        assert_eq!(opts.color, Color::rgb(0, 0, 128));
        let (opts, _) = Options::text("wm")
            .color("hsl(0, 100%, 50%)")
            .resolve(Size::new(10.0, 10.0));
        assert_eq!(opts.color, Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_bad_gaps_are_clamped() {
        let (opts, _) = Options::text("wm").gap(0.0, -5.0).resolve(Size::new(10.0, 10.0));
        assert_eq!((opts.x_gap, opts.y_gap), (1.0, 1.0));
    }

    #[test]
    fn test_bitmap_zero_size_measures_natural_size() {
        let bmp = bitmap(8, 4).with_display_size(Size::new(64.0, 32.0));
        let (opts, _) = Options::bitmap(bmp)
            .image_info(ImageInfo {
                width: 0.0,
                height: 0.0,
                opacity: Some(0.3),
            })
            .resolve(Size::new(100.0, 100.0));
        match opts.content {
            TileContent::Bitmap {
                width,
                height,
                opacity,
                ..
            } => {
                assert_eq!((width, height), (64.0, 32.0));
                assert_relative_eq!(opacity, 0.3);
            }
            other => panic!("expected bitmap content, got {}", other.kind()),
        }
    }

    #[test]
    fn test_bitmap_without_display_size_uses_pixels() {
        let (opts, _) = Options::bitmap(bitmap(12, 7)).resolve(Size::new(100.0, 100.0));
        match opts.content {
            TileContent::Bitmap {
                width,
                height,
                opacity,
                ..
            } => {
                assert_eq!((width, height), (12.0, 7.0));
                assert_eq!(opacity, 1.0);
            }
            other => panic!("expected bitmap content, got {}", other.kind()),
        }
    }

    #[test]
    fn test_bitmap_explicit_size_is_kept() {
        let (opts, _) = Options::bitmap(bitmap(12, 7))
            .image_info(ImageInfo {
                width: 30.0,
                height: 20.0,
                opacity: None,
            })
            .resolve(Size::new(100.0, 100.0));
        assert!(matches!(
            opts.content,
            TileContent::Bitmap { width, height, opacity, .. }
                if width == 30.0 && height == 20.0 && opacity == 1.0
        ));
    }

    #[test]
    fn test_rotate_radians() {
        let (opts, _) = Options::text("wm").rotate(90.0).resolve(Size::new(1.0, 1.0));
        assert_relative_eq!(opts.rotate_radians(), std::f32::consts::FRAC_PI_2);
    }
}
