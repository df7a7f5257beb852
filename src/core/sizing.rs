//! Surface sizing — concrete pixel dimensions from explicit config or the
//! host's measured layout size.

/// A size in (possibly fractional) layout pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Concrete pixel dimensions for a draw pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
    /// Whether the host's backing buffer should be resized to match.
    /// `false` only when both dimensions were given explicitly.
    pub resize_buffer: bool,
}

/// Pixel multiplier for high-density rendering.
pub fn density_multiplier(high_density: bool) -> f32 {
    if high_density {
        2.0
    } else {
        1.0
    }
}

/// `(explicit ?? measured) × multiplier`, per axis.
///
/// An explicit value of `0` (or a non-finite one) counts as unset.
pub fn resolve_surface_size(
    explicit_width: Option<f32>,
    explicit_height: Option<f32>,
    measured: Size,
    high_density: bool,
) -> SurfaceSize {
    let explicit_width = explicit_width.filter(|w| w.is_finite() && *w > 0.0);
    let explicit_height = explicit_height.filter(|h| h.is_finite() && *h > 0.0);
    let resize_buffer = explicit_width.is_none() || explicit_height.is_none();

    let m = density_multiplier(high_density);
    SurfaceSize {
        width: to_pixels(explicit_width.unwrap_or(measured.width) * m),
        height: to_pixels(explicit_height.unwrap_or(measured.height) * m),
        resize_buffer,
    }
}

/// Scale a measured size for a resize notification.
pub fn scaled_size(size: Size, high_density: bool) -> (u32, u32) {
    let m = density_multiplier(high_density);
    (to_pixels(size.width * m), to_pixels(size.height * m))
}

/// Truncate toward zero, never below one pixel.
fn to_pixels(v: f32) -> u32 {
    if v.is_finite() && v >= 1.0 {
        v.min(u32::MAX as f32) as u32
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_density_doubles_measured_size() {
        let size = resolve_surface_size(None, None, Size::new(100.0, 50.0), true);
        assert_eq!((size.width, size.height), (200, 100));
        assert!(size.resize_buffer);
    }

    #[test]
    fn test_explicit_dimensions_skip_buffer_resize() {
        let size = resolve_surface_size(Some(640.0), Some(480.0), Size::new(1.0, 1.0), false);
        assert_eq!((size.width, size.height), (640, 480));
        assert!(!size.resize_buffer);
    }

    #[test]
    fn test_partial_explicit_mixes_with_measured() {
        let size = resolve_surface_size(Some(300.0), None, Size::new(10.0, 70.0), false);
        assert_eq!((size.width, size.height), (300, 70));
        assert!(size.resize_buffer);
    }

    #[test]
    fn test_zero_explicit_counts_as_unset() {
        let size = resolve_surface_size(Some(0.0), Some(0.0), Size::new(120.0, 80.0), false);
        assert_eq!((size.width, size.height), (120, 80));
        assert!(size.resize_buffer);
    }

    #[test]
    fn test_fractional_measured_truncates() {
        let size = resolve_surface_size(None, None, Size::new(99.9, 0.4), false);
        assert_eq!((size.width, size.height), (99, 1));
    }

    #[test]
    fn test_scaled_size() {
        assert_eq!(scaled_size(Size::new(320.0, 240.0), true), (640, 480));
        assert_eq!(scaled_size(Size::new(320.0, 240.0), false), (320, 240));
    }
}
