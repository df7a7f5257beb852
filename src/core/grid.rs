//! Tile grid — the set of anchor positions covering a surface.
//!
//! The grid deliberately overshoots the surface by one full tile on each
//! axis (`0..=ceil(W/gap)+1`), so rotated tiles still reach the far edges.

/// Smallest spacing accepted between tiles, in pixels.
pub const MIN_GAP: f32 = 1.0;

/// One tile position: grid indices plus the pixel anchor they map to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub i: u32,
    pub k: u32,
    pub x: f32,
    pub y: f32,
}

/// Grid of tile anchors for a `width × height` surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    x_gap: f32,
    y_gap: f32,
    columns: u32,
    rows: u32,
}

impl TileGrid {
    /// Build the grid.  Gaps must already be sanitised (see [`sanitize_gap`]);
    /// anything below [`MIN_GAP`] is raised to it here as a last line.
    pub fn new(width: u32, height: u32, x_gap: f32, y_gap: f32) -> Self {
        let x_gap = x_gap.max(MIN_GAP);
        let y_gap = y_gap.max(MIN_GAP);
        Self {
            x_gap,
            y_gap,
            columns: axis_count(width, x_gap),
            rows: axis_count(height, y_gap),
        }
    }

    /// Number of distinct `i` values.
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of distinct `k` values.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Total anchor count (`columns × rows`).
    pub fn len(&self) -> usize {
        (self.columns as usize).saturating_mul(self.rows as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn anchor(&self, i: u32, k: u32) -> Anchor {
        Anchor {
            i,
            k,
            x: i as f32 * self.x_gap,
            y: k as f32 * self.y_gap,
        }
    }

    /// The last anchor in draw order (largest coordinates).
    pub fn last(&self) -> Anchor {
        self.anchor(self.columns - 1, self.rows - 1)
    }

    /// Anchors in row-major order: `i` outer, `k` inner.
    pub fn anchors(&self) -> impl Iterator<Item = Anchor> + '_ {
        (0..self.columns).flat_map(move |i| (0..self.rows).map(move |k| self.anchor(i, k)))
    }
}

/// `ceil(extent / gap) + 2` — the inclusive `0..=ceil+1` range length.
fn axis_count(extent: u32, gap: f32) -> u32 {
    let steps = (extent as f64 / gap as f64).ceil();
    // `steps <= extent` because gap >= 1px, but `extent` itself may be u32::MAX.
    (steps as u32).saturating_add(2)
}

/// Clamp a user-supplied gap to something that can't blow up the tile loop.
/// Returns the sanitised value and whether a correction was made.
pub fn sanitize_gap(gap: f32) -> (f32, bool) {
    if gap.is_finite() && gap >= MIN_GAP {
        (gap, false)
    } else {
        (MIN_GAP, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_grid_200_by_100() {
        let grid = TileGrid::new(200, 100, 50.0, 50.0);
        assert_eq!(grid.columns(), 6);
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.len(), 24);

        let anchors: Vec<Anchor> = grid.anchors().collect();
        assert_eq!(anchors.len(), 24);
        assert_eq!((anchors[0].x, anchors[0].y), (0.0, 0.0));
        let last = anchors[anchors.len() - 1];
        assert_eq!((last.x, last.y), (250.0, 150.0));
        assert_eq!(last, grid.last());
    }

    #[test]
    fn test_row_major_order() {
        let grid = TileGrid::new(100, 50, 50.0, 50.0);
        let order: Vec<(u32, u32)> = grid.anchors().map(|a| (a.i, a.k)).collect();
        assert_eq!(&order[..4], &[(0, 0), (0, 1), (0, 2), (0, 3)]);
        assert_eq!(order[4], (1, 0));
    }

    #[test]
    fn test_non_multiple_extent_rounds_up() {
        // ceil(101/50) = 3 → 5 columns.
        let grid = TileGrid::new(101, 1, 50.0, 50.0);
        assert_eq!(grid.columns(), 5);
        assert_eq!(grid.rows(), 3);
    }

    #[test]
    fn test_huge_extent_saturates() {
        let grid = TileGrid::new(u32::MAX, 1, 1.0, 1.0);
        assert_eq!(grid.columns(), u32::MAX);
        assert_eq!(grid.rows(), 3);
        assert!(!grid.is_empty());
    }

    #[test]
    fn test_zero_extent_still_two_per_axis() {
        let grid = TileGrid::new(0, 0, 50.0, 50.0);
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn test_sanitize_gap() {
        assert_eq!(sanitize_gap(50.0), (50.0, false));
        assert_eq!(sanitize_gap(0.0), (MIN_GAP, true));
        assert_eq!(sanitize_gap(-3.0), (MIN_GAP, true));
        assert_eq!(sanitize_gap(f32::NAN), (MIN_GAP, true));
        assert_eq!(sanitize_gap(f32::INFINITY), (MIN_GAP, true));
    }

    #[test]
    fn test_degenerate_gap_is_bounded() {
        let grid = TileGrid::new(10, 10, 0.0, 0.0);
        assert_eq!(grid.columns(), 12);
        assert_eq!(grid.rows(), 12);
    }

    proptest! {
        /// Property: anchor count follows the overshoot formula.
        #[test]
        fn prop_anchor_count(
            w in 0u32..2000,
            h in 0u32..2000,
            gx in 1.0f32..300.0,
            gy in 1.0f32..300.0,
        ) {
            let grid = TileGrid::new(w, h, gx, gy);
            let expected = ((w as f64 / gx as f64).ceil() as usize + 2)
                * ((h as f64 / gy as f64).ceil() as usize + 2);
            prop_assert_eq!(grid.len(), expected);
            prop_assert_eq!(grid.anchors().count(), expected);
        }

        /// Property: the furthest anchor reaches past the surface on both axes.
        #[test]
        fn prop_full_coverage(
            w in 0u32..2000,
            h in 0u32..2000,
            gx in 1.0f32..300.0,
            gy in 1.0f32..300.0,
        ) {
            let last = TileGrid::new(w, h, gx, gy).last();
            prop_assert!(last.x >= w as f32);
            prop_assert!(last.y >= h as f32);
        }

        /// Property: identical inputs give identical anchor sequences.
        #[test]
        fn prop_deterministic(w in 0u32..800, h in 0u32..800, g in 5.0f32..100.0) {
            let a: Vec<Anchor> = TileGrid::new(w, h, g, g).anchors().collect();
            let b: Vec<Anchor> = TileGrid::new(w, h, g, g).anchors().collect();
            prop_assert_eq!(a, b);
        }
    }
}
