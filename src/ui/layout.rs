//! Layout helpers — split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Preview pane plus a bottom status bar.
pub struct AppLayout {
    pub preview_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // preview pane
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Self {
            preview_area: chunks[0],
            status_area: chunks[1],
        }
    }

    /// The pane's drawable area once its border is taken off.
    pub fn preview_inner(&self) -> Rect {
        self.preview_area.inner(ratatui::layout::Margin::new(1, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bar_is_last_row() {
        let layout = AppLayout::from_area(Rect::new(0, 0, 40, 12));
        assert_eq!(layout.status_area, Rect::new(0, 11, 40, 1));
        assert_eq!(layout.preview_area.height, 11);
        assert_eq!(layout.preview_inner(), Rect::new(1, 1, 38, 9));
    }
}
