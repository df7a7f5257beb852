//! UI / rendering layer — everything that touches Ratatui widgets.
//!
//! Takes the preview state and turns it into terminal cells.  No file I/O
//! happens here.

pub mod layout;
pub mod preview;
pub mod theme;
