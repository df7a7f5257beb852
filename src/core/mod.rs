//! Core algorithms – tile grid layout, surface sizing, option resolution,
//! and the structural node model the tamper guard works on.
//!
//! Nothing in this module depends on the TUI or on a drawing backend; the
//! only foreign type is `image::RgbaImage`, carried opaquely by [`options::Bitmap`].

pub mod color;
pub mod font;
pub mod grid;
pub mod options;
pub mod sizing;
pub mod tree;
