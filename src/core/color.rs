//! Fill colours parsed from CSS colour strings (`#000`, `navy`,
//! `rgba(0, 0, 0, 0.5)`, `hsl(0 100% 50%)`), via `csscolorparser`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Straight (non-premultiplied) 8-bit RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("empty colour string")]
    Empty,
    #[error("invalid colour `{input}`: {reason}")]
    Invalid { input: String, reason: String },
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse any CSS Color Level 4 string.
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorError::Empty);
        }
        let [r, g, b, a] = csscolorparser::parse(s)
            .map_err(|e| ColorError::Invalid {
                input: s.to_string(),
                reason: e.to_string(),
            })?
            .to_rgba8();
        Ok(Color::rgba(r, g, b, a))
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}
