//! CSS font shorthand parsing (`"bold 20px Arial"`, `"12pt 'Noto Sans', serif"`).
//!
//! Only the parts the raster backend can use are kept: pixel size, weight,
//! style, and the ordered family list.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Parsed font descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub size_px: f32,
    pub bold: bool,
    pub italic: bool,
    /// Family names in preference order, quotes stripped.
    pub families: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FontSpecError {
    #[error("font descriptor has no size: `{0}`")]
    MissingSize(String),
    #[error("invalid font size `{0}`")]
    InvalidSize(String),
    #[error("font descriptor has no family: `{0}`")]
    MissingFamily(String),
}

impl Default for FontSpec {
    /// The 2-D canvas default, `10px sans-serif`.
    fn default() -> Self {
        Self {
            size_px: 10.0,
            bold: false,
            italic: false,
            families: vec!["sans-serif".to_string()],
        }
    }
}

impl FontSpec {
    pub fn parse(s: &str) -> Result<Self, FontSpecError> {
        let s = s.trim();
        let mut bold = false;
        let mut italic = false;

        let mut rest = s;
        let size_px = loop {
            let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let token = &rest[..token_end];
            if token.is_empty() {
                return Err(FontSpecError::MissingSize(s.to_string()));
            }
            rest = rest[token_end..].trim_start();

            match token.to_ascii_lowercase().as_str() {
                "normal" | "small-caps" => continue,
                "italic" | "oblique" => {
                    italic = true;
                    continue;
                }
                "bold" | "bolder" => {
                    bold = true;
                    continue;
                }
                "lighter" => continue,
                t if t.chars().all(|c| c.is_ascii_digit()) => {
                    // Numeric weight (100..900).
                    bold = t.parse::<u32>().map(|w| w >= 600).unwrap_or(false);
                    continue;
                }
                t => break parse_size(t)?,
            }
        };

        let families: Vec<String> = rest
            .split(',')
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
            .filter(|f| !f.is_empty())
            .collect();
        if families.is_empty() {
            return Err(FontSpecError::MissingFamily(s.to_string()));
        }

        Ok(Self {
            size_px,
            bold,
            italic,
            families,
        })
    }
}

impl FromStr for FontSpec {
    type Err = FontSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FontSpec::parse(s)
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.italic {
            f.write_str("italic ")?;
        }
        if self.bold {
            f.write_str("bold ")?;
        }
        write!(f, "{}px {}", self.size_px, self.families.join(", "))
    }
}

/// `20px`, `15pt`, `1.5em`, optionally followed by `/line-height`.
fn parse_size(token: &str) -> Result<f32, FontSpecError> {
    let size = token.split('/').next().unwrap_or(token);
    let invalid = || FontSpecError::InvalidSize(token.to_string());

    let (number, scale) = if let Some(n) = size.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = size.strip_suffix("pt") {
        (n, 4.0 / 3.0)
    } else if let Some(n) = size.strip_suffix("em") {
        (n, 16.0)
    } else {
        return Err(invalid());
    };

    let value: f32 = number.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid());
    }
    Ok(value * scale)
}
