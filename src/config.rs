//! User configuration — watermark defaults and persistence.
//!
//! Defaults are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/tilemark/config.toml` (default `~/.config/tilemark/config.toml`).
//! Command-line flags override anything loaded from here.

use std::path::{Path, PathBuf};

use crate::core::options::{
    Content, ImageInfo, Options, DEFAULT_COLOR, DEFAULT_FONT, DEFAULT_GAP, DEFAULT_OPACITY,
    DEFAULT_ROTATE,
};

/// Persisted watermark defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkConfig {
    /// Tile rotation in degrees.
    pub rotate: f32,
    pub font: String,
    pub color: String,
    pub x_gap: f32,
    pub y_gap: f32,
    /// Redraw automatically when the surface is resized.
    pub resize_render: bool,
    /// Render at 2× the measured size.
    pub high_density: bool,
    /// Pass opacity for image watermarks.
    pub opacity: f32,
    /// Extra directories searched for font files, before the system ones.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            rotate: DEFAULT_ROTATE,
            font: DEFAULT_FONT.to_string(),
            color: DEFAULT_COLOR.to_string(),
            x_gap: DEFAULT_GAP,
            y_gap: DEFAULT_GAP,
            resize_render: true,
            high_density: false,
            opacity: DEFAULT_OPACITY,
            font_dirs: Vec::new(),
        }
    }
}

impl WatermarkConfig {
    /// Seed [`Options`] for `content` with these defaults.
    pub fn options(&self, content: Content) -> Options {
        let options = Options::new(content)
            .rotate(self.rotate)
            .font(self.font.clone())
            .color(self.color.clone())
            .gap(self.x_gap, self.y_gap)
            .resize_render(self.resize_render)
            .high_density(self.high_density);
        if matches!(options.content, Content::Bitmap(_)) {
            options.image_info(ImageInfo {
                width: 0.0,
                height: 0.0,
                opacity: Some(self.opacity),
            })
        } else {
            options
        }
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            if let Ok(contents) = std::fs::read_to_string(path) {
                return Self::parse_config(&contents);
            }
        }
        Self::default()
    }

    /// Persist current config to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialise())?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            match key {
                "rotate" => {
                    if let Ok(v) = value.parse::<f32>() {
                        if v.is_finite() {
                            config.rotate = v.rem_euclid(360.0);
                        }
                    }
                }
                "font" if !value.is_empty() => config.font = value.to_string(),
                "color" if !value.is_empty() => config.color = value.to_string(),
                "x_gap" => {
                    if let Ok(v) = value.parse::<f32>() {
                        // Keep this bounded so a typo can't explode the tile count.
                        config.x_gap = v.clamp(1.0, 4096.0);
                    }
                }
                "y_gap" => {
                    if let Ok(v) = value.parse::<f32>() {
                        config.y_gap = v.clamp(1.0, 4096.0);
                    }
                }
                "resize_render" => config.resize_render = value == "true",
                "high_density" => config.high_density = value == "true",
                "opacity" => {
                    if let Ok(v) = value.parse::<f32>() {
                        config.opacity = v.clamp(0.0, 1.0);
                    }
                }
                "font_dir" if !value.is_empty() => config.font_dirs.push(PathBuf::from(value)),
                _ => {}
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# tilemark configuration".to_string(),
            String::new(),
            "# Tile layout".to_string(),
            format!("rotate = {}", self.rotate),
            format!("x_gap = {}", self.x_gap),
            format!("y_gap = {}", self.y_gap),
            String::new(),
            "# Appearance".to_string(),
            format!("font = \"{}\"", self.font),
            format!("color = \"{}\"", self.color),
            format!("opacity = {}", self.opacity),
            String::new(),
            "# Surface".to_string(),
            format!("resize_render = {}", self.resize_render),
            format!("high_density = {}", self.high_density),
            String::new(),
            "# Font search (repeatable)".to_string(),
        ];
        for dir in &self.font_dirs {
            lines.push(format!("font_dir = \"{}\"", dir.display()));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/tilemark/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("tilemark").join("config.toml")
}
