//! Font discovery and loading for the raster backend.
//!
//! Families from a [`FontSpec`] are matched against font files found by
//! walking the configured and system font directories.  File stems are
//! compared after normalisation (`"DejaVu Sans"` ≙ `DejaVuSans.ttf`), and
//! generic families (`sans-serif`, `serif`, `monospace`) expand to a list of
//! commonly installed faces.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::font::FontSpec;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse font {what}: {reason}")]
    Parse { what: String, reason: &'static str },
}

const SANS: &[&str] = &["dejavusans", "liberationsans", "notosans", "arial", "helvetica", "freesans"];
const SERIF: &[&str] = &["dejavuserif", "liberationserif", "notoserif", "timesnewroman", "times", "freeserif"];
const MONO: &[&str] = &["dejavusansmono", "liberationmono", "notosansmono", "couriernew", "courier", "freemono"];

/// Resolves [`FontSpec`]s to loaded fonts, caching both the directory scan
/// and every face it loads.
pub struct FontBook {
    dirs: Vec<PathBuf>,
    /// Lazily built list of `(normalised stem, path)`.
    index: Option<Vec<(String, PathBuf)>>,
    faces: HashMap<PathBuf, Arc<Font>>,
    resolved: HashMap<String, Option<Arc<Font>>>,
    /// When set, every lookup resolves to this face.
    embedded: Option<Arc<Font>>,
}

impl FontBook {
    /// Search `extra_dirs` first, then the platform font directories.
    pub fn new(extra_dirs: Vec<PathBuf>) -> Self {
        let mut dirs = extra_dirs;
        dirs.extend(system_font_dirs());
        Self {
            dirs,
            index: None,
            faces: HashMap::new(),
            resolved: HashMap::new(),
            embedded: None,
        }
    }

    /// A book that always uses the given font bytes.
    pub fn with_font(bytes: Vec<u8>) -> Result<Self, FontError> {
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| {
            FontError::Parse {
                what: "embedded font".to_string(),
                reason,
            }
        })?;
        Ok(Self {
            dirs: Vec::new(),
            index: Some(Vec::new()),
            faces: HashMap::new(),
            resolved: HashMap::new(),
            embedded: Some(Arc::new(font)),
        })
    }

    /// Find a face for `spec`, falling back through generic sans-serif
    /// families and finally to any installed face.
    pub fn resolve(&mut self, spec: &FontSpec) -> Option<Arc<Font>> {
        if let Some(font) = &self.embedded {
            return Some(Arc::clone(font));
        }

        let key = format!("{}|{}|{}", spec.families.join(","), spec.bold, spec.italic);
        if let Some(hit) = self.resolved.get(&key) {
            return hit.clone();
        }

        let found = self.lookup(spec);
        match &found {
            Some(_) => tracing::debug!("font `{}` resolved", spec),
            None => tracing::warn!("no font file found for `{}`; text will not be drawn", spec),
        }
        self.resolved.insert(key, found.clone());
        found
    }

    fn lookup(&mut self, spec: &FontSpec) -> Option<Arc<Font>> {
        let mut wanted: Vec<String> = Vec::new();
        for family in spec.families.iter().map(|f| normalise(f)) {
            match family.as_str() {
                "sansserif" | "systemui" => wanted.extend(SANS.iter().map(|s| s.to_string())),
                "serif" => wanted.extend(SERIF.iter().map(|s| s.to_string())),
                "monospace" => wanted.extend(MONO.iter().map(|s| s.to_string())),
                _ => wanted.push(family),
            }
        }
        wanted.extend(SANS.iter().map(|s| s.to_string()));

        let path = wanted
            .iter()
            .find_map(|family| self.find_file(family, spec.bold, spec.italic))
            .or_else(|| self.index().first().map(|(_, p)| p.clone()))?;

        match self.face(&path) {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::warn!("{e}");
                None
            }
        }
    }

    /// Best file for a normalised family: exact style variant, then the
    /// regular face, then the shortest stem that starts with the family.
    fn find_file(&mut self, family: &str, bold: bool, italic: bool) -> Option<PathBuf> {
        let mut exact: Vec<String> = Vec::new();
        match (bold, italic) {
            (true, true) => {
                exact.push(format!("{family}bolditalic"));
                exact.push(format!("{family}boldoblique"));
            }
            (true, false) => exact.push(format!("{family}bold")),
            (false, true) => {
                exact.push(format!("{family}italic"));
                exact.push(format!("{family}oblique"));
            }
            (false, false) => {}
        }
        exact.push(family.to_string());
        exact.push(format!("{family}regular"));
        exact.push(format!("{family}book"));

        let index = self.index();
        for name in &exact {
            if let Some((_, path)) = index.iter().find(|(stem, _)| stem == name) {
                return Some(path.clone());
            }
        }
        index
            .iter()
            .filter(|(stem, _)| stem.starts_with(family))
            .min_by_key(|(stem, _)| stem.len())
            .map(|(_, path)| path.clone())
    }

    fn index(&mut self) -> &[(String, PathBuf)] {
        let dirs = &self.dirs;
        self.index.get_or_insert_with(|| scan_dirs(dirs))
    }

    fn face(&mut self, path: &Path) -> Result<Arc<Font>, FontError> {
        if let Some(font) = self.faces.get(path) {
            return Ok(Arc::clone(font));
        }
        let font = Arc::new(load_font(path)?);
        self.faces.insert(path.to_path_buf(), Arc::clone(&font));
        Ok(font)
    }
}

/// Read and parse a single font file.
pub fn load_font(path: &Path) -> Result<Font, FontError> {
    let bytes = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| FontError::Parse {
        what: path.display().to_string(),
        reason,
    })
}

fn scan_dirs(dirs: &[PathBuf]) -> Vec<(String, PathBuf)> {
    let mut out = Vec::new();
    for dir in dirs.iter().filter(|d| d.is_dir()) {
        for entry in WalkDir::new(dir).follow_links(true).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_font = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .is_some_and(|e| e == "ttf" || e == "otf");
            if !is_font {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                out.push((normalise(&stem.to_string_lossy()), path.to_path_buf()));
            }
        }
    }
    // Deterministic fallback order.
    out.sort();
    tracing::debug!("indexed {} font files", out.len());
    out
}

/// Lower-case and keep only ASCII alphanumerics.
fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts"),
    ];
    if let Ok(home) = std::env::var("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join(".fonts"));
        dirs.push(home.join("Library/Fonts"));
    }
    if let Ok(windir) = std::env::var("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with_files(names: &[&str]) -> FontBook {
        let mut book = FontBook::new(Vec::new());
        book.index = Some(
            names
                .iter()
                .map(|n| {
                    let path = PathBuf::from(format!("/fonts/{n}"));
                    let stem = Path::new(n).file_stem().unwrap().to_string_lossy().into_owned();
                    (normalise(&stem), path)
                })
                .collect(),
        );
        book
    }

    #[test]
    fn test_normalise() {
        assert_eq!(normalise("DejaVu Sans-Bold"), "dejavusansbold");
        assert_eq!(normalise("'Noto Sans'"), "notosans");
    }

    #[test]
    fn test_find_regular_and_style_variants() {
        let mut book = book_with_files(&["Arial.ttf", "Arial_Bold.ttf", "Arial_Italic.ttf"]);
        assert_eq!(book.find_file("arial", false, false), Some(PathBuf::from("/fonts/Arial.ttf")));
        assert_eq!(
            book.find_file("arial", true, false),
            Some(PathBuf::from("/fonts/Arial_Bold.ttf"))
        );
        assert_eq!(
            book.find_file("arial", false, true),
            Some(PathBuf::from("/fonts/Arial_Italic.ttf"))
        );
    }

    #[test]
    fn test_prefix_match_prefers_shortest_stem() {
        let mut book = book_with_files(&["DejaVuSansMono.ttf", "DejaVuSans-ExtraLight.ttf", "DejaVuSans.ttf"]);
        assert_eq!(
            book.find_file("dejavusans", false, false),
            Some(PathBuf::from("/fonts/DejaVuSans.ttf"))
        );
        let mut book = book_with_files(&["DejaVuSansMono.ttf", "DejaVuSans-ExtraLight.ttf"]);
        assert_eq!(
            book.find_file("dejavusans", false, false),
            Some(PathBuf::from("/fonts/DejaVuSansMono.ttf"))
        );
    }

    #[test]
    fn test_missing_family() {
        let mut book = book_with_files(&["Arial.ttf"]);
        assert_eq!(book.find_file("comicsans", false, false), None);
    }

    #[test]
    fn test_scan_dirs_filters_extensions() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("truetype")).unwrap();
        std::fs::write(dir.path().join("truetype/Foo-Regular.ttf"), b"").unwrap();
        std::fs::write(dir.path().join("Bar.otf"), b"").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();

        let stems: Vec<String> = scan_dirs(&[dir.path().to_path_buf()])
            .into_iter()
            .map(|(stem, _)| stem)
            .collect();
        assert_eq!(stems, vec!["bar".to_string(), "fooregular".to_string()]);
    }

    #[test]
    fn test_load_font_rejects_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(matches!(load_font(&path), Err(FontError::Parse { .. })));
        assert!(matches!(
            load_font(&dir.path().join("missing.ttf")),
            Err(FontError::Io { .. })
        ));
    }
}
