// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font registry — resolves the requested typeface to font data the renderer
// can embed, or to a built-in fallback.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use legible_core::config::{DEFAULT_FALLBACK_FONT, FontConfig};
use legible_core::error::{LegibleError, Result};
use printpdf::{BuiltinFont, ParsedFont, PdfWarnMsg};
use tracing::{debug, info, instrument, warn};

use super::metrics::{BuiltinMetrics, FontMetrics, TrueTypeMetrics};

/// How the active font reaches the output document.
pub enum FontSource {
    /// One of the standard PDF fonts every viewer provides.
    Builtin(BuiltinFont),
    /// A TrueType/OpenType file embedded into the output.
    Embedded(Box<ParsedFont>),
}

impl std::fmt::Debug for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin(font) => f.debug_tuple("Builtin").field(font).finish(),
            Self::Embedded(_) => f.write_str("Embedded(..)"),
        }
    }
}

/// The font used for every body-text line of one conversion.
#[derive(Debug)]
pub struct ActiveFont {
    /// Name the font was resolved under.
    pub name: String,
    pub source: FontSource,
    pub metrics: FontMetrics,
    /// True when the requested font could not be registered.
    pub is_fallback: bool,
}

impl ActiveFont {
    /// Helvetica, always available.
    pub fn helvetica() -> Self {
        Self {
            name: "Helvetica".into(),
            source: FontSource::Builtin(BuiltinFont::Helvetica),
            metrics: FontMetrics::Builtin(BuiltinMetrics::Helvetica),
            is_fallback: false,
        }
    }
}

/// Resolves font names against the built-in fonts and the configured font
/// directories.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    font_dirs: Vec<PathBuf>,
    fallback: String,
}

impl FontRegistry {
    pub fn new(config: &FontConfig) -> Self {
        Self {
            font_dirs: config.font_dirs.clone(),
            fallback: config.fallback.clone(),
        }
    }

    /// Resolve `name`, substituting the fallback font when it cannot be
    /// registered. Never fails.
    #[instrument(skip(self))]
    pub fn resolve_or_fallback(&self, name: &str) -> ActiveFont {
        match self.resolve(name) {
            Ok(font) => {
                info!(font = %font.name, "font registered");
                font
            }
            Err(err) => {
                warn!(requested = name, fallback = %self.fallback, %err, "font registration failed, using fallback");
                let mut font = builtin_font(&self.fallback).unwrap_or_else(|| {
                    warn!(fallback = %self.fallback, "fallback is not a measurable built-in font, using {DEFAULT_FALLBACK_FONT}");
                    ActiveFont::helvetica()
                });
                font.is_fallback = true;
                font
            }
        }
    }

    /// Resolve `name` to a built-in font or a font file in the font directories.
    pub fn resolve(&self, name: &str) -> Result<ActiveFont> {
        if let Some(font) = builtin_font(name) {
            return Ok(font);
        }

        let wanted = normalize_name(name);
        for dir in &self.font_dirs {
            if let Some(path) = find_font_file(dir, &wanted) {
                return load_font_file(name, &path);
            }
        }

        Err(LegibleError::FontError(format!(
            "no font named '{name}' in {:?}",
            self.font_dirs
        )))
    }
}

/// Load and validate a font file for both measurement and embedding.
fn load_font_file(name: &str, path: &Path) -> Result<ActiveFont> {
    let data = fs::read(path).map_err(|err| {
        LegibleError::FontError(format!("failed to read {}: {}", path.display(), err))
    })?;
    let data = Arc::new(data);

    let metrics = TrueTypeMetrics::from_data(Arc::clone(&data)).ok_or_else(|| {
        LegibleError::FontError(format!("{} is not a usable font file", path.display()))
    })?;

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let parsed = ParsedFont::from_bytes(&data, 0, &mut warnings).ok_or_else(|| {
        LegibleError::FontError(format!("{} cannot be embedded in a PDF", path.display()))
    })?;

    debug!(path = %path.display(), bytes = data.len(), "font file loaded");

    Ok(ActiveFont {
        name: name.to_string(),
        source: FontSource::Embedded(Box::new(parsed)),
        metrics: FontMetrics::TrueType(metrics),
        is_fallback: false,
    })
}

/// Find a `.ttf`/`.otf` file whose stem or embedded family name matches.
fn find_font_file(dir: &Path, wanted: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_font_file(path))
        .collect();
    candidates.sort();

    // File names are cheap to check; only open files when no stem matches.
    if let Some(hit) = candidates.iter().find(|path| {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| normalize_name(stem) == wanted)
    }) {
        return Some(hit.clone());
    }

    candidates
        .into_iter()
        .find(|path| face_names(path).iter().any(|n| normalize_name(n) == wanted))
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"))
        .unwrap_or(false)
}

fn face_names(path: &Path) -> Vec<String> {
    use ttf_parser::name::name_id;

    let Ok(data) = fs::read(path) else {
        return Vec::new();
    };
    let Ok(face) = ttf_parser::Face::parse(&data, 0) else {
        return Vec::new();
    };
    face.names()
        .into_iter()
        .filter(|entry| {
            matches!(
                entry.name_id,
                name_id::FAMILY | name_id::TYPOGRAPHIC_FAMILY | name_id::FULL_NAME | name_id::POST_SCRIPT_NAME
            )
        })
        .filter_map(|entry| entry.to_string())
        .collect()
}

/// Built-in fonts Legible can measure exactly.
fn builtin_font(name: &str) -> Option<ActiveFont> {
    let font = match normalize_name(name).as_str() {
        "helvetica" | "arial" => BuiltinFont::Helvetica,
        "helveticaoblique" => BuiltinFont::HelveticaOblique,
        "courier" => BuiltinFont::Courier,
        "courierbold" => BuiltinFont::CourierBold,
        "courieroblique" => BuiltinFont::CourierOblique,
        "courierboldoblique" => BuiltinFont::CourierBoldOblique,
        _ => return None,
    };
    let metrics = BuiltinMetrics::for_builtin(&font)?;
    Some(ActiveFont {
        name: name.to_string(),
        source: FontSource::Builtin(font),
        metrics: FontMetrics::Builtin(metrics),
        is_fallback: false,
    })
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MONTSERRAT;

    fn registry_without_dirs() -> FontRegistry {
        FontRegistry::new(&FontConfig {
            font_dirs: Vec::new(),
            fallback: "Helvetica".into(),
        })
    }

    #[test]
    fn builtin_names_resolve_directly() {
        let font = registry_without_dirs().resolve("courier").unwrap();
        assert!(matches!(font.source, FontSource::Builtin(BuiltinFont::Courier)));
        assert!(!font.is_fallback);
    }

    #[test]
    fn missing_font_is_an_error() {
        let err = registry_without_dirs().resolve("OpenDyslexic").unwrap_err();
        assert!(matches!(err, LegibleError::FontError(_)));
    }

    #[test]
    fn missing_font_falls_back_to_helvetica() {
        let font = registry_without_dirs().resolve_or_fallback("OpenDyslexic");
        assert!(font.is_fallback);
        assert!(matches!(font.source, FontSource::Builtin(BuiltinFont::Helvetica)));
    }

    #[test]
    fn unmeasurable_fallback_becomes_helvetica() {
        let registry = FontRegistry::new(&FontConfig {
            font_dirs: Vec::new(),
            fallback: "Zapf-Chancery".into(),
        });
        let font = registry.resolve_or_fallback("OpenDyslexic");
        assert!(font.is_fallback);
        assert_eq!(font.name, "Helvetica");
    }

    #[test]
    fn nonexistent_directory_is_skipped() {
        let registry = FontRegistry::new(&FontConfig {
            font_dirs: vec![PathBuf::from("/definitely/not/a/font/dir")],
            fallback: "Courier".into(),
        });
        let font = registry.resolve_or_fallback("OpenDyslexic");
        assert!(matches!(font.source, FontSource::Builtin(BuiltinFont::Courier)));
    }

    #[test]
    fn names_normalise_case_and_separators() {
        assert_eq!(normalize_name(" Open Dyslexic-Regular "), "opendyslexicregular");
    }

    fn registry_for(dir: &Path) -> FontRegistry {
        FontRegistry::new(&FontConfig {
            font_dirs: vec![dir.to_path_buf()],
            fallback: "Helvetica".into(),
        })
    }

    #[test]
    fn unparseable_font_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("OpenDyslexic.ttf"), b"definitely not a font").unwrap();
        let registry = registry_for(dir.path());

        let err = registry.resolve("OpenDyslexic").unwrap_err();
        assert!(matches!(err, LegibleError::FontError(_)));

        let font = registry.resolve_or_fallback("OpenDyslexic");
        assert!(font.is_fallback);
        assert!(matches!(font.source, FontSource::Builtin(BuiltinFont::Helvetica)));
    }

    #[test]
    fn file_stem_matches_ignoring_case_and_separators() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Montserrat-Regular.ttf"), MONTSERRAT).unwrap();

        let font = registry_for(dir.path()).resolve("montserrat regular").unwrap();
        assert_eq!(font.name, "montserrat regular");
        assert!(!font.is_fallback);
        assert!(matches!(font.source, FontSource::Embedded(_)));
        assert!(matches!(font.metrics, FontMetrics::TrueType(_)));
    }

    #[test]
    fn family_name_matches_when_the_stem_does_not() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("download-1234.TTF"), MONTSERRAT).unwrap();

        let font = registry_for(dir.path()).resolve("Montserrat").unwrap();
        assert!(matches!(font.source, FontSource::Embedded(_)));
    }

    #[test]
    fn files_without_a_font_extension_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Montserrat.bin"), MONTSERRAT).unwrap();

        assert!(registry_for(dir.path()).resolve("Montserrat").is_err());
    }
}
