// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion configuration: caller-supplied formatting plus converter-wide
// layout and font settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::TextColor;
use crate::error::{LegibleError, Result};
use crate::types::PaperSize;

pub const DEFAULT_FONT_NAME: &str = "OpenDyslexic";
pub const DEFAULT_FONT_SIZE: f32 = 12.0;
pub const DEFAULT_LINE_SPACING: f32 = 14.0;
pub const DEFAULT_LETTER_SPACING: f32 = 0.1;
pub const DEFAULT_TEXT_COLOR: &str = "black";

/// Smallest usable vertical advance between lines, in points.
pub const MIN_LINE_SPACING: f32 = 0.1;

/// Fixed margin on all four sides of an output page, in points.
pub const DEFAULT_MARGIN: f32 = 50.0;

/// Words whose rounded top coordinates fall in the same multiple of this
/// value are treated as one line. 1.0 rounds to the nearest point.
pub const DEFAULT_LINE_BUCKET_GRANULARITY: f32 = 1.0;

/// Built-in font substituted when the requested typeface cannot be registered.
pub const DEFAULT_FALLBACK_FONT: &str = "Helvetica";

/// Formatting requested by the caller for one conversion.
///
/// Values arrive unvalidated (typically from a form or a settings file);
/// call [`FormattingConfig::resolve`] before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingConfig {
    /// Typeface for all body text.
    pub font_name: String,
    /// Font size in points.
    pub font_size: f32,
    /// Vertical advance per line, in points.
    pub line_spacing: f32,
    /// Extra spacing applied after every character, in points.
    pub letter_spacing: f32,
    /// Named colour or `#RRGGBB`.
    pub text_color: String,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            font_name: DEFAULT_FONT_NAME.into(),
            font_size: DEFAULT_FONT_SIZE,
            line_spacing: DEFAULT_LINE_SPACING,
            letter_spacing: DEFAULT_LETTER_SPACING,
            text_color: DEFAULT_TEXT_COLOR.into(),
        }
    }
}

/// Formatting after validation: every field usable as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFormatting {
    pub font_name: String,
    pub font_size: f32,
    pub line_spacing: f32,
    pub letter_spacing: f32,
    pub text_color: TextColor,
}

impl FormattingConfig {
    /// Validate every field, substituting the default for any value that
    /// cannot be used. Each substitution is logged.
    pub fn resolve(&self) -> ResolvedFormatting {
        let font_name = match self.font_name.trim() {
            "" => {
                warn!(default = DEFAULT_FONT_NAME, "empty font name, using default");
                DEFAULT_FONT_NAME.to_string()
            }
            name => name.to_string(),
        };

        let font_size = positive_or_default("font_size", self.font_size, DEFAULT_FONT_SIZE);
        let line_spacing = if self.line_spacing.is_finite() && self.line_spacing > 0.0 {
            at_least_min_spacing(self.line_spacing)
        } else {
            positive_or_default("line_spacing", self.line_spacing, DEFAULT_LINE_SPACING)
        };

        let letter_spacing = if self.letter_spacing.is_finite() {
            self.letter_spacing
        } else {
            warn!(
                value = self.letter_spacing,
                default = DEFAULT_LETTER_SPACING,
                "letter_spacing is not a number, using default"
            );
            DEFAULT_LETTER_SPACING
        };

        let text_color = TextColor::parse(&self.text_color).unwrap_or_else(|err| {
            warn!(value = %self.text_color, %err, "unusable text colour, using black");
            TextColor::default()
        });

        ResolvedFormatting {
            font_name,
            font_size,
            line_spacing,
            letter_spacing,
            text_color,
        }
    }

    /// Strict counterpart of [`FormattingConfig::resolve`]: reports the first
    /// unusable value instead of substituting a default.
    pub fn validate(&self) -> Result<ResolvedFormatting> {
        if self.font_name.trim().is_empty() {
            return Err(LegibleError::InvalidConfig("font_name is empty".into()));
        }
        for (field, value) in [
            ("font_size", self.font_size),
            ("line_spacing", self.line_spacing),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LegibleError::InvalidConfig(format!(
                    "{field} must be a positive number, got {value}"
                )));
            }
        }
        if self.line_spacing < MIN_LINE_SPACING {
            return Err(LegibleError::InvalidConfig(format!(
                "line_spacing must be at least {MIN_LINE_SPACING}, got {}",
                self.line_spacing
            )));
        }
        if !self.letter_spacing.is_finite() {
            return Err(LegibleError::InvalidConfig(format!(
                "letter_spacing must be a number, got {}",
                self.letter_spacing
            )));
        }
        TextColor::parse(&self.text_color)?;
        Ok(self.resolve())
    }
}

fn positive_or_default(field: &'static str, value: f32, default: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        warn!(field, value, default, "value must be a positive number, using default");
        default
    }
}

fn at_least_min_spacing(value: f32) -> f32 {
    if value < MIN_LINE_SPACING {
        warn!(value, minimum = MIN_LINE_SPACING, "line_spacing too small, using minimum");
        MIN_LINE_SPACING
    } else {
        value
    }
}

/// Output page geometry and extraction tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Output paper size.
    pub paper_size: PaperSize,
    /// Margin on every side, in points.
    pub margin: f32,
    /// Rounding granularity used to cluster words into lines.
    pub line_bucket_granularity: f32,
    /// Maximum horizontal gap between glyphs of the same word.
    pub x_tolerance: f32,
    /// Maximum vertical drift between glyphs of the same word.
    pub y_tolerance: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::Letter,
            margin: DEFAULT_MARGIN,
            line_bucket_granularity: DEFAULT_LINE_BUCKET_GRANULARITY,
            x_tolerance: 3.0,
            y_tolerance: 3.0,
        }
    }
}

impl LayoutConfig {
    /// Reject geometry that leaves no room for text.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.paper_size.dimensions_pt();
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(LegibleError::InvalidConfig(format!(
                "paper size {width}x{height} is not usable"
            )));
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(LegibleError::InvalidConfig(format!(
                "margin must be zero or positive, got {}",
                self.margin
            )));
        }
        if 2.0 * self.margin >= width.min(height) {
            return Err(LegibleError::InvalidConfig(format!(
                "margin {} leaves no printable area on a {width}x{height} page",
                self.margin
            )));
        }
        if !(self.line_bucket_granularity.is_finite() && self.line_bucket_granularity > 0.0) {
            return Err(LegibleError::InvalidConfig(format!(
                "line_bucket_granularity must be positive, got {}",
                self.line_bucket_granularity
            )));
        }
        if !(self.x_tolerance >= 0.0 && self.y_tolerance >= 0.0) {
            return Err(LegibleError::InvalidConfig(
                "word tolerances must be zero or positive".into(),
            ));
        }
        Ok(())
    }
}

/// Where to find custom typefaces and what to use when they are missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Directories searched for `.ttf`/`.otf` files.
    pub font_dirs: Vec<PathBuf>,
    /// Built-in font used when the requested typeface cannot be registered.
    pub fallback: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            font_dirs: vec![PathBuf::from("fonts")],
            fallback: DEFAULT_FALLBACK_FONT.into(),
        }
    }
}

/// Converter-wide settings shared by every conversion it performs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub layout: LayoutConfig,
    pub fonts: FontConfig,
}

/// Everything a settings file may carry: converter settings plus default
/// formatting for conversions started from that file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub converter: ConverterConfig,
    pub formatting: FormattingConfig,
}

impl SettingsFile {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: SettingsFile = serde_json::from_str(raw)?;
        settings.converter.layout.validate()?;
        Ok(settings)
    }
}
