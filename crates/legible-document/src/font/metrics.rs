// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph advance widths for the fonts Legible draws with.
//
// Widths are kept in thousandths of an em, the unit PDF font dictionaries use,
// so a string's width in points is `sum(advances) / 1000 * font_size`.

use std::sync::Arc;

use printpdf::BuiltinFont;

/// Advance widths of Helvetica (and Helvetica-Oblique) for U+0020..=U+007E,
/// from the Adobe core font metrics.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

const HELVETICA_DEFAULT_WIDTH: u16 = 556;
const COURIER_WIDTH: u16 = 600;

/// Descent below the baseline, as a fraction of the font size.
const HELVETICA_DESCENT: f32 = -0.207;
const COURIER_DESCENT: f32 = -0.157;

/// Metrics for one of the built-in (non-embedded) PDF fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinMetrics {
    Helvetica,
    Courier,
}

impl BuiltinMetrics {
    /// Metrics for a printpdf built-in font, if Legible can measure it exactly.
    pub fn for_builtin(font: &BuiltinFont) -> Option<Self> {
        match font {
            BuiltinFont::Helvetica | BuiltinFont::HelveticaOblique => Some(Self::Helvetica),
            BuiltinFont::Courier
            | BuiltinFont::CourierOblique
            | BuiltinFont::CourierBold
            | BuiltinFont::CourierBoldOblique => Some(Self::Courier),
            _ => None,
        }
    }

    /// Best available metrics for a standard-14 `/BaseFont` name in a source
    /// document. Families without a table are approximated by Helvetica.
    pub fn for_base_font(base_font: &str) -> Self {
        // Subset fonts carry a "ABCDEF+" tag before the real name.
        let name = base_font.split_once('+').map_or(base_font, |(_, rest)| rest);
        if name.starts_with("Courier") {
            Self::Courier
        } else {
            Self::Helvetica
        }
    }

    /// Advance of `ch` in thousandths of an em.
    pub fn char_width(&self, ch: char) -> u16 {
        match self {
            Self::Courier => COURIER_WIDTH,
            Self::Helvetica => {
                let code = ch as u32;
                if (0x20..=0x7E).contains(&code) {
                    HELVETICA_ASCII[(code - 0x20) as usize]
                } else if ch == '\u{A0}' {
                    HELVETICA_ASCII[0]
                } else {
                    HELVETICA_DEFAULT_WIDTH
                }
            }
        }
    }

    pub fn descent(&self) -> f32 {
        match self {
            Self::Helvetica => HELVETICA_DESCENT,
            Self::Courier => COURIER_DESCENT,
        }
    }
}

/// Number of leading code points whose advances are cached up front.
const CACHED_CODEPOINTS: u32 = 0x300;

/// Metrics read from a TrueType/OpenType font file with `ttf-parser`.
#[derive(Debug, Clone)]
pub struct TrueTypeMetrics {
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    /// Advances for U+0000..U+02FF in font units; 0 means "no glyph".
    cached: Vec<u16>,
    missing_width: u16,
    descent: f32,
}

impl TrueTypeMetrics {
    /// Parse the font and cache the advances of the Latin ranges.
    ///
    /// Returns `None` when the data is not a usable font.
    pub fn from_data(data: Arc<Vec<u8>>) -> Option<Self> {
        let face = ttf_parser::Face::parse(&data, 0).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let missing_width = face.glyph_hor_advance(ttf_parser::GlyphId(0)).unwrap_or(0);

        let cached = (0..CACHED_CODEPOINTS)
            .map(|code| {
                char::from_u32(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .unwrap_or(0)
            })
            .collect();

        let descent = face.descender() as f32 / units_per_em as f32;

        Some(Self {
            data,
            units_per_em,
            cached,
            missing_width,
            descent,
        })
    }

    /// Advance of `ch` in thousandths of an em.
    pub fn char_width(&self, ch: char) -> f32 {
        let code = ch as u32;
        let units = if code < CACHED_CODEPOINTS {
            match self.cached[code as usize] {
                0 => self.missing_width,
                advance => advance,
            }
        } else {
            ttf_parser::Face::parse(&self.data, 0)
                .ok()
                .and_then(|face| face.glyph_index(ch).and_then(|gid| face.glyph_hor_advance(gid)))
                .unwrap_or(self.missing_width)
        };
        units as f32 * 1000.0 / self.units_per_em as f32
    }

    pub fn descent(&self) -> f32 {
        self.descent
    }
}

/// Width measurement shared by the text wrapper and the renderer.
#[derive(Debug, Clone)]
pub enum FontMetrics {
    Builtin(BuiltinMetrics),
    TrueType(TrueTypeMetrics),
}

impl FontMetrics {
    /// Advance of `ch` in thousandths of an em.
    pub fn char_width(&self, ch: char) -> f32 {
        match self {
            Self::Builtin(metrics) => metrics.char_width(ch) as f32,
            Self::TrueType(metrics) => metrics.char_width(ch),
        }
    }

    /// Rendered width of `text` in points at `font_size`, including
    /// `letter_spacing` applied after every character (PDF `Tc`).
    pub fn text_width(&self, text: &str, font_size: f32, letter_spacing: f32) -> f32 {
        let (advance, count) = text
            .chars()
            .fold((0.0f32, 0usize), |(sum, n), ch| (sum + self.char_width(ch), n + 1));
        advance / 1000.0 * font_size + letter_spacing * count as f32
    }

    pub fn descent(&self) -> f32 {
        match self {
            Self::Builtin(metrics) => metrics.descent(),
            Self::TrueType(metrics) => metrics.descent(),
        }
    }
}
