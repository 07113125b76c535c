// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text colour parsing: `#`-prefixed hex values or named colours.

use serde::{Deserialize, Serialize};

use crate::error::{LegibleError, Result};
use crate::types::Rgb8;

/// A text colour, resolved once when the formatting config is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextColor {
    /// `#RRGGBB` or `#RGB`.
    Hex(Rgb8),
    /// A colour name from the named-colour table, normalised to lowercase.
    Named { name: String, rgb: Rgb8 },
}

impl TextColor {
    /// Parse a colour the way the upload form supplies it: values starting
    /// with `#` are hex, anything else is a colour name.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex)
                .map(TextColor::Hex)
                .ok_or_else(|| LegibleError::InvalidConfig(format!("invalid hex colour '{value}'")));
        }

        let name = normalize_name(value);
        lookup_named(&name)
            .map(|rgb| TextColor::Named { name, rgb })
            .ok_or_else(|| LegibleError::InvalidConfig(format!("unknown colour name '{value}'")))
    }

    pub fn rgb(&self) -> Rgb8 {
        match self {
            Self::Hex(rgb) => *rgb,
            Self::Named { rgb, .. } => *rgb,
        }
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::Named {
            name: "black".into(),
            rgb: Rgb8::BLACK,
        }
    }
}

impl std::fmt::Display for TextColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hex(rgb) => write!(f, "{rgb}"),
            Self::Named { name, .. } => f.write_str(name),
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgb8> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb8::new(r, g, b))
        }
        // #RGB shorthand: each digit is doubled.
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            Some(Rgb8::new(digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}

fn normalize_name(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Named colours (CSS/SVG names) accepted for body text.
const NAMED_COLORS: &[(&str, Rgb8)] = &[
    ("black", Rgb8::new(0x00, 0x00, 0x00)),
    ("white", Rgb8::new(0xFF, 0xFF, 0xFF)),
    ("red", Rgb8::new(0xFF, 0x00, 0x00)),
    ("green", Rgb8::new(0x00, 0x80, 0x00)),
    ("blue", Rgb8::new(0x00, 0x00, 0xFF)),
    ("navy", Rgb8::new(0x00, 0x00, 0x80)),
    ("darkblue", Rgb8::new(0x00, 0x00, 0x8B)),
    ("midnightblue", Rgb8::new(0x19, 0x19, 0x70)),
    ("royalblue", Rgb8::new(0x41, 0x69, 0xE1)),
    ("steelblue", Rgb8::new(0x46, 0x82, 0xB4)),
    ("darkgreen", Rgb8::new(0x00, 0x64, 0x00)),
    ("forestgreen", Rgb8::new(0x22, 0x8B, 0x22)),
    ("darkolivegreen", Rgb8::new(0x55, 0x6B, 0x2F)),
    ("olive", Rgb8::new(0x80, 0x80, 0x00)),
    ("lime", Rgb8::new(0x00, 0xFF, 0x00)),
    ("teal", Rgb8::new(0x00, 0x80, 0x80)),
    ("darkcyan", Rgb8::new(0x00, 0x8B, 0x8B)),
    ("cyan", Rgb8::new(0x00, 0xFF, 0xFF)),
    ("aqua", Rgb8::new(0x00, 0xFF, 0xFF)),
    ("darkred", Rgb8::new(0x8B, 0x00, 0x00)),
    ("maroon", Rgb8::new(0x80, 0x00, 0x00)),
    ("firebrick", Rgb8::new(0xB2, 0x22, 0x22)),
    ("crimson", Rgb8::new(0xDC, 0x14, 0x3C)),
    ("brown", Rgb8::new(0xA5, 0x2A, 0x2A)),
    ("sienna", Rgb8::new(0xA0, 0x52, 0x2D)),
    ("saddlebrown", Rgb8::new(0x8B, 0x45, 0x13)),
    ("orange", Rgb8::new(0xFF, 0xA5, 0x00)),
    ("darkorange", Rgb8::new(0xFF, 0x8C, 0x00)),
    ("gold", Rgb8::new(0xFF, 0xD7, 0x00)),
    ("yellow", Rgb8::new(0xFF, 0xFF, 0x00)),
    ("purple", Rgb8::new(0x80, 0x00, 0x80)),
    ("indigo", Rgb8::new(0x4B, 0x00, 0x82)),
    ("darkmagenta", Rgb8::new(0x8B, 0x00, 0x8B)),
    ("magenta", Rgb8::new(0xFF, 0x00, 0xFF)),
    ("fuchsia", Rgb8::new(0xFF, 0x00, 0xFF)),
    ("gray", Rgb8::new(0x80, 0x80, 0x80)),
    ("grey", Rgb8::new(0x80, 0x80, 0x80)),
    ("darkgray", Rgb8::new(0xA9, 0xA9, 0xA9)),
    ("darkgrey", Rgb8::new(0xA9, 0xA9, 0xA9)),
    ("dimgray", Rgb8::new(0x69, 0x69, 0x69)),
    ("dimgrey", Rgb8::new(0x69, 0x69, 0x69)),
    ("slategray", Rgb8::new(0x70, 0x80, 0x90)),
    ("slategrey", Rgb8::new(0x70, 0x80, 0x90)),
    ("darkslategray", Rgb8::new(0x2F, 0x4F, 0x4F)),
    ("darkslategrey", Rgb8::new(0x2F, 0x4F, 0x4F)),
    ("silver", Rgb8::new(0xC0, 0xC0, 0xC0)),
];

fn lookup_named(name: &str) -> Option<Rgb8> {
    NAMED_COLORS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, rgb)| *rgb)
}
