// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fonts of the source document: character-code decoding and glyph widths.
//
// Only what word extraction needs is modelled: how many bytes a code takes,
// what Unicode text it maps to, how far it advances and how far glyphs reach
// below the baseline.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use super::objects::{get, get_array, get_dict, get_name, get_number, get_stream, number, resolve, stream_data};
use crate::font::metrics::BuiltinMetrics;

/// A font dictionary of the source document, prepared for text extraction.
#[derive(Debug, Clone)]
pub struct SourceFont {
    base_font: String,
    /// Type0 fonts use two-byte codes.
    two_byte: bool,
    to_unicode: HashMap<u32, String>,
    /// Overrides from `/Differences`.
    differences: HashMap<u32, char>,
    widths: HashMap<u32, f32>,
    default_width: Option<f32>,
    builtin: BuiltinMetrics,
    descent: f32,
}

impl SourceFont {
    /// Stand-in for a font the content stream names but the resources lack.
    pub fn helvetica() -> Self {
        Self {
            base_font: "Helvetica".into(),
            two_byte: false,
            to_unicode: HashMap::new(),
            differences: HashMap::new(),
            widths: HashMap::new(),
            default_width: None,
            builtin: BuiltinMetrics::Helvetica,
            descent: BuiltinMetrics::Helvetica.descent(),
        }
    }

    /// Read a `/Font` dictionary. Missing or malformed entries degrade to
    /// defaults instead of failing.
    pub fn load(doc: &Document, dict: &Dictionary) -> Self {
        let base_font = get_name(doc, dict, b"BaseFont")
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .unwrap_or_default();
        let builtin = BuiltinMetrics::for_base_font(&base_font);
        let to_unicode = get_stream(doc, dict, b"ToUnicode")
            .map(|stream| parse_to_unicode(&stream_data(stream)))
            .unwrap_or_default();

        let mut font = Self {
            base_font,
            to_unicode,
            builtin,
            descent: builtin.descent(),
            ..Self::helvetica()
        };

        if get_name(doc, dict, b"Subtype") == Some(b"Type0".as_slice()) {
            font.two_byte = true;
            let descendant = get_array(doc, dict, b"DescendantFonts")
                .and_then(|fonts| fonts.first())
                .map(|first| resolve(doc, first));
            if let Some(Object::Dictionary(cid_font)) = descendant {
                font.load_cid_widths(doc, cid_font);
                font.load_descent(doc, cid_font);
            }
        } else {
            font.load_simple_widths(doc, dict);
            font.load_differences(doc, dict);
            font.load_descent(doc, dict);
        }

        debug!(
            base_font = %font.base_font,
            two_byte = font.two_byte,
            mapped = font.to_unicode.len(),
            widths = font.widths.len(),
            "source font loaded"
        );
        font
    }

    /// Split a shown string into character codes with their byte lengths.
    pub fn codes(&self, bytes: &[u8]) -> Vec<(u32, usize)> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => ((u32::from(*hi) << 8) | u32::from(*lo), 2),
                    [single] => (u32::from(*single), 1),
                    _ => (0, 0),
                })
                .collect()
        } else {
            bytes.iter().map(|byte| (u32::from(*byte), 1)).collect()
        }
    }

    /// Unicode text for one character code.
    pub fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.get(&code) {
            return text.clone();
        }
        if let Some(ch) = self.differences.get(&code) {
            return ch.to_string();
        }
        if self.two_byte {
            // Without a ToUnicode map a CID carries no reliable text.
            return char::from_u32(code)
                .filter(|ch| !ch.is_control())
                .map(String::from)
                .unwrap_or_default();
        }
        win_ansi_char(code as u8).to_string()
    }

    /// Advance of `code` in thousandths of an em.
    pub fn width(&self, code: u32) -> f32 {
        if let Some(width) = self.widths.get(&code) {
            return *width;
        }
        if let Some(width) = self.default_width {
            return width;
        }
        let ch = self.decode(code).chars().next().unwrap_or(' ');
        f32::from(self.builtin.char_width(ch))
    }

    /// Descent below the baseline as a (negative) fraction of the font size.
    pub fn descent(&self) -> f32 {
        self.descent
    }

    fn load_simple_widths(&mut self, doc: &Document, dict: &Dictionary) {
        let first_char = get_number(doc, dict, b"FirstChar").unwrap_or(0.0) as u32;
        if let Some(widths) = get_array(doc, dict, b"Widths") {
            for (offset, width) in widths.iter().enumerate() {
                let Some(code) = u32::try_from(offset).ok().and_then(|o| first_char.checked_add(o)) else {
                    break;
                };
                if let Some(width) = number(resolve(doc, width)) {
                    self.widths.insert(code, width);
                }
            }
        }
        if let Some(descriptor) = get_dict(doc, dict, b"FontDescriptor") {
            if let Some(missing) = get_number(doc, descriptor, b"MissingWidth") {
                if !self.widths.is_empty() {
                    self.default_width = Some(missing);
                }
            }
        }
    }

    /// `/W` holds runs of either `c [w1 w2 ...]` or `c_first c_last w`.
    fn load_cid_widths(&mut self, doc: &Document, cid_font: &Dictionary) {
        self.default_width = Some(get_number(doc, cid_font, b"DW").unwrap_or(1000.0));
        let Some(runs) = get_array(doc, cid_font, b"W") else {
            return;
        };

        let mut items = runs.iter().map(|item| resolve(doc, item));
        while let Some(first) = items.next() {
            let Some(start) = number(first) else { break };
            let start = start as u32;
            match items.next() {
                Some(Object::Array(widths)) => {
                    for (offset, width) in widths.iter().enumerate() {
                        let Some(cid) = u32::try_from(offset).ok().and_then(|o| start.checked_add(o)) else {
                            break;
                        };
                        if let Some(width) = number(resolve(doc, width)) {
                            self.widths.insert(cid, width);
                        }
                    }
                }
                Some(last) => {
                    let (Some(last), Some(width)) = (number(last), items.next().and_then(number))
                    else {
                        break;
                    };
                    // Guard against absurd ranges in damaged files.
                    for cid in start..=(last as u32).min(start.saturating_add(0xFFFF)) {
                        self.widths.insert(cid, width);
                    }
                }
                None => break,
            }
        }
    }

    fn load_differences(&mut self, doc: &Document, dict: &Dictionary) {
        let Some(encoding) = get_dict(doc, dict, b"Encoding") else {
            return;
        };
        let Some(differences) = get_array(doc, encoding, b"Differences") else {
            return;
        };

        let mut code = 0u32;
        for item in differences {
            match resolve(doc, item) {
                Object::Integer(start) => code = (*start).max(0) as u32,
                Object::Name(name) => {
                    if let Some(ch) = glyph_name_to_char(&String::from_utf8_lossy(name)) {
                        self.differences.insert(code, ch);
                    }
                    code = code.saturating_add(1);
                }
                _ => {}
            }
        }
    }

    fn load_descent(&mut self, doc: &Document, dict: &Dictionary) {
        let descent = get_dict(doc, dict, b"FontDescriptor")
            .and_then(|descriptor| get_number(doc, descriptor, b"Descent"));
        if let Some(descent) = descent {
            if descent < 0.0 && descent > -1000.0 {
                self.descent = descent / 1000.0;
            }
        }
    }
}

/// Resolve the font resource `name` in `resources`.
pub fn font_resource<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    name: &[u8],
) -> Option<(&'a Dictionary, Option<lopdf::ObjectId>)> {
    let fonts = get_dict(doc, resources, b"Font")?;
    let entry = fonts.get(name).ok()?;
    let id = match entry {
        Object::Reference(id) => Some(*id),
        _ => None,
    };
    match get(doc, fonts, name)? {
        Object::Dictionary(dict) => Some((dict, id)),
        _ => None,
    }
}

// -- ToUnicode ----------------------------------------------------------------

/// Parse the `bfchar`/`bfrange` sections of a ToUnicode CMap.
///
/// CMaps share the content-stream token syntax, so `lopdf`'s content parser
/// splits them into operations; every hex string between `beginbfchar` and
/// `endbfchar` ends up as an operand of `endbfchar`.
pub fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    let Ok(content) = Content::decode(data) else {
        debug!("ToUnicode CMap could not be tokenised");
        return map;
    };

    for operation in &content.operations {
        match operation.operator.as_str() {
            "endbfchar" => {
                for pair in operation.operands.chunks(2) {
                    if let [Object::String(src, _), Object::String(dst, _)] = pair {
                        map.insert(code_of(src), utf16be(dst));
                    }
                }
            }
            "endbfrange" => {
                let mut operands = operation.operands.iter();
                while let (Some(Object::String(lo, _)), Some(Object::String(hi, _)), Some(dst)) =
                    (operands.next(), operands.next(), operands.next())
                {
                    let (lo, hi) = (code_of(lo), code_of(hi));
                    if hi < lo || hi - lo > 0xFFFF {
                        continue;
                    }
                    match dst {
                        Object::String(start, _) => {
                            let base = utf16be(start);
                            for (offset, code) in (lo..=hi).enumerate() {
                                map.insert(code, offset_last_char(&base, offset as u32));
                            }
                        }
                        Object::Array(targets) => {
                            for (code, target) in (lo..=hi).zip(targets) {
                                if let Object::String(text, _) = target {
                                    map.insert(code, utf16be(text));
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    map
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte))
}

fn utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// `base` with its last character advanced by `offset` code points.
fn offset_last_char(base: &str, offset: u32) -> String {
    let mut chars: Vec<char> = base.chars().collect();
    if let Some(last) = chars.last_mut() {
        if let Some(shifted) = char::from_u32(*last as u32 + offset) {
            *last = shifted;
        }
    }
    chars.into_iter().collect()
}

// -- Base encodings -------------------------------------------------------------

/// WinAnsiEncoding: Latin-1 except for the 0x80..=0x9F block.
const WIN_ANSI_HIGH: [char; 32] = [
    '€', '\u{FFFD}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{FFFD}', 'Ž', '\u{FFFD}',
    '\u{FFFD}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '•', '–', '—', '˜', '™', 'š', '›', 'œ',
    '\u{FFFD}', 'ž', 'Ÿ',
];

/// Decode a byte with WinAnsiEncoding. The standard and MacRoman encodings
/// agree with it on printable ASCII, which covers most body text.
pub fn win_ansi_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => WIN_ANSI_HIGH[(byte - 0x80) as usize],
        _ => char::from(byte),
    }
}

/// Unicode character for an Adobe glyph name.
fn glyph_name_to_char(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("uni").or_else(|| name.strip_prefix('u')) {
        if (4..=6).contains(&hex.len()) {
            if let Ok(code) = u32::from_str_radix(hex, 16) {
                return char::from_u32(code);
            }
        }
    }
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_alphabetic() {
            return Some(ch);
        }
    }
    let ch = match name {
        "space" | "nbspace" => ' ',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "period" => '.',
        "comma" => ',',
        "colon" => ':',
        "semicolon" => ';',
        "hyphen" | "minus" => '-',
        "endash" => '–',
        "emdash" => '—',
        "exclam" => '!',
        "question" => '?',
        "quotesingle" => '\'',
        "quotedbl" => '"',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "parenleft" => '(',
        "parenright" => ')',
        "bracketleft" => '[',
        "bracketright" => ']',
        "slash" => '/',
        "ampersand" => '&',
        "percent" => '%',
        "dollar" => '$',
        "at" => '@',
        "asterisk" => '*',
        "plus" => '+',
        "equal" => '=',
        "underscore" => '_',
        "bullet" => '•',
        "ellipsis" => '…',
        "fi" => 'ﬁ',
        "fl" => 'ﬂ',
        "eacute" => 'é',
        "egrave" => 'è',
        "agrave" => 'à',
        "ccedilla" => 'ç',
        "udieresis" => 'ü',
        "odieresis" => 'ö',
        "adieresis" => 'ä',
        "germandbls" => 'ß',
        _ => return None,
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    const CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <00660069>
endbfchar
1 beginbfrange
<0024> <0026> <0041>
endbfrange
1 beginbfrange
<0030> <0031> [<0078> <0079>]
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    #[test]
    fn to_unicode_reads_chars_and_ranges() {
        let map = parse_to_unicode(CMAP);
        assert_eq!(map.get(&0x03).map(String::as_str), Some(" "));
        assert_eq!(map.get(&0x11).map(String::as_str), Some("fi"));
        assert_eq!(map.get(&0x24).map(String::as_str), Some("A"));
        assert_eq!(map.get(&0x26).map(String::as_str), Some("C"));
        assert_eq!(map.get(&0x31).map(String::as_str), Some("y"));
    }

    #[test]
    fn simple_font_uses_widths_array() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "ABCDEF+Arial",
            "FirstChar" => 65,
            "Widths" => vec![700.into(), 650.into()],
        };
        let font = SourceFont::load(&doc, &dict);
        assert_eq!(font.width(65), 700.0);
        assert_eq!(font.width(66), 650.0);
        // Outside the array: Helvetica metrics for the decoded character.
        assert_eq!(font.width(u32::from(b'i')), 222.0);
        assert_eq!(font.decode(65), "A");
    }

    #[test]
    fn standard_font_falls_back_to_builtin_metrics() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! { "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Courier" };
        let font = SourceFont::load(&doc, &dict);
        assert_eq!(font.width(u32::from(b'W')), 600.0);
        assert!((font.descent() - (-0.157)).abs() < 1e-6);
    }

    #[test]
    fn differences_override_the_base_encoding() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => dictionary! {
                "Differences" => vec![1.into(), Object::Name(b"eacute".to_vec()), Object::Name(b"uni263A".to_vec())],
            },
        };
        let font = SourceFont::load(&doc, &dict);
        assert_eq!(font.decode(1), "é");
        assert_eq!(font.decode(2), "☺");
        assert_eq!(font.decode(0x93), "\u{201C}");
    }

    #[test]
    fn type0_fonts_take_two_bytes_per_code() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Foo",
            "DescendantFonts" => vec![Object::Dictionary(dictionary! {
                "Subtype" => "CIDFontType2",
                "DW" => 500,
                "W" => vec![
                    10.into(),
                    Object::Array(vec![300.into(), 400.into()]),
                    20.into(),
                    25.into(),
                    800.into(),
                ],
            })],
        };
        let font = SourceFont::load(&doc, &dict);
        assert_eq!(font.codes(&[0x00, 0x0A, 0x00, 0x0B]), vec![(10, 2), (11, 2)]);
        assert_eq!(font.width(11), 400.0);
        assert_eq!(font.width(22), 800.0);
        assert_eq!(font.width(99), 500.0);
    }

    #[test]
    fn width_runs_at_the_top_of_the_code_space_do_not_overflow() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Damaged",
            "DescendantFonts" => vec![Object::Dictionary(dictionary! {
                "Subtype" => "CIDFontType2",
                "W" => vec![
                    4_294_967_295i64.into(),
                    4_294_967_295i64.into(),
                    500.into(),
                    4_294_967_040i64.into(),
                    Object::Array(vec![Object::Integer(600); 300]),
                ],
            })],
        };
        let font = SourceFont::load(&doc, &dict);
        assert_eq!(font.width(4_294_967_040), 600.0);
        assert_eq!(font.width(u32::MAX), 600.0);
    }

    #[test]
    fn simple_widths_and_differences_stop_at_the_top_of_the_code_space() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "FirstChar" => 4_294_967_295i64,
            "Widths" => vec![300.into(), 400.into()],
            "Encoding" => dictionary! {
                "Differences" => vec![
                    4_294_967_295i64.into(),
                    Object::Name(b"A".to_vec()),
                    Object::Name(b"B".to_vec()),
                ],
            },
        };
        let font = SourceFont::load(&doc, &dict);
        assert_eq!(font.width(u32::MAX), 300.0);
    }
}
