// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Greedy word wrapping against measured font widths.

use crate::font::metrics::FontMetrics;

/// Measures rendered string widths for one font, size and letter spacing.
#[derive(Debug, Clone, Copy)]
pub struct TextMeasure<'a> {
    pub metrics: &'a FontMetrics,
    pub font_size: f32,
    pub letter_spacing: f32,
}

impl<'a> TextMeasure<'a> {
    pub fn new(metrics: &'a FontMetrics, font_size: f32, letter_spacing: f32) -> Self {
        Self {
            metrics,
            font_size,
            letter_spacing,
        }
    }

    pub fn width(&self, text: &str) -> f32 {
        self.metrics
            .text_width(text, self.font_size, self.letter_spacing)
    }
}

/// Split `text` on whitespace and pack the words greedily into lines no
/// wider than `max_width`.
///
/// A word wider than `max_width` on its own is placed alone on a line and
/// allowed to overflow; words are never broken. Word order is preserved and
/// whitespace-only input produces no lines.
pub fn wrap_text(text: &str, measure: &TextMeasure<'_>, max_width: f32) -> Vec<String> {
    let space = measure.width(" ");
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0f32;

    for word in text.split_whitespace() {
        let word_width = measure.width(word);
        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        let candidate = current_width + space + word_width;
        if candidate <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
