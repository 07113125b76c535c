// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line reconstruction — groups extracted words into reading-order lines.

use std::collections::BTreeMap;

use legible_core::types::WordToken;

/// A reconstructed line: words sharing the same rounded vertical position,
/// ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    /// Bucket key: `round(top / granularity)`.
    pub key: i64,
    pub words: Vec<WordToken>,
}

impl LogicalLine {
    /// The line's words joined with single spaces.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            text.push_str(&word.text);
        }
        text
    }
}

/// Bucket `tokens` by rounded top coordinate and return the lines top to bottom.
///
/// `granularity` is the rounding step: 1.0 merges words whose tops differ by
/// sub-point amounts, larger values tolerate slanted text. Within a line,
/// words are stably sorted by `x0`, so words starting at the same x keep
/// their extraction order.
pub fn reconstruct_lines(tokens: Vec<WordToken>, granularity: f32) -> Vec<LogicalLine> {
    let granularity = if granularity.is_finite() && granularity > 0.0 {
        granularity
    } else {
        1.0
    };

    let mut buckets: BTreeMap<i64, Vec<WordToken>> = BTreeMap::new();
    for token in tokens {
        let key = (token.top / granularity).round() as i64;
        buckets.entry(key).or_default().push(token);
    }

    buckets
        .into_iter()
        .map(|(key, mut words)| {
            words.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            LogicalLine { key, words }
        })
        .collect()
}
