// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// legible-document — PDF re-layout for the Legible converter.
//
// Extracts word and image geometry from a source PDF (`pdf`, `image`), rebuilds
// and re-wraps its lines in a dyslexia-friendly typeface (`font`, `layout`),
// and renders the result into a new PDF (`convert`).

pub mod convert;
pub mod font;
pub mod image;
pub mod layout;
pub mod pdf;

#[cfg(test)]
mod test_support;

// Re-export the primary entry points so callers can use `legible_document::convert` etc.
pub use convert::{Conversion, ConversionReport, DocumentConverter, convert};
pub use font::FontRegistry;
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
