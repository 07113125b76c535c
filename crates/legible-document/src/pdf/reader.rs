// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — opens the source document with `lopdf` and extracts the word
// and image geometry of each page.

use legible_core::config::LayoutConfig;
use legible_core::error::{LegibleError, Result};
use legible_core::types::WordToken;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument};

use super::content::{ContentInterpreter, ImagePlacement, PageArea};
use super::objects::{get_inherited, number, resolve};

/// How far into the input the `%PDF-` marker may appear. Some producers
/// prepend junk before the header and viewers tolerate it.
const HEADER_SEARCH_LEN: usize = 1024;

/// Geometry recovered from one source page.
#[derive(Debug, Clone)]
pub struct SourcePage<'a> {
    /// 1-indexed page number.
    pub number: u32,
    pub area: PageArea,
    /// Words in extraction order.
    pub words: Vec<WordToken>,
    pub images: Vec<ImagePlacement<'a>>,
}

/// Read-only view of a source PDF.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    ///
    /// Input that is empty or has no `%PDF-` header is
    /// [`LegibleError::UnreadableInput`]; a header followed by data `lopdf`
    /// cannot parse is [`LegibleError::PdfError`].
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(LegibleError::UnreadableInput("input is empty".into()));
        }
        if !looks_like_pdf(data) {
            return Err(LegibleError::UnreadableInput(
                "input does not start with a %PDF- header".into(),
            ));
        }

        let document = Document::load_mem(data).map_err(|err| {
            LegibleError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Page numbers in document order.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.document.get_pages().keys().copied().collect()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    // -- Extraction -----------------------------------------------------------

    /// Extract the words and image placements of page `page_number` (1-indexed).
    #[instrument(skip(self, layout))]
    pub fn extract_page(&self, page_number: u32, layout: &LayoutConfig) -> Result<SourcePage<'_>> {
        let pages = self.document.get_pages();
        let page_id: ObjectId = *pages.get(&page_number).ok_or_else(|| {
            LegibleError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        let page = self.document.get_dictionary(page_id).map_err(|err| {
            LegibleError::PdfError(format!("cannot read page {}: {}", page_number, err))
        })?;
        let area = media_box(&self.document, page);
        let resources = match get_inherited(&self.document, page, b"Resources") {
            Some(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        };

        let content = self.document.get_page_content(page_id).map_err(|err| {
            LegibleError::PdfError(format!(
                "cannot read content of page {}: {}",
                page_number, err
            ))
        })?;

        let extracted = ContentInterpreter::new(
            &self.document,
            area,
            layout.x_tolerance,
            layout.y_tolerance,
        )
        .run(&content, resources)?;

        debug!(
            page_number,
            words = extracted.words.len(),
            images = extracted.images.len(),
            width = area.width(),
            height = area.height(),
            "page geometry extracted"
        );

        Ok(SourcePage {
            number: page_number,
            area,
            words: extracted.words,
            images: extracted.images,
        })
    }
}

/// True when a `%PDF-` header appears near the start of `data`.
pub fn looks_like_pdf(data: &[u8]) -> bool {
    let head = &data[..data.len().min(HEADER_SEARCH_LEN)];
    head.windows(5).any(|window| window == b"%PDF-")
}

/// The page's MediaBox, inherited through the page tree. Pages without a
/// usable box are treated as US Letter.
fn media_box(doc: &Document, page: &Dictionary) -> PageArea {
    let values: Option<Vec<f32>> = match get_inherited(doc, page, b"MediaBox") {
        Some(Object::Array(items)) if items.len() == 4 => items
            .iter()
            .map(|item| number(resolve(doc, item)))
            .collect(),
        _ => None,
    };

    match values.as_deref() {
        Some(&[x0, y0, x1, y1]) if (x1 - x0).abs() > 0.0 && (y1 - y0).abs() > 0.0 => PageArea {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        },
        _ => PageArea::LETTER,
    }
}
