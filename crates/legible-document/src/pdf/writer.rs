// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — renders laid-out pages into a new document using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use image::DynamicImage;
use legible_core::PaperSize;
use legible_core::types::Rgb8;
use printpdf::{
    BuiltinFont, Color, FontId, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point,
    Pt, RawImage, RawImageData, RawImageFormat, Rgb, TextItem, XObjectId, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::font::metrics::{BuiltinMetrics, FontMetrics};
use crate::font::registry::{ActiveFont, FontSource};
use crate::layout::paginate::{PlacedImage, PlacedLine, PlannedPage};
use crate::layout::wrap::{TextMeasure, wrap_text};

/// Images are registered at 72 dpi so one pixel spans one point before scaling.
const IMAGE_DPI: f32 = 72.0;

/// Typography applied to every body-text line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub letter_spacing: f32,
    pub color: Rgb8,
}

/// How text operators reference the active font.
enum FontHandle {
    Builtin(BuiltinFont),
    Embedded(FontId),
}

struct RegisteredImage {
    id: XObjectId,
    width_px: u32,
    height_px: u32,
}

/// Builds the output document: images are registered as soon as they are
/// decoded, pages are rendered once layout is complete.
pub struct PdfWriter {
    paper_size: PaperSize,
    doc: PdfDocument,
    images: Vec<RegisteredImage>,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize, title: &str) -> Self {
        Self {
            paper_size,
            doc: PdfDocument::new(title),
            images: Vec::new(),
        }
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm), Mm(h_mm))
    }

    // -- Images ---------------------------------------------------------------

    /// Embed `bitmap` and return the handle layout uses to place it.
    pub fn add_image(&mut self, bitmap: &DynamicImage) -> usize {
        let rgb = bitmap.to_rgb8();
        let (width_px, height_px) = rgb.dimensions();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: width_px as usize,
            height: height_px as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let id = self.doc.add_image(&raw);
        self.images.push(RegisteredImage {
            id,
            width_px,
            height_px,
        });
        self.images.len() - 1
    }

    // -- Rendering ------------------------------------------------------------

    /// Render `pages` and serialise the document.
    ///
    /// Font, fill colour and letter spacing are set at the start of every
    /// text section, so each page carries its own text state.
    #[instrument(skip_all, fields(pages = pages.len(), font = %font.name))]
    pub fn finish(mut self, pages: &[PlannedPage], font: &ActiveFont, style: &TextStyle) -> Vec<u8> {
        let (page_w, page_h) = self.page_dimensions();
        let handle = match &font.source {
            FontSource::Builtin(builtin) => FontHandle::Builtin(builtin.clone()),
            FontSource::Embedded(parsed) => FontHandle::Embedded(self.doc.add_font(parsed.as_ref())),
        };

        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len().max(1));
        for page in pages {
            let mut ops: Vec<Op> = Vec::new();
            for image in &page.images {
                self.push_image_ops(&mut ops, image);
            }
            for line in &page.lines {
                push_line_ops(&mut ops, line, &handle, style);
            }
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }
        if pdf_pages.is_empty() {
            pdf_pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        let page_count = pdf_pages.len();
        self.doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings while saving");
        }

        info!(pages = page_count, bytes = output.len(), "output document written");
        output
    }

    fn push_image_ops(&self, ops: &mut Vec<Op>, image: &PlacedImage) {
        let Some(registered) = self.images.get(image.handle) else {
            warn!(handle = image.handle, "placed image was never registered");
            return;
        };
        ops.push(Op::UseXobject {
            id: registered.id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(image.x)),
                translate_y: Some(Pt(image.y)),
                scale_x: Some(image.width / registered.width_px.max(1) as f32),
                scale_y: Some(image.height / registered.height_px.max(1) as f32),
                dpi: Some(IMAGE_DPI),
                rotate: None,
            },
        });
    }

    // -- Diagnostic document --------------------------------------------------

    /// A one-page document stating why a conversion failed.
    ///
    /// The headline is drawn in Helvetica 12 pt at (100, 500); each further
    /// paragraph follows on the lines below, wrapped to the page and cut off
    /// at the bottom margin.
    #[instrument(skip(paragraphs), fields(paragraphs = paragraphs.len()))]
    pub fn diagnostic_document(paper_size: PaperSize, margin: f32, paragraphs: &[String]) -> Vec<u8> {
        const X: f32 = 100.0;
        const Y: f32 = 500.0;
        const FONT_SIZE: f32 = 12.0;
        const LINE_HEIGHT: f32 = 14.0;

        let writer = Self::new(paper_size, "Legible conversion error");
        let (page_w, page_h) = writer.page_dimensions();
        let (width_pt, _) = paper_size.dimensions_pt();

        let metrics = FontMetrics::Builtin(BuiltinMetrics::Helvetica);
        let measure = TextMeasure::new(&metrics, FONT_SIZE, 0.0);
        let max_width = (width_pt - X - margin).max(FONT_SIZE);

        let style = TextStyle {
            font_size: FONT_SIZE,
            letter_spacing: 0.0,
            color: Rgb8::BLACK,
        };
        let handle = FontHandle::Builtin(BuiltinFont::Helvetica);

        let mut ops: Vec<Op> = Vec::new();
        let mut y = Y;
        'paragraphs: for paragraph in paragraphs {
            for text in wrap_text(paragraph, &measure, max_width) {
                if y < margin {
                    break 'paragraphs;
                }
                let line = PlacedLine {
                    width: measure.width(&text),
                    text,
                    x: X,
                    y,
                };
                push_line_ops(&mut ops, &line, &handle, &style);
                y -= LINE_HEIGHT;
            }
        }

        let mut doc = writer.doc;
        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        doc.save(&PdfSaveOptions::default(), &mut warnings)
    }
}

/// One self-contained text section per line: the cursor is absolute and the
/// text state is complete.
fn push_line_ops(ops: &mut Vec<Op>, line: &PlacedLine, font: &FontHandle, style: &TextStyle) {
    let (r, g, b) = style.color.to_unit();

    ops.push(Op::StartTextSection);
    ops.push(Op::SetFillColor {
        col: Color::Rgb(Rgb {
            r,
            g,
            b,
            icc_profile: None,
        }),
    });
    ops.push(Op::SetCharacterSpacing {
        multiplier: style.letter_spacing,
    });
    match font {
        FontHandle::Builtin(builtin) => ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(style.font_size),
            font: builtin.clone(),
        }),
        FontHandle::Embedded(id) => ops.push(Op::SetFontSize {
            size: Pt(style.font_size),
            font: id.clone(),
        }),
    }
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(line.x),
            y: Pt(line.y),
        },
    });
    match font {
        FontHandle::Builtin(builtin) => ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(line.text.clone())],
            font: builtin.clone(),
        }),
        FontHandle::Embedded(id) => ops.push(Op::WriteText {
            items: vec![TextItem::Text(line.text.clone())],
            font: id.clone(),
        }),
    }
    ops.push(Op::EndTextSection);
}
