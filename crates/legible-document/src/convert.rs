// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document conversion: source PDF in, re-laid-out PDF out.
//
// Pipeline per source page: extract geometry → rebuild lines → wrap to the
// output width → place around images → render. A document that cannot be
// processed still produces output: a one-page diagnostic PDF explaining what
// went wrong. Only input that is not a PDF at all is returned as an error.

use legible_core::config::{ConverterConfig, FormattingConfig, ResolvedFormatting};
use legible_core::error::{LegibleError, Result};
use legible_core::human_errors::humanize_error;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, instrument, warn};

use crate::font::registry::{ActiveFont, FontRegistry};
use crate::image::extract_region;
use crate::layout::lines::reconstruct_lines;
use crate::layout::paginate::{PageFrame, Paginator, PlannedPage};
use crate::layout::wrap::{TextMeasure, wrap_text};
use crate::pdf::reader::PdfReader;
use crate::pdf::writer::{PdfWriter, TextStyle};

const OUTPUT_TITLE: &str = "Legible document";

/// What a conversion drew and what it had to leave out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionReport {
    /// Lowercase hex SHA-256 of the input bytes.
    pub input_sha256: String,
    /// Font the body text was drawn in.
    pub font: String,
    /// True when the requested font could not be registered.
    pub font_fallback: bool,
    /// Output pages in order.
    pub pages: Vec<PlannedPage>,
    /// Source pages whose geometry could not be extracted.
    pub skipped_pages: usize,
    /// Source images that could not be decoded.
    pub skipped_images: usize,
    /// Set when the output is a diagnostic document instead of a conversion.
    pub diagnostic: Option<String>,
}

/// Output bytes plus the report describing them.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub bytes: Vec<u8>,
    pub report: ConversionReport,
}

/// Converts documents with one set of converter-wide settings.
///
/// Holds no mutable state; a single converter can serve conversions on
/// several threads at once.
#[derive(Debug, Clone)]
pub struct DocumentConverter {
    config: ConverterConfig,
    fonts: FontRegistry,
}

impl Default for DocumentConverter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

impl DocumentConverter {
    pub fn new(config: ConverterConfig) -> Self {
        let fonts = FontRegistry::new(&config.fonts);
        Self { config, fonts }
    }

    /// Convert `input` with the caller's `formatting`.
    ///
    /// Returns [`LegibleError::UnreadableInput`] when `input` is empty or has
    /// no `%PDF-` header. Every other failure yields a diagnostic document.
    #[instrument(skip_all, fields(bytes_len = input.len()))]
    pub fn convert(&self, input: &[u8], formatting: &FormattingConfig) -> Result<Conversion> {
        let fingerprint = fingerprint(input);
        info!(sha256 = %fingerprint, "conversion started");

        let reader = match PdfReader::from_bytes(input) {
            Ok(reader) => reader,
            Err(err @ LegibleError::UnreadableInput(_)) => {
                warn!(sha256 = %fingerprint, %err, "input rejected");
                return Err(err);
            }
            Err(err) => return Ok(self.diagnostic(err, fingerprint)),
        };

        let formatting = formatting.resolve();
        let mut report = ConversionReport {
            input_sha256: fingerprint,
            ..ConversionReport::default()
        };

        match self.render(&reader, &formatting, &mut report) {
            Ok(bytes) => {
                info!(
                    sha256 = %report.input_sha256,
                    source_pages = reader.page_count(),
                    output_pages = report.pages.len(),
                    skipped_pages = report.skipped_pages,
                    skipped_images = report.skipped_images,
                    font = %report.font,
                    "conversion finished"
                );
                Ok(Conversion { bytes, report })
            }
            Err(err) => Ok(self.diagnostic(err, report.input_sha256)),
        }
    }

    fn render(
        &self,
        reader: &PdfReader,
        formatting: &ResolvedFormatting,
        report: &mut ConversionReport,
    ) -> Result<Vec<u8>> {
        let layout = &self.config.layout;
        layout.validate()?;
        if reader.page_count() == 0 {
            return Err(LegibleError::EmptyDocument);
        }

        let font: ActiveFont = self.fonts.resolve_or_fallback(&formatting.font_name);
        report.font = font.name.clone();
        report.font_fallback = font.is_fallback;

        let (width, height) = layout.paper_size.dimensions_pt();
        let frame = PageFrame {
            width,
            height,
            margin: layout.margin,
            line_spacing: formatting.line_spacing,
        };
        let measure = TextMeasure::new(&font.metrics, formatting.font_size, formatting.letter_spacing);
        let max_width = frame.max_line_width();

        let mut writer = PdfWriter::new(layout.paper_size, OUTPUT_TITLE);
        let mut paginator = Paginator::new(frame);

        for number in reader.page_numbers() {
            let page = match reader.extract_page(number, layout) {
                Ok(page) => page,
                Err(err) => {
                    warn!(page = number, %err, "skipping page that could not be read");
                    report.skipped_pages += 1;
                    continue;
                }
            };

            let page_box = page.area.bbox();
            let mut images = Vec::with_capacity(page.images.len());
            for placement in &page.images {
                match extract_region(reader.document(), placement.stream, &placement.bounds, &page_box) {
                    Ok(Some(region)) => {
                        let handle = writer.add_image(&region.bitmap);
                        images.push((handle, region.bounds));
                    }
                    Ok(None) => debug!(page = number, "image lies outside the page"),
                    Err(err) => {
                        warn!(page = number, %err, "skipping image that could not be decoded");
                        report.skipped_images += 1;
                    }
                }
            }
            paginator.begin_source_page(images);

            let lines = reconstruct_lines(page.words, layout.line_bucket_granularity);
            debug!(page = number, lines = lines.len(), "lines reconstructed");
            for line in &lines {
                for wrapped in wrap_text(&line.text(), &measure, max_width) {
                    let line_width = measure.width(&wrapped);
                    paginator.place_line(wrapped, line_width);
                }
            }
        }

        let pages = paginator.finish();
        let style = TextStyle {
            font_size: formatting.font_size,
            letter_spacing: formatting.letter_spacing,
            color: formatting.text_color.rgb(),
        };
        let bytes = writer.finish(&pages, &font, &style);
        report.pages = pages;
        Ok(bytes)
    }

    /// One-page document explaining `err`, in place of the conversion.
    fn diagnostic(&self, err: LegibleError, fingerprint: String) -> Conversion {
        error!(sha256 = %fingerprint, %err, "conversion failed, writing diagnostic document");

        let headline = format!("Error converting PDF: {err}");
        let human = humanize_error(&err);
        let paragraphs = vec![headline.clone(), format!("{} {}", human.message, human.suggestion)];
        let layout = &self.config.layout;
        let bytes = PdfWriter::diagnostic_document(layout.paper_size, layout.margin, &paragraphs);

        Conversion {
            bytes,
            report: ConversionReport {
                input_sha256: fingerprint,
                font: "Helvetica".into(),
                diagnostic: Some(headline),
                ..ConversionReport::default()
            },
        }
    }
}

/// Convert `input` with default converter settings.
pub fn convert(input: &[u8], config: &FormattingConfig) -> Result<Vec<u8>> {
    DocumentConverter::default()
        .convert(input, config)
        .map(|conversion| conversion.bytes)
}

fn fingerprint(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}
