// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory source PDFs for tests, built with `lopdf`.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Montserrat Regular (SIL Open Font License), a real TrueType file for the
/// font-file paths.
pub const MONTSERRAT: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/Montserrat-Regular.ttf"));

/// A string shown with Helvetica at a baseline position.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl TextRun {
    pub fn new(text: &str, x: f32, y: f32, size: f32) -> Self {
        Self {
            text: text.to_string(),
            x,
            y,
            size,
        }
    }
}

/// An uncompressed DeviceRGB image drawn over `(x, y)..(x + width, y + height)`
/// in bottom-left page space.
#[derive(Debug, Clone)]
pub struct ImageRun {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub pixels_wide: u32,
    pub pixels_high: u32,
    pub rgb: Vec<u8>,
}

impl ImageRun {
    /// A 4×4 solid red image.
    pub fn solid(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            pixels_wide: 4,
            pixels_high: 4,
            rgb: [255u8, 0, 0].repeat(16),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PageSpec {
    texts: Vec<TextRun>,
    images: Vec<ImageRun>,
}

/// Builds a source PDF page by page.
#[derive(Debug, Clone)]
pub struct PdfBuilder {
    width: f32,
    height: f32,
    pages: Vec<PageSpec>,
}

impl PdfBuilder {
    pub fn letter() -> Self {
        Self::with_media_box(612.0, 792.0)
    }

    pub fn with_media_box(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pages: Vec::new(),
        }
    }

    pub fn page(mut self, texts: Vec<TextRun>, images: Vec<ImageRun>) -> Self {
        self.pages.push(PageSpec { texts, images });
        self
    }

    /// Serialise the document.
    pub fn build(&self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids: Vec<Object> = Vec::new();
        for spec in &self.pages {
            let mut xobjects = lopdf::Dictionary::new();
            let mut operations: Vec<Operation> = Vec::new();

            for (index, image) in spec.images.iter().enumerate() {
                let name = format!("Im{index}");
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => i64::from(image.pixels_wide),
                        "Height" => i64::from(image.pixels_high),
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                    },
                    image.rgb.clone(),
                ));
                xobjects.set(name.as_bytes().to_vec(), image_id);

                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![
                        image.width.into(),
                        0.into(),
                        0.into(),
                        image.height.into(),
                        image.x.into(),
                        image.y.into(),
                    ],
                ));
                operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
                operations.push(Operation::new("Q", vec![]));
            }

            for run in &spec.texts {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), run.size.into()]));
                operations.push(Operation::new("Td", vec![run.x.into(), run.y.into()]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(run.text.as_str())]));
                operations.push(Operation::new("ET", vec![]));
            }

            let content = Content { operations };
            let content_bytes = content.encode().unwrap_or_default();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                    "XObject" => xobjects,
                },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), self.width.into(), self.height.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("in-memory save cannot fail");
        bytes
    }

    /// The serialised document loaded back, as the converter would see it.
    pub fn build_document(&self) -> Document {
        Document::load_mem(&self.build()).expect("builder output must parse")
    }
}
