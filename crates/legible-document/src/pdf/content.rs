// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream interpreter — recovers word boxes and image placements from
// a page's drawing operators.
//
// Coordinates follow the PDF imaging model (text rendering matrix
// Trm = Tsm × Tm × CTM, row-vector convention) and are converted to top-left
// page space on output.

use std::collections::HashMap;
use std::rc::Rc;

use legible_core::error::{LegibleError, Result};
use legible_core::types::{BoundingBox, WordToken};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

use super::fonts::{SourceFont, font_resource};
use super::objects::{get_dict, get_name, get_stream, number, stream_data};

/// Form XObjects nested deeper than this are not interpreted.
const MAX_FORM_DEPTH: usize = 8;

// -- Geometry -----------------------------------------------------------------

/// A PDF transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Bounding box of the axis-aligned rectangle `(x0, y0)..(x1, y1)`
    /// after transformation, as `(min_x, min_y, max_x, max_y)`.
    fn transform_rect(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> (f32, f32, f32, f32) {
        let corners = [
            self.apply(x0, y0),
            self.apply(x1, y0),
            self.apply(x0, y1),
            self.apply(x1, y1),
        ];
        corners.iter().fold(
            (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }
}

/// The page's visible area in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageArea {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageArea {
    pub const LETTER: PageArea = PageArea {
        llx: 0.0,
        lly: 0.0,
        urx: 612.0,
        ury: 792.0,
    };

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// The page's own bounding box in top-left page space.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width(), self.height())
    }

    /// Convert a user-space rectangle to top-left page space.
    fn to_top_left(&self, (min_x, min_y, max_x, max_y): (f32, f32, f32, f32)) -> BoundingBox {
        BoundingBox::new(
            min_x - self.llx,
            self.ury - max_y,
            max_x - self.llx,
            self.ury - min_y,
        )
    }
}

// -- Output -----------------------------------------------------------------------

/// An image XObject drawn on the page.
#[derive(Debug, Clone)]
pub struct ImagePlacement<'a> {
    /// Where the image lands, in top-left page space, before clamping.
    pub bounds: BoundingBox,
    pub stream: &'a Stream,
}

/// Everything the interpreter recovered from one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent<'a> {
    /// Words in the order their glyphs were painted.
    pub words: Vec<WordToken>,
    pub images: Vec<ImagePlacement<'a>>,
}

/// Groups painted glyphs into words.
#[derive(Debug)]
struct WordBuilder {
    x_tolerance: f32,
    y_tolerance: f32,
    current: Option<WordToken>,
    last_glyph: Option<BoundingBox>,
    words: Vec<WordToken>,
}

impl WordBuilder {
    fn new(x_tolerance: f32, y_tolerance: f32) -> Self {
        Self {
            x_tolerance,
            y_tolerance,
            current: None,
            last_glyph: None,
            words: Vec::new(),
        }
    }

    fn push_glyph(&mut self, text: &str, bbox: BoundingBox) {
        if text.chars().all(char::is_whitespace) {
            self.flush();
            return;
        }

        if let Some(last) = self.last_glyph {
            let detached = bbox.x0 > last.x1 + self.x_tolerance
                || bbox.x1 < last.x0 - self.x_tolerance
                || (bbox.top - last.top).abs() > self.y_tolerance;
            if detached {
                self.flush();
            }
        }

        match &mut self.current {
            Some(word) => {
                word.text.push_str(text);
                word.x0 = word.x0.min(bbox.x0);
                word.x1 = word.x1.max(bbox.x1);
                word.top = word.top.min(bbox.top);
                word.bottom = word.bottom.max(bbox.bottom);
            }
            None => {
                self.current = Some(WordToken::new(text, bbox.x0, bbox.x1, bbox.top, bbox.bottom));
            }
        }
        self.last_glyph = Some(bbox);
    }

    fn flush(&mut self) {
        if let Some(word) = self.current.take() {
            self.words.push(word);
        }
        self.last_glyph = None;
    }

    fn finish(mut self) -> Vec<WordToken> {
        self.flush();
        self.words
    }
}

// -- Interpreter state ------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    font: Rc<SourceFont>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    /// `Tz / 100`.
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

impl GraphicsState {
    fn initial(font: Rc<SourceFont>) -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            text: TextState {
                font,
                size: 0.0,
                char_spacing: 0.0,
                word_spacing: 0.0,
                horizontal_scale: 1.0,
                leading: 0.0,
                rise: 0.0,
            },
        }
    }
}

/// Text object matrices; reset by `BT`, not saved by `q`.
#[derive(Debug, Clone, Copy)]
struct TextMatrices {
    tm: Matrix,
    tlm: Matrix,
}

impl TextMatrices {
    fn reset(&mut self) {
        self.tm = Matrix::IDENTITY;
        self.tlm = Matrix::IDENTITY;
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }
}

/// Runs the content streams of one page.
pub struct ContentInterpreter<'a> {
    doc: &'a Document,
    area: PageArea,
    fonts: HashMap<ObjectId, Rc<SourceFont>>,
    fallback_font: Rc<SourceFont>,
    words: WordBuilder,
    images: Vec<ImagePlacement<'a>>,
}

impl<'a> ContentInterpreter<'a> {
    pub fn new(doc: &'a Document, area: PageArea, x_tolerance: f32, y_tolerance: f32) -> Self {
        Self {
            doc,
            area,
            fonts: HashMap::new(),
            fallback_font: Rc::new(SourceFont::helvetica()),
            words: WordBuilder::new(x_tolerance, y_tolerance),
            images: Vec::new(),
        }
    }

    /// Interpret a page's (already concatenated and decoded) content.
    pub fn run(mut self, content: &[u8], resources: Option<&'a Dictionary>) -> Result<PageContent<'a>> {
        let content = Content::decode(content)
            .map_err(|err| LegibleError::PdfError(format!("malformed content stream: {err}")))?;
        let state = GraphicsState::initial(Rc::clone(&self.fallback_font));
        self.execute(&content.operations, resources, state, 0);

        Ok(PageContent {
            words: self.words.finish(),
            images: self.images,
        })
    }

    fn execute(
        &mut self,
        operations: &[Operation],
        resources: Option<&'a Dictionary>,
        mut gs: GraphicsState,
        depth: usize,
    ) {
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut text = TextMatrices {
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
        };

        for op in operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => match stack.pop() {
                    Some(saved) => gs = saved,
                    None => debug!("unbalanced Q ignored"),
                },
                "cm" => {
                    if let Some([a, b, c, d, e, f]) = numbers::<6>(operands) {
                        gs.ctm = Matrix::new(a, b, c, d, e, f).then(&gs.ctm);
                    }
                }
                "BT" | "ET" => text.reset(),
                "Tf" => {
                    if let (Some(Object::Name(name)), Some(size)) =
                        (operands.first(), operands.get(1).and_then(number))
                    {
                        gs.text.font = self.font(resources, name);
                        gs.text.size = size;
                    }
                }
                "Tc" => set_number(operands, &mut gs.text.char_spacing),
                "Tw" => set_number(operands, &mut gs.text.word_spacing),
                "TL" => set_number(operands, &mut gs.text.leading),
                "Ts" => set_number(operands, &mut gs.text.rise),
                "Tz" => {
                    if let Some([scale]) = numbers::<1>(operands) {
                        gs.text.horizontal_scale = scale / 100.0;
                    }
                }
                "Td" => {
                    if let Some([tx, ty]) = numbers::<2>(operands) {
                        text.next_line(tx, ty);
                    }
                }
                "TD" => {
                    if let Some([tx, ty]) = numbers::<2>(operands) {
                        gs.text.leading = -ty;
                        text.next_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some([a, b, c, d, e, f]) = numbers::<6>(operands) {
                        text.tlm = Matrix::new(a, b, c, d, e, f);
                        text.tm = text.tlm;
                    }
                }
                "T*" => text.next_line(0.0, -gs.text.leading),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show_text(&gs, &mut text, bytes);
                    }
                }
                "'" => {
                    text.next_line(0.0, -gs.text.leading);
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show_text(&gs, &mut text, bytes);
                    }
                }
                "\"" => {
                    if let (Some(aw), Some(ac), Some(Object::String(bytes, _))) = (
                        operands.first().and_then(number),
                        operands.get(1).and_then(number),
                        operands.get(2),
                    ) {
                        gs.text.word_spacing = aw;
                        gs.text.char_spacing = ac;
                        text.next_line(0.0, -gs.text.leading);
                        self.show_text(&gs, &mut text, bytes);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show_text(&gs, &mut text, bytes),
                                other => {
                                    if let Some(adjust) = number(other) {
                                        let tx = -adjust / 1000.0
                                            * gs.text.size
                                            * gs.text.horizontal_scale;
                                        text.tm = Matrix::translation(tx, 0.0).then(&text.tm);
                                    }
                                }
                            }
                        }
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.draw_xobject(resources, name, &gs, depth);
                    }
                }
                _ => {}
            }
        }
    }

    /// Paint the glyphs of one string and advance the text matrix.
    fn show_text(&mut self, gs: &GraphicsState, text: &mut TextMatrices, bytes: &[u8]) {
        let ts = &gs.text;
        let font = Rc::clone(&ts.font);
        let glyph_space = Matrix::new(ts.size * ts.horizontal_scale, 0.0, 0.0, ts.size, 0.0, ts.rise);
        let descent = font.descent();

        for (code, length) in font.codes(bytes) {
            let w0 = font.width(code) / 1000.0;
            let glyph = font.decode(code);

            let trm = glyph_space.then(&text.tm).then(&gs.ctm);
            let rect = trm.transform_rect(0.0, descent, w0, descent + 1.0);
            if !glyph.is_empty() && !glyph.chars().all(char::is_control) {
                self.words.push_glyph(&glyph, self.area.to_top_left(rect));
            }

            let mut spacing = ts.char_spacing;
            if code == 32 && length == 1 {
                spacing += ts.word_spacing;
            }
            let tx = (w0 * ts.size + spacing) * ts.horizontal_scale;
            text.tm = Matrix::translation(tx, 0.0).then(&text.tm);
        }
    }

    fn font(&mut self, resources: Option<&'a Dictionary>, name: &[u8]) -> Rc<SourceFont> {
        let Some((dict, id)) = resources.and_then(|res| font_resource(self.doc, res, name)) else {
            warn!(font = %String::from_utf8_lossy(name), "font resource missing, measuring as Helvetica");
            return Rc::clone(&self.fallback_font);
        };
        match id {
            Some(id) => {
                let doc = self.doc;
                Rc::clone(
                    self.fonts
                        .entry(id)
                        .or_insert_with(|| Rc::new(SourceFont::load(doc, dict))),
                )
            }
            None => Rc::new(SourceFont::load(self.doc, dict)),
        }
    }

    fn draw_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        gs: &GraphicsState,
        depth: usize,
    ) {
        let doc = self.doc;
        let Some(stream) = resources
            .and_then(|res| get_dict(doc, res, b"XObject"))
            .and_then(|xobjects| get_stream(doc, xobjects, name))
        else {
            debug!(xobject = %String::from_utf8_lossy(name), "XObject not found");
            return;
        };

        match get_name(doc, &stream.dict, b"Subtype") {
            Some(b"Image") => {
                let rect = gs.ctm.transform_rect(0.0, 0.0, 1.0, 1.0);
                self.images.push(ImagePlacement {
                    bounds: self.area.to_top_left(rect),
                    stream,
                });
            }
            Some(b"Form") => {
                if depth >= MAX_FORM_DEPTH {
                    warn!(depth, "form XObjects nested too deeply, skipping");
                    return;
                }
                let matrix = match stream.dict.get(b"Matrix") {
                    Ok(Object::Array(items)) => numbers::<6>(items)
                        .map(|[a, b, c, d, e, f]| Matrix::new(a, b, c, d, e, f))
                        .unwrap_or(Matrix::IDENTITY),
                    _ => Matrix::IDENTITY,
                };
                let form_resources = get_dict(doc, &stream.dict, b"Resources").or(resources);
                let content = match Content::decode(&stream_data(stream)) {
                    Ok(content) => content,
                    Err(err) => {
                        warn!(%err, "malformed form XObject, skipping");
                        return;
                    }
                };

                let mut form_state = gs.clone();
                form_state.ctm = matrix.then(&gs.ctm);
                self.execute(&content.operations, form_resources, form_state, depth + 1);
            }
            _ => {}
        }
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut values = [0.0f32; N];
    for (slot, operand) in values.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(values)
}

fn set_number(operands: &[Object], target: &mut f32) {
    if let Some([value]) = numbers::<1>(operands) {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ImageRun, PdfBuilder, TextRun};

    #[test]
    fn matrix_product_applies_left_operand_first() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translation(10.0, 5.0);
        assert_eq!(scale.then(&shift).apply(1.0, 1.0), (12.0, 7.0));
        assert_eq!(shift.then(&scale).apply(1.0, 1.0), (22.0, 12.0));
    }

    #[test]
    fn glyphs_are_grouped_into_words() {
        let mut builder = WordBuilder::new(3.0, 3.0);
        builder.push_glyph("H", BoundingBox::new(10.0, 100.0, 18.0, 112.0));
        builder.push_glyph("i", BoundingBox::new(18.0, 100.0, 21.0, 112.0));
        builder.push_glyph(" ", BoundingBox::new(21.0, 100.0, 24.0, 112.0));
        builder.push_glyph("y", BoundingBox::new(24.0, 100.0, 30.0, 112.0));
        // Gap wider than the tolerance starts a new word even without a space.
        builder.push_glyph("o", BoundingBox::new(40.0, 100.0, 46.0, 112.0));
        // So does a jump to another baseline.
        builder.push_glyph("u", BoundingBox::new(46.0, 130.0, 52.0, 142.0));

        let words: Vec<String> = builder.finish().into_iter().map(|w| w.text).collect();
        assert_eq!(words, ["Hi", "y", "o", "u"]);
    }

    #[test]
    fn simple_page_yields_positioned_words() {
        let doc = PdfBuilder::letter()
            .page(vec![TextRun::new("Hello world", 72.0, 700.0, 12.0)], vec![])
            .build_document();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = get_dict(&doc, page, b"Resources");

        let result = ContentInterpreter::new(&doc, PageArea::LETTER, 3.0, 3.0)
            .run(&content, resources)
            .unwrap();

        assert_eq!(result.words.len(), 2);
        let hello = &result.words[0];
        assert_eq!(hello.text, "Hello");
        assert!((hello.x0 - 72.0).abs() < 1e-3);
        // Baseline at 700 from the bottom: top = 792 - (700 - 0.207*12 + 12).
        assert!((hello.top - 82.484).abs() < 1e-2, "top = {}", hello.top);
        assert!((hello.bottom - 94.484).abs() < 1e-2, "bottom = {}", hello.bottom);
        // "Hello" in Helvetica: 722+556+222+222+556 = 2278 thousandths.
        assert!((hello.x1 - (72.0 + 27.336)).abs() < 1e-2, "x1 = {}", hello.x1);

        let world = &result.words[1];
        assert_eq!(world.text, "world");
        assert!(world.x0 > hello.x1);
    }

    #[test]
    fn image_xobject_maps_the_unit_square_through_the_ctm() {
        let doc = PdfBuilder::letter()
            .page(vec![], vec![ImageRun::solid(100.0, 500.0, 200.0, 150.0)])
            .build_document();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let page = doc.get_dictionary(page_id).unwrap();

        let result = ContentInterpreter::new(&doc, PageArea::LETTER, 3.0, 3.0)
            .run(&content, get_dict(&doc, page, b"Resources"))
            .unwrap();

        assert_eq!(result.images.len(), 1);
        let bounds = result.images[0].bounds;
        assert_eq!(bounds, BoundingBox::new(100.0, 142.0, 300.0, 292.0));
    }
}
