// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decodes image XObjects from the source document and crops
// them to the part that is visible on the page. Built on the `image` crate.

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use legible_core::error::{LegibleError, Result};
use legible_core::types::BoundingBox;
use lopdf::{Document, Object, Stream};
use tracing::{debug, instrument};

use crate::pdf::objects::{filter_names, get, get_number, resolve, stream_data};

/// A source image ready to be redrawn: its clamped page bounds (top-left
/// space) and the raster cropped to those bounds.
#[derive(Debug, Clone)]
pub struct ImageRegion {
    pub bounds: BoundingBox,
    pub bitmap: DynamicImage,
}

/// Colour layout of raw (non-JPEG) image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleLayout {
    Gray,
    Rgb,
    Cmyk,
}

impl SampleLayout {
    fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }
}

/// Image pipeline over a single decoded raster.
///
/// Methods consume `self` and return the transformed processor, so the steps
/// chain:
///
/// ```ignore
/// let region = ImageProcessor::from_xobject(&doc, stream)?
///     .crop_to_visible(&placed, &clamped)
///     .into_region(clamped);
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode an image XObject stream.
    ///
    /// Supports `DCTDecode` (JPEG) and raw or `FlateDecode` samples in
    /// DeviceGray, DeviceRGB, DeviceCMYK or ICCBased colour at 8 bits per
    /// component, plus 1-bit DeviceGray. Anything else is an
    /// [`LegibleError::ImageError`].
    #[instrument(skip_all, fields(bytes_len = stream.content.len()))]
    pub fn from_xobject(doc: &Document, stream: &Stream) -> Result<Self> {
        let dict = &stream.dict;
        if matches!(get(doc, dict, b"ImageMask"), Some(Object::Boolean(true))) {
            return Err(LegibleError::ImageError("stencil masks carry no colour".into()));
        }

        let filters = filter_names(doc, stream);
        if filters.iter().any(|f| f.as_slice() == b"DCTDecode") {
            if filters.len() != 1 {
                return Err(LegibleError::ImageError(
                    "chained filters before DCTDecode are not supported".into(),
                ));
            }
            let image = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|err| LegibleError::ImageError(format!("failed to decode JPEG: {}", err)))?;
            debug!(width = image.width(), height = image.height(), "JPEG image decoded");
            return Ok(Self { image });
        }
        if let Some(other) = filters
            .iter()
            .find(|f| !matches!(f.as_slice(), b"FlateDecode" | b"Fl"))
        {
            return Err(LegibleError::ImageError(format!(
                "unsupported image filter {}",
                String::from_utf8_lossy(other)
            )));
        }

        let width = dimension(doc, stream, b"Width")?;
        let height = dimension(doc, stream, b"Height")?;
        let bits = get_number(doc, dict, b"BitsPerComponent").unwrap_or(8.0) as u32;
        let layout = sample_layout(doc, stream)?;
        let data = if filters.is_empty() {
            stream.content.clone()
        } else {
            stream_data(stream)
        };

        let image = decode_samples(&data, width, height, bits, layout)?;
        debug!(width, height, bits, ?layout, "raw image decoded");
        Ok(Self { image })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Crop a rectangular region from the image.
    ///
    /// `x` and `y` are the top-left corner. Values are clamped to the image
    /// bounds and the result is never smaller than one pixel.
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.clamp(1, (img_w - safe_x).max(1));
        let safe_h = height.clamp(1, (img_h - safe_y).max(1));

        Self {
            image: self.image.crop_imm(safe_x, safe_y, safe_w, safe_h),
        }
    }

    /// Keep only the part of the image that falls inside `visible`, given
    /// that the whole image is drawn over `placed` (both top-left page space).
    pub fn crop_to_visible(self, placed: &BoundingBox, visible: &BoundingBox) -> Self {
        if visible == placed || !placed.has_area() {
            return self;
        }

        let scale_x = self.image.width() as f32 / placed.width();
        let scale_y = self.image.height() as f32 / placed.height();
        let x = ((visible.x0 - placed.x0) * scale_x).floor().max(0.0) as u32;
        let y = ((visible.top - placed.top) * scale_y).floor().max(0.0) as u32;
        let width = (visible.width() * scale_x).ceil().max(1.0) as u32;
        let height = (visible.height() * scale_y).ceil().max(1.0) as u32;

        debug!(x, y, width, height, "cropping image to the visible area");
        self.crop(x, y, width, height)
    }

    pub fn into_region(self, bounds: BoundingBox) -> ImageRegion {
        ImageRegion {
            bounds,
            bitmap: self.image,
        }
    }
}

/// Decode an image placed at `placed` on a page whose own box is `page`.
///
/// Returns `Ok(None)` when nothing of the image is visible on the page.
pub fn extract_region(
    doc: &Document,
    stream: &Stream,
    placed: &BoundingBox,
    page: &BoundingBox,
) -> Result<Option<ImageRegion>> {
    let visible = placed.clamp_to(page);
    if !visible.has_area() {
        return Ok(None);
    }
    let region = ImageProcessor::from_xobject(doc, stream)?
        .crop_to_visible(placed, &visible)
        .into_region(visible);
    Ok(Some(region))
}

// -- Raw samples ----------------------------------------------------------------

fn dimension(doc: &Document, stream: &Stream, key: &[u8]) -> Result<u32> {
    match get_number(doc, &stream.dict, key) {
        Some(value) if value >= 1.0 && value <= 20_000.0 => Ok(value as u32),
        other => Err(LegibleError::ImageError(format!(
            "image /{} is missing or out of range: {:?}",
            String::from_utf8_lossy(key),
            other
        ))),
    }
}

fn sample_layout(doc: &Document, stream: &Stream) -> Result<SampleLayout> {
    let unsupported = |what: &str| LegibleError::ImageError(format!("unsupported colour space {what}"));

    match get(doc, &stream.dict, b"ColorSpace") {
        None => Err(LegibleError::ImageError("image has no colour space".into())),
        Some(Object::Name(name)) => layout_for_name(name).ok_or_else(|| unsupported(&String::from_utf8_lossy(name))),
        Some(Object::Array(items)) => {
            let family = items.first().map(|item| resolve(doc, item));
            match family {
                Some(Object::Name(name)) if name.as_slice() == b"ICCBased" => {
                    let components = items
                        .get(1)
                        .map(|profile| resolve(doc, profile))
                        .and_then(|profile| match profile {
                            Object::Stream(profile) => get_number(doc, &profile.dict, b"N"),
                            _ => None,
                        });
                    match components.map(|n| n as u32) {
                        Some(1) => Ok(SampleLayout::Gray),
                        Some(3) => Ok(SampleLayout::Rgb),
                        Some(4) => Ok(SampleLayout::Cmyk),
                        other => Err(unsupported(&format!("ICCBased with N = {:?}", other))),
                    }
                }
                Some(Object::Name(name)) => {
                    layout_for_name(name).ok_or_else(|| unsupported(&String::from_utf8_lossy(name)))
                }
                _ => Err(unsupported("array")),
            }
        }
        Some(other) => Err(unsupported(&format!("{:?}", other))),
    }
}

fn layout_for_name(name: &[u8]) -> Option<SampleLayout> {
    match name {
        b"DeviceGray" | b"G" | b"CalGray" => Some(SampleLayout::Gray),
        b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(SampleLayout::Rgb),
        b"DeviceCMYK" | b"CMYK" => Some(SampleLayout::Cmyk),
        _ => None,
    }
}

fn decode_samples(
    data: &[u8],
    width: u32,
    height: u32,
    bits: u32,
    layout: SampleLayout,
) -> Result<DynamicImage> {
    let (w, h) = (width as usize, height as usize);

    if bits == 1 && layout == SampleLayout::Gray {
        let row_bytes = w.div_ceil(8);
        require_len(data, row_bytes * h)?;
        let image = GrayImage::from_fn(width, height, |x, y| {
            let byte = data[y as usize * row_bytes + x as usize / 8];
            let bit = (byte >> (7 - (x % 8))) & 1;
            image::Luma([if bit == 1 { 255 } else { 0 }])
        });
        return Ok(DynamicImage::ImageLuma8(image));
    }

    if bits != 8 {
        return Err(LegibleError::ImageError(format!(
            "{bits} bits per component is not supported"
        )));
    }

    let expected = w * h * layout.channels();
    require_len(data, expected)?;
    let samples = &data[..expected];

    let image = match layout {
        SampleLayout::Gray => GrayImage::from_raw(width, height, samples.to_vec()).map(DynamicImage::ImageLuma8),
        SampleLayout::Rgb => RgbImage::from_raw(width, height, samples.to_vec()).map(DynamicImage::ImageRgb8),
        SampleLayout::Cmyk => {
            let rgb: Vec<u8> = samples.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
    };
    image.ok_or_else(|| LegibleError::ImageError("image buffer size mismatch".into()))
}

fn require_len(data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(LegibleError::ImageError(format!(
            "image data truncated: {} of {} bytes",
            data.len(),
            expected
        )));
    }
    Ok(())
}

fn cmyk_to_rgb(pixel: &[u8]) -> [u8; 3] {
    let k = 255 - u16::from(pixel[3]);
    let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
    [channel(pixel[0]), channel(pixel[1]), channel(pixel[2])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn raw_stream(color_space: Object, bits: i64, width: i64, height: i64, data: Vec<u8>) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => color_space,
                "BitsPerComponent" => bits,
            },
            data,
        )
    }

    #[test]
    fn decodes_raw_rgb() {
        let doc = Document::with_version("1.5");
        let stream = raw_stream("DeviceRGB".into(), 8, 2, 1, vec![255, 0, 0, 0, 0, 255]);
        let image = ImageProcessor::from_xobject(&doc, &stream).unwrap().into_dynamic();
        let rgb = image.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 255]);
    }

    #[test]
    fn decodes_one_bit_gray_with_row_padding() {
        let doc = Document::with_version("1.5");
        // 3 pixels per row pad to one byte: rows 101 and 010.
        let stream = raw_stream("DeviceGray".into(), 1, 3, 2, vec![0b1010_0000, 0b0100_0000]);
        let gray = ImageProcessor::from_xobject(&doc, &stream)
            .unwrap()
            .into_dynamic()
            .to_luma8();
        let row0: Vec<u8> = (0..3).map(|x| gray.get_pixel(x, 0).0[0]).collect();
        let row1: Vec<u8> = (0..3).map(|x| gray.get_pixel(x, 1).0[0]).collect();
        assert_eq!(row0, [255, 0, 255]);
        assert_eq!(row1, [0, 255, 0]);
    }

    #[test]
    fn cmyk_converts_to_rgb() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), [0, 255, 255]);
    }

    #[test]
    fn truncated_data_is_an_image_error() {
        let doc = Document::with_version("1.5");
        let stream = raw_stream("DeviceRGB".into(), 8, 4, 4, vec![0; 10]);
        assert!(matches!(
            ImageProcessor::from_xobject(&doc, &stream),
            Err(LegibleError::ImageError(_))
        ));
    }

    #[test]
    fn indexed_colour_is_unsupported() {
        let doc = Document::with_version("1.5");
        let indexed = Object::Array(vec!["Indexed".into(), "DeviceRGB".into(), 1.into()]);
        let stream = raw_stream(indexed, 8, 1, 1, vec![0]);
        assert!(ImageProcessor::from_xobject(&doc, &stream).is_err());
    }

    /// An image hanging off the right edge keeps only its visible half.
    #[test]
    fn partially_visible_image_is_cropped_proportionally() {
        let doc = Document::with_version("1.5");
        let stream = raw_stream("DeviceGray".into(), 8, 4, 2, vec![10, 20, 30, 40, 50, 60, 70, 80]);
        let page = BoundingBox::new(0.0, 0.0, 612.0, 792.0);
        let placed = BoundingBox::new(572.0, 100.0, 652.0, 140.0);

        let region = extract_region(&doc, &stream, &placed, &page).unwrap().unwrap();
        assert_eq!(region.bounds, BoundingBox::new(572.0, 100.0, 612.0, 140.0));
        assert!(region.bounds.is_within(&page));
        assert_eq!((region.bitmap.width(), region.bitmap.height()), (2, 2));
        assert_eq!(region.bitmap.to_luma8().get_pixel(0, 1).0, [50]);
    }

    #[test]
    fn image_entirely_off_page_yields_nothing() {
        let doc = Document::with_version("1.5");
        let stream = raw_stream("DeviceGray".into(), 8, 1, 1, vec![0]);
        let page = BoundingBox::new(0.0, 0.0, 612.0, 792.0);
        let placed = BoundingBox::new(700.0, 100.0, 800.0, 200.0);
        assert!(extract_region(&doc, &stream, &placed, &page).unwrap().is_none());
    }
}
