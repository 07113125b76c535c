// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collision test between a text placement and the images on the output page.

use legible_core::types::BoundingBox;

/// Where a line of text is about to be drawn, in bottom-left page space.
/// `y` is the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

/// True when `placement` collides with `image`.
///
/// `image` is in top-left page space and is flipped using `page_height`.
/// The line collides when it overlaps the image horizontally and its baseline
/// lies strictly between the image's bottom and top edges. Only the baseline
/// is tested, not the glyph height: a line whose baseline sits just below an
/// image may still have ascenders reaching into it.
pub fn collides(placement: &TextPlacement, image: &BoundingBox, page_height: f32) -> bool {
    let image_bottom = page_height - image.bottom;
    let image_top = page_height - image.top;

    placement.x < image.x1
        && placement.x + placement.width > image.x0
        && placement.y > image_bottom
        && placement.y < image_top
}

/// First image in `images` that `placement` collides with.
pub fn first_collision<'a>(
    placement: &TextPlacement,
    images: impl IntoIterator<Item = &'a BoundingBox>,
    page_height: f32,
) -> Option<&'a BoundingBox> {
    images
        .into_iter()
        .find(|image| collides(placement, image, page_height))
}
