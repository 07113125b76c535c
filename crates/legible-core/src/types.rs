// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Legible re-layout engine.

use serde::{Deserialize, Serialize};

/// Standard paper sizes for the output document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    Letter,
    A4,
    Legal,
    Custom { width_pt: f32, height_pt: f32 },
}

impl PaperSize {
    /// Dimensions in PDF points (width, height).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            Self::Letter => (612.0, 792.0),
            Self::A4 => (595.28, 841.89),
            Self::Legal => (612.0, 1008.0),
            Self::Custom {
                width_pt,
                height_pt,
            } => (*width_pt, *height_pt),
        }
    }

    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        let (w, h) = self.dimensions_pt();
        (w * 25.4 / 72.0, h * 25.4 / 72.0)
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::Letter
    }
}

/// An axis-aligned rectangle in top-left-origin page space.
///
/// `top` is the distance from the top edge of the page to the top of the box,
/// `bottom` the distance to its bottom, so `top <= bottom` for a valid box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// True when the box encloses a positive area.
    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Intersection of `self` with `bounds`, taken edge by edge.
    ///
    /// The result always lies within `bounds`; when the boxes are disjoint the
    /// result has no area (check with [`BoundingBox::has_area`]).
    pub fn clamp_to(&self, bounds: &BoundingBox) -> BoundingBox {
        let x0 = self.x0.clamp(bounds.x0, bounds.x1);
        let top = self.top.clamp(bounds.top, bounds.bottom);
        let x1 = self.x1.clamp(x0, bounds.x1);
        let bottom = self.bottom.clamp(top, bounds.bottom);
        BoundingBox {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// True when `self` lies entirely within `outer`.
    pub fn is_within(&self, outer: &BoundingBox) -> bool {
        self.x0 >= outer.x0 && self.x1 <= outer.x1 && self.top >= outer.top && self.bottom <= outer.bottom
    }
}

/// One extracted word with its bounding box on a source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    pub bottom: f32,
}

impl WordToken {
    pub fn new(text: impl Into<String>, x0: f32, x1: f32, top: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            top,
            bottom,
        }
    }
}

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8 { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components scaled to the 0.0..=1.0 range PDF colour operators expect.
    pub fn to_unit(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl std::fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: BoundingBox = BoundingBox {
        x0: 0.0,
        top: 0.0,
        x1: 612.0,
        bottom: 792.0,
    };

    #[test]
    fn overhanging_edges_are_cut_to_the_page() {
        let cases = [
            (BoundingBox::new(-40.0, 100.0, 200.0, 300.0), BoundingBox::new(0.0, 100.0, 200.0, 300.0)),
            (BoundingBox::new(100.0, -25.0, 200.0, 300.0), BoundingBox::new(100.0, 0.0, 200.0, 300.0)),
            (BoundingBox::new(500.0, 100.0, 700.0, 300.0), BoundingBox::new(500.0, 100.0, 612.0, 300.0)),
            (BoundingBox::new(100.0, 700.0, 200.0, 900.0), BoundingBox::new(100.0, 700.0, 200.0, 792.0)),
            (BoundingBox::new(-10.0, -10.0, 700.0, 900.0), LETTER),
        ];
        for (placed, expected) in cases {
            let clamped = placed.clamp_to(&LETTER);
            assert_eq!(clamped, expected, "clamping {placed:?}");
            assert!(clamped.is_within(&LETTER));
            assert!(clamped.has_area());
        }
    }

    #[test]
    fn disjoint_box_has_no_area_after_clamping() {
        for placed in [
            BoundingBox::new(700.0, 10.0, 800.0, 20.0),
            BoundingBox::new(10.0, -200.0, 100.0, -50.0),
            BoundingBox::new(-90.0, 10.0, -10.0, 20.0),
            BoundingBox::new(10.0, 800.0, 100.0, 850.0),
        ] {
            let clamped = placed.clamp_to(&LETTER);
            assert!(!clamped.has_area(), "{placed:?} became {clamped:?}");
            assert!(clamped.is_within(&LETTER));
        }
    }

    #[test]
    fn clamping_is_idempotent() {
        let boxes = [
            BoundingBox::new(-40.0, -25.0, 300.0, 400.0),
            BoundingBox::new(50.0, 60.0, 70.0, 80.0),
            BoundingBox::new(600.0, 780.0, 900.0, 1000.0),
            BoundingBox::new(700.0, 10.0, 800.0, 20.0),
        ];
        for placed in boxes {
            let once = placed.clamp_to(&LETTER);
            assert_eq!(once.clamp_to(&LETTER), once);
            assert!(once.is_within(&LETTER));
        }
    }

    #[test]
    fn box_inside_the_page_is_unchanged() {
        let placed = BoundingBox::new(50.0, 60.0, 70.0, 80.0);
        assert_eq!(placed.clamp_to(&LETTER), placed);
        assert_eq!((placed.width(), placed.height()), (20.0, 20.0));
    }

    #[test]
    fn paper_sizes_convert_to_millimetres() {
        let (w, h) = PaperSize::A4.dimensions_mm();
        assert!((w - 210.0).abs() < 0.1);
        assert!((h - 297.0).abs() < 0.1);
        assert_eq!(PaperSize::default(), PaperSize::Letter);
    }

    #[test]
    fn colours_scale_to_unit_range() {
        assert_eq!(Rgb8::new(255, 0, 51).to_unit(), (1.0, 0.0, 0.2));
        assert_eq!(Rgb8::new(0, 51, 102).to_string(), "#003366");
    }
}
