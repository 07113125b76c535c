// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paginator — places images and wrapped lines onto output pages.
//
// The paginator is purely geometric: it decides which output page every image
// and line lands on and where, and the PDF writer replays the result.

use legible_core::types::BoundingBox;
use serde::Serialize;
use tracing::debug;

use super::overlap::{TextPlacement, first_collision};

/// Output page dimensions and spacing, all in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub line_spacing: f32,
}

impl PageFrame {
    /// Widest line that fits between the side margins.
    pub fn max_line_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    fn top(&self) -> f32 {
        self.height - self.margin
    }
}

/// Current drawing position on the output page, bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCursor {
    pub x: f32,
    pub y: f32,
}

/// A line of text with its baseline origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

/// An image drawn at its source position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedImage {
    /// Caller-assigned handle identifying the bitmap.
    #[serde(skip)]
    pub handle: usize,
    /// Bounds in top-left page space, used for collision checks.
    #[serde(skip)]
    pub bounds: BoundingBox,
    /// Lower-left corner in bottom-left page space.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything drawn on one output page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlannedPage {
    pub images: Vec<PlacedImage>,
    pub lines: Vec<PlacedLine>,
}

/// Lays out a document one source page at a time.
#[derive(Debug)]
pub struct Paginator {
    frame: PageFrame,
    pages: Vec<PlannedPage>,
    cursor: RenderCursor,
    started: bool,
    /// Set when the cursor fell below the bottom margin after a line; the
    /// next line opens a fresh page so the document never ends on a blank one.
    break_pending: bool,
}

impl Paginator {
    pub fn new(frame: PageFrame) -> Self {
        Self {
            frame,
            pages: vec![PlannedPage::default()],
            cursor: RenderCursor {
                x: frame.margin,
                y: frame.top(),
            },
            started: false,
            break_pending: false,
        }
    }

    pub fn cursor(&self) -> RenderCursor {
        self.cursor
    }

    /// Start laying out the next source page: every source page after the
    /// first begins a new output page, then `images` are placed on it.
    ///
    /// Each image is `(handle, bounds)` with bounds in top-left space.
    pub fn begin_source_page(&mut self, images: impl IntoIterator<Item = (usize, BoundingBox)>) {
        if self.started {
            self.new_page();
        } else {
            self.started = true;
            self.reset_cursor();
        }
        self.break_pending = false;

        let height = self.frame.height;
        let page = self.current_page();
        for (handle, bounds) in images {
            page.images.push(PlacedImage {
                handle,
                bounds,
                x: bounds.x0,
                y: height - bounds.bottom,
                width: bounds.width(),
                height: bounds.height(),
            });
        }
    }

    /// Place one wrapped line of `width` points at the cursor, moving down
    /// past any image it would collide with.
    pub fn place_line(&mut self, text: impl Into<String>, width: f32) {
        if self.break_pending {
            self.new_page();
        }

        loop {
            let placement = TextPlacement {
                x: self.cursor.x,
                y: self.cursor.y,
                width,
            };
            let page = &self.pages[self.pages.len() - 1];
            let hit = first_collision(
                &placement,
                page.images.iter().map(|image| &image.bounds),
                self.frame.height,
            );
            if hit.is_none() {
                break;
            }
            if !self.advance() {
                debug!("image displacement reached the bottom margin, breaking page");
                self.new_page();
            }
        }

        let line = PlacedLine {
            text: text.into(),
            x: self.cursor.x,
            y: self.cursor.y,
            width,
        };
        self.current_page().lines.push(line);

        if !self.advance() {
            self.break_pending = true;
        }
    }

    /// Finish layout. Always yields at least one (possibly empty) page.
    pub fn finish(self) -> Vec<PlannedPage> {
        self.pages
    }

    fn new_page(&mut self) {
        self.pages.push(PlannedPage::default());
        self.reset_cursor();
        self.break_pending = false;
    }

    /// Move the cursor down one line. False when it left the printable area
    /// or could not move at all (a spacing below the float resolution of y).
    fn advance(&mut self) -> bool {
        let before = self.cursor.y;
        self.cursor.y -= self.frame.line_spacing;
        self.cursor.y >= self.frame.margin && self.cursor.y < before
    }

    fn reset_cursor(&mut self) {
        self.cursor = RenderCursor {
            x: self.frame.margin,
            y: self.frame.top(),
        };
    }

    fn current_page(&mut self) -> &mut PlannedPage {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}
