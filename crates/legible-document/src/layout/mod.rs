// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout — turns extracted words into lines, wraps them to the output width
// and places them on output pages around the images.

pub mod lines;
pub mod overlap;
pub mod paginate;
pub mod wrap;

pub use lines::{LogicalLine, reconstruct_lines};
pub use overlap::{TextPlacement, collides};
pub use paginate::{PageFrame, Paginator, PlacedImage, PlacedLine, PlannedPage, RenderCursor};
pub use wrap::{TextMeasure, wrap_text};
