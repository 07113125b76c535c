// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading source geometry and writing the re-laid-out document.

pub mod content;
pub mod fonts;
pub(crate) mod objects;
pub mod reader;
pub mod writer;

pub use content::{ImagePlacement, PageArea};
pub use reader::{PdfReader, SourcePage};
pub use writer::{PdfWriter, TextStyle};
