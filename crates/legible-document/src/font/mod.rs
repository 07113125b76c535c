// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font module — typeface registration and glyph metrics.

pub mod metrics;
pub mod registry;

pub use metrics::{BuiltinMetrics, FontMetrics, TrueTypeMetrics};
pub use registry::{ActiveFont, FontRegistry, FontSource};
