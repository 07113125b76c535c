// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Legible.

use thiserror::Error;

/// Top-level error type for all Legible operations.
#[derive(Debug, Error)]
pub enum LegibleError {
    // -- Input errors --
    /// The upload cannot be opened as a PDF at all (empty, or no `%PDF-` header).
    #[error("input is not a readable PDF: {0}")]
    UnreadableInput(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("document contains no pages")]
    EmptyDocument,

    // -- Rendering errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("font unavailable: {0}")]
    FontError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LegibleError>;
