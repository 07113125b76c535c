// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for readers who receive a diagnostic document
// instead of their converted file.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the CLI reports the problem.

use crate::error::LegibleError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user must do something (pick another file, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying: the file itself is the problem.
    Permanent,
    /// Something on this machine went wrong; trying again may help.
    Transient,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `LegibleError` into a `HumanError` a reader can act on.
pub fn humanize_error(err: &LegibleError) -> HumanError {
    match err {
        LegibleError::UnreadableInput(_) => HumanError {
            message: "This file doesn't look like a PDF.".into(),
            suggestion: "Check that you picked the right file. Only PDF documents can be converted.".into(),
            severity: Severity::ActionRequired,
        },

        LegibleError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer first to check it works, or save a fresh copy and convert that.".into(),
            severity: Severity::Permanent,
        },

        LegibleError::EmptyDocument => HumanError {
            message: "This PDF has no pages.".into(),
            suggestion: "The file may be incomplete. Try downloading or exporting it again.".into(),
            severity: Severity::Permanent,
        },

        LegibleError::ImageError(_) => HumanError {
            message: "A picture in this document couldn't be copied.".into(),
            suggestion: "The text was still converted. If the picture matters, open the original alongside the converted copy.".into(),
            severity: Severity::Permanent,
        },

        LegibleError::FontError(detail) => HumanError {
            message: "The chosen font couldn't be loaded.".into(),
            suggestion: format!("Pick a different font, or check that the font file is installed. ({detail})"),
            severity: Severity::ActionRequired,
        },

        LegibleError::InvalidConfig(detail) => HumanError {
            message: "Some of the formatting settings don't look right.".into(),
            suggestion: format!("Check the font size, spacing and colour values and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        LegibleError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Legible doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file to a different location first.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    severity: Severity::Transient,
                }
            }
        }

        LegibleError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check that the settings file is valid JSON.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_input_is_action_required() {
        let human = humanize_error(&LegibleError::UnreadableInput("missing header".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("PDF"));
    }

    #[test]
    fn damaged_pdf_is_permanent() {
        let err = LegibleError::PdfError("invalid cross-reference table".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn font_error_carries_detail_in_suggestion() {
        let err = LegibleError::FontError("OpenDyslexic.ttf not found".into());
        let human = humanize_error(&err);
        assert!(human.suggestion.contains("OpenDyslexic.ttf not found"));
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = LegibleError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }
}
