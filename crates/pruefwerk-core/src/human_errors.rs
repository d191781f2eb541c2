// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language guidance for whoever is holding the camera.
//
// Every technical error, and every scan outcome short of a clean read, is
// mapped to a short message with something concrete to try next.

use crate::error::PruefwerkError;
use crate::types::{Diagnostics, ScanStatus};

/// Severity of a problem from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The sheet was read; the note is informational.
    Notice,
    /// Retaking the photo will likely fix it.
    Retake,
    /// Cannot be fixed by retaking: wrong file, bad settings.
    Permanent,
}

/// A human-readable message with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying again with a new photo makes sense.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `PruefwerkError` into a `HumanError`.
pub fn humanize_error(err: &PruefwerkError) -> HumanError {
    match err {
        PruefwerkError::ImageError(_) => HumanError {
            message: "This photo couldn't be opened.".into(),
            suggestion: "The file may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PruefwerkError::EmptyFrame { .. } => HumanError {
            message: "The photo is empty.".into(),
            suggestion: "Take the picture again and make sure the camera captured an image.".into(),
            retriable: true,
            severity: Severity::Retake,
        },

        PruefwerkError::Config(detail) => HumanError {
            message: "The scanner settings are invalid.".into(),
            suggestion: format!("Fix or remove the configuration file. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        PruefwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::Permanent,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, check the disk is not full.".into(),
                    retriable: true,
                    severity: Severity::Retake,
                }
            }
        }

        PruefwerkError::Serialization(_) => HumanError {
            message: "The settings file isn't valid JSON.".into(),
            suggestion: "Check the file for typos, or delete it to use the defaults.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Describe a finished scan, or `None` when there is nothing to report.
pub fn humanize_status(diagnostics: &Diagnostics) -> Option<HumanError> {
    match diagnostics.status {
        ScanStatus::TooFewCandidates => Some(HumanError {
            message: "We couldn't find the answer bubbles.".into(),
            suggestion: "Hold the camera straight above the sheet, fill the frame with it, and make sure the light is even.".into(),
            retriable: true,
            severity: Severity::Retake,
        }),
        ScanStatus::NoRowsDecoded => Some(HumanError {
            message: "The answer grid didn't line up.".into(),
            suggestion: "Lay the sheet flat and retake the photo without tilting the camera.".into(),
            retriable: true,
            severity: Severity::Retake,
        }),
        ScanStatus::Ok if !diagnostics.document_found => Some(HumanError {
            message: "We couldn't see the edges of the sheet.".into(),
            suggestion: "The whole photo was read as the sheet. For best results, place the sheet on a darker surface with all four corners visible.".into(),
            retriable: true,
            severity: Severity::Notice,
        }),
        ScanStatus::Ok if diagnostics.dropped_rows > 0 => Some(HumanError {
            message: format!("{} row(s) couldn't be read.", diagnostics.dropped_rows),
            suggestion: "Check those questions by hand, or retake the photo with less glare.".into(),
            retriable: true,
            severity: Severity::Notice,
        }),
        ScanStatus::Ok => None,
    }
}
