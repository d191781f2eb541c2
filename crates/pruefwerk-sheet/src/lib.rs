// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pruefwerk-sheet: Reads multiple-choice answer sheets from photographs.
//
// Locates the sheet in the frame, rectifies it to a top-down portrait view,
// finds the answer bubbles, groups them into question rows and decodes the
// marked option of each row.

pub mod image;
pub mod omr;
pub mod overlay;
pub mod pipeline;
pub mod scan;

#[cfg(test)]
mod test_support;

// Re-export the primary structs so callers can use `pruefwerk_sheet::SheetScanner` etc.
pub use crate::image::Frame;
pub use omr::{AnswerMapper, BubbleCandidateDetector, RowClusterer};
pub use overlay::{render_boundary, render_overlay};
pub use pipeline::{SheetScan, SheetScanner};
pub use scan::{DocumentLocator, PerspectiveNormalizer, RectifiedDocument};
