// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline front half: binarization, contour geometry, sheet
// boundary search and perspective rectification.

pub mod binarize;
pub mod contour;
pub mod locate;
pub mod rectify;

pub use locate::DocumentLocator;
pub use rectify::{PerspectiveNormalizer, RectifiedDocument};
