// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mark recognition: bubble detection, row clustering and answer decoding on
// a rectified sheet.

pub mod answers;
pub mod bubbles;
pub mod rows;

pub use answers::{AnswerMapper, MappedAnswers, RowPick};
pub use bubbles::BubbleCandidateDetector;
pub use rows::{RowClusterer, RowGrid};
