// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Row clustering: groups bubble candidates into horizontal bands and infers
// how many options each question has.

use pruefwerk_core::config::ScanConfig;
use pruefwerk_core::{BubbleCandidate, Row, SheetLayout};
use tracing::{debug, info, instrument, warn};

/// Rows found on a sheet, top to bottom, and the inferred layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGrid {
    pub rows: Vec<Row>,
    pub layout: SheetLayout,
    /// Vertical window used to merge candidates into a row, in pixels.
    pub tolerance: f32,
}

/// Groups candidates into rows by vertical proximity.
#[derive(Debug, Clone, Copy)]
pub struct RowClusterer<'a> {
    config: &'a ScanConfig,
}

impl<'a> RowClusterer<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    /// Cluster `candidates` into rows.
    ///
    /// Returns `None` when there are too few candidates to be a real grid.
    /// Rows of the wrong length are kept; dropping them is the mapper's job.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub fn cluster(&self, candidates: &[BubbleCandidate]) -> Option<RowGrid> {
        if candidates.is_empty() || candidates.len() < self.config.min_candidates {
            warn!(
                found = candidates.len(),
                required = self.config.min_candidates,
                "Too few bubble candidates"
            );
            return None;
        }

        let tolerance = self.tolerance(candidates);

        let mut by_y: Vec<&BubbleCandidate> = candidates.iter().collect();
        by_y.sort_by(|a, b| a.center.y.total_cmp(&b.center.y));

        let mut rows: Vec<Row> = Vec::new();
        let mut current: Vec<BubbleCandidate> = Vec::new();
        let mut anchor_y = by_y[0].center.y;
        for candidate in by_y {
            if current.is_empty() || (candidate.center.y - anchor_y).abs() < tolerance {
                current.push(candidate.clone());
            } else {
                rows.push(close_row(anchor_y, std::mem::take(&mut current)));
                anchor_y = candidate.center.y;
                current.push(candidate.clone());
            }
        }
        if !current.is_empty() {
            rows.push(close_row(anchor_y, current));
        }

        // Top to bottom by each row's left-most member.
        rows.sort_by(|a, b| leading_y(a).total_cmp(&leading_y(b)));

        let option_count = mode_of_lengths(&rows).min(self.config.max_options);
        let layout = SheetLayout {
            option_count,
            row_count: rows.len(),
        };
        info!(
            rows = rows.len(),
            option_count, tolerance, "Candidates clustered into rows"
        );

        Some(RowGrid {
            rows,
            layout,
            tolerance,
        })
    }

    /// `floor(sqrt(mean area) * factor)`, so the merge window tracks the
    /// apparent bubble size.
    fn tolerance(&self, candidates: &[BubbleCandidate]) -> f32 {
        let mean_area = candidates.iter().map(|c| c.area).sum::<f64>() / candidates.len() as f64;
        let tolerance = (mean_area.sqrt() * self.config.row_tolerance_factor).floor();
        debug!(mean_area, tolerance, "Row tolerance derived");
        tolerance as f32
    }
}

fn close_row(anchor_y: f32, mut members: Vec<BubbleCandidate>) -> Row {
    members.sort_by(|a, b| a.center.x.total_cmp(&b.center.x));
    Row { anchor_y, members }
}

fn leading_y(row: &Row) -> f32 {
    row.members.first().map_or(row.anchor_y, |m| m.center.y)
}

/// Most common row length; on a tie, the length seen first wins.
fn mode_of_lengths(rows: &[Row]) -> usize {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for row in rows {
        match counts.iter_mut().find(|(len, _)| *len == row.len()) {
            Some((_, n)) => *n += 1,
            None => counts.push((row.len(), 1)),
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (len, n) in counts {
        if best.is_none_or(|(_, best_n)| n > best_n) {
            best = Some((len, n));
        }
    }
    best.map_or(0, |(len, _)| len)
}
