// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Answer mapping: picks the winning bubble of each row and numbers the
// questions.

use pruefwerk_core::config::ScanConfig;
use pruefwerk_core::{Answer, AnswerMap, BubbleCandidate, Point, Row};
use tracing::{debug, info, instrument};

/// The winning bubble of one decoded row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPick {
    pub question: u32,
    /// Position of the winner within the row (left to right).
    pub option_index: usize,
    pub fill_ratio: f64,
    /// Centre of the winner in the rectified view.
    pub center: Point,
    pub answer: Answer,
}

/// Output of [`AnswerMapper::map`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedAnswers {
    pub answers: AnswerMap,
    /// Rows skipped because their length did not match the option count.
    pub dropped_rows: usize,
    pub picks: Vec<RowPick>,
}

/// Turns clustered rows into question answers.
#[derive(Debug, Clone, Copy)]
pub struct AnswerMapper<'a> {
    config: &'a ScanConfig,
}

impl<'a> AnswerMapper<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    /// Decode `rows` (top to bottom, members left to right).
    ///
    /// Never fails: rows with the wrong number of members are skipped and an
    /// empty input gives an empty map.
    #[instrument(skip_all, fields(rows = rows.len(), option_count = option_count))]
    pub fn map(&self, rows: &[Row], option_count: usize) -> MappedAnswers {
        let surviving: Vec<&Row> = rows
            .iter()
            .filter(|row| option_count > 0 && row.len() == option_count)
            .collect();
        let dropped_rows = rows.len() - surviving.len();
        if dropped_rows > 0 {
            debug!(dropped_rows, "Rows with the wrong option count skipped");
        }

        let remap = self.column_remap(surviving.len());

        let mut mapped = MappedAnswers {
            dropped_rows,
            ..MappedAnswers::default()
        };
        for (i, row) in surviving.into_iter().enumerate() {
            let provisional = i as u32 + 1;
            let question = match remap {
                Some(rows_per_column) => {
                    let q = remap_question(provisional, rows_per_column);
                    if q < 1 || q > self.config.max_question {
                        continue;
                    }
                    q
                }
                None => provisional,
            };

            let (option_index, winner) = pick_winner(row);
            let decided = winner.fill_ratio > self.config.fill_decision && winner.marked;
            let answer = if decided {
                Answer::from_index(option_index).unwrap_or(Answer::Blank)
            } else {
                Answer::Blank
            };

            mapped.answers.insert(question, answer);
            mapped.picks.push(RowPick {
                question,
                option_index,
                fill_ratio: winner.fill_ratio,
                center: winner.center,
                answer,
            });
        }

        info!(
            questions = mapped.answers.len(),
            answered = mapped.answers.answered(),
            dropped_rows,
            "Answers mapped"
        );
        mapped
    }

    /// Rows per physical column when the row count looks like a
    /// multi-column sheet.
    fn column_remap(&self, surviving: usize) -> Option<u32> {
        let (lo, hi) = self.config.remap_row_range;
        if surviving < lo || surviving > hi || self.config.column_blocks == 0 {
            return None;
        }
        let rows_per_column = (surviving / self.config.column_blocks) as u32;
        (rows_per_column > 0).then_some(rows_per_column)
    }
}

/// Block-relative renumbering of a provisional question number.
fn remap_question(q: u32, rows_per_column: u32) -> u32 {
    ((q - 1) % rows_per_column) + 1 + ((q - 1) / rows_per_column) * rows_per_column
}

/// First member with the highest fill ratio, in left-to-right order.
fn pick_winner(row: &Row) -> (usize, &BubbleCandidate) {
    let mut best = 0;
    for (i, member) in row.members.iter().enumerate().skip(1) {
        if member.fill_ratio > row.members[best].fill_ratio {
            best = i;
        }
    }
    (best, &row.members[best])
}
