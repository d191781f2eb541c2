// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet scanning pipeline.
//
// Frame -> locate sheet -> rectify -> detect bubbles -> cluster rows -> map
// answers. Each stage returns a usable value or an explicit "nothing found";
// the scan itself never fails and always yields a (possibly empty) answer map.

use pruefwerk_core::config::ScanConfig;
use pruefwerk_core::error::Result;
use pruefwerk_core::{
    AnswerMap, BubbleCandidate, Diagnostics, Quadrilateral, Row, ScanReport, ScanStatus,
};
use tracing::{info, instrument, warn};

use crate::image::Frame;
use crate::omr::{AnswerMapper, BubbleCandidateDetector, RowClusterer, RowPick};
use crate::scan::{DocumentLocator, PerspectiveNormalizer, RectifiedDocument};

/// A scan with the intermediate products kept for inspection and overlays.
#[derive(Debug, Clone)]
pub struct SheetScan {
    pub report: ScanReport,
    pub rectified: RectifiedDocument,
    pub candidates: Vec<BubbleCandidate>,
    pub rows: Vec<Row>,
    pub picks: Vec<RowPick>,
}

/// Reads answer sheets from photographs.
#[derive(Debug, Clone, Default)]
pub struct SheetScanner {
    config: ScanConfig,
}

impl SheetScanner {
    /// Build a scanner, rejecting configurations that cannot work.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan `frame` and return the answers with diagnostics.
    pub fn scan(&self, frame: &Frame) -> ScanReport {
        self.scan_detailed(frame).report
    }

    /// Scan `frame`, keeping every intermediate result.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn scan_detailed(&self, frame: &Frame) -> SheetScan {
        let (width, height) = frame.dimensions();
        let mut diagnostics = Diagnostics {
            status: ScanStatus::TooFewCandidates,
            frame_digest: frame.digest(),
            frame_size: (width, height),
            document_found: false,
            quadrilateral: Quadrilateral::full_frame(width, height),
            rotated: false,
            rectified_size: (0, 0),
            candidate_count: 0,
            row_count: 0,
            option_count: None,
            dropped_rows: 0,
        };

        if frame.is_empty() {
            warn!("Empty frame; nothing to scan");
            let rectified = PerspectiveNormalizer.rectify(frame, &diagnostics.quadrilateral);
            return SheetScan {
                report: ScanReport {
                    answers: AnswerMap::new(),
                    layout: None,
                    diagnostics,
                },
                rectified,
                candidates: Vec::new(),
                rows: Vec::new(),
                picks: Vec::new(),
            };
        }

        // 1. Sheet boundary, or the whole frame.
        let located = DocumentLocator::new(self.config.locator.clone()).locate(frame);
        diagnostics.document_found = located.is_some();
        if let Some(quad) = located {
            diagnostics.quadrilateral = quad;
        } else {
            info!("Falling back to the full frame as the sheet");
        }

        // 2. Top-down portrait view.
        let rectified = PerspectiveNormalizer.rectify(frame, &diagnostics.quadrilateral);
        diagnostics.rotated = rectified.rotated;
        diagnostics.rectified_size = rectified.dimensions();

        // 3. Bubble candidates.
        let candidates = BubbleCandidateDetector::new(&self.config).detect(&rectified.gray);
        diagnostics.candidate_count = candidates.len();

        // 4. Rows and layout.
        let Some(grid) = RowClusterer::new(&self.config).cluster(&candidates) else {
            return SheetScan {
                report: ScanReport {
                    answers: AnswerMap::new(),
                    layout: None,
                    diagnostics,
                },
                rectified,
                candidates,
                rows: Vec::new(),
                picks: Vec::new(),
            };
        };
        diagnostics.row_count = grid.rows.len();
        diagnostics.option_count = Some(grid.layout.option_count);

        // 5. Answers.
        let mapped = AnswerMapper::new(&self.config).map(&grid.rows, grid.layout.option_count);
        diagnostics.dropped_rows = mapped.dropped_rows;
        diagnostics.status = if mapped.answers.is_empty() {
            ScanStatus::NoRowsDecoded
        } else {
            ScanStatus::Ok
        };

        info!(
            status = ?diagnostics.status,
            questions = mapped.answers.len(),
            answered = mapped.answers.answered(),
            "Sheet scanned"
        );

        SheetScan {
            report: ScanReport {
                answers: mapped.answers,
                layout: Some(grid.layout),
                diagnostics,
            },
            rectified,
            candidates,
            rows: grid.rows,
            picks: mapped.picks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;
    use pruefwerk_core::Answer;
    use pruefwerk_core::config::DetectionMode;

    use crate::test_support::{
        BubbleStyle, SheetLayoutSpec, draw_answer_sheet, fill_bubble, gray_frame, photograph,
        stack_vertically,
    };

    fn letter(i: usize) -> Answer {
        Answer::from_index(i).expect("letter")
    }

    fn cycling_marks(rows: usize, seed: usize) -> Vec<Option<usize>> {
        (0..rows).map(|r| Some((r * 3 + seed) % 4)).collect()
    }

    #[test]
    fn decodes_one_mark_per_row() {
        let spec = SheetLayoutSpec::default();
        let marks = cycling_marks(20, 1);
        let frame = gray_frame(&draw_answer_sheet(&spec, &marks, BubbleStyle::ThickRing));

        let report = SheetScanner::default().scan(&frame);
        assert_eq!(report.diagnostics.status, ScanStatus::Ok);
        assert!(!report.diagnostics.document_found);
        assert_eq!(report.diagnostics.candidate_count, 80);
        assert_eq!(report.answers.len(), 20);
        for (row, mark) in marks.iter().enumerate() {
            let expected = letter(mark.expect("marked"));
            assert_eq!(report.answers.get(row as u32 + 1), Some(expected), "question {}", row + 1);
        }
    }

    #[test]
    fn sparse_sheet_gives_empty_map() {
        let spec = SheetLayoutSpec {
            rows: 4,
            ..SheetLayoutSpec::default()
        };
        let frame = gray_frame(&draw_answer_sheet(&spec, &cycling_marks(4, 0), BubbleStyle::ThickRing));

        let report = SheetScanner::default().scan(&frame);
        assert!(report.answers.is_empty());
        assert_eq!(report.diagnostics.status, ScanStatus::TooFewCandidates);
        assert_eq!(report.diagnostics.candidate_count, 16);
        assert!(report.layout.is_none());
    }

    #[test]
    fn three_blocks_number_one_to_sixty() {
        let spec = SheetLayoutSpec::default();
        let block_marks: Vec<Vec<Option<usize>>> = (0..3).map(|b| cycling_marks(20, b)).collect();
        let blocks: Vec<_> = block_marks
            .iter()
            .map(|m| draw_answer_sheet(&spec, m, BubbleStyle::ThickRing))
            .collect();
        let frame = gray_frame(&stack_vertically(&blocks));

        let report = SheetScanner::default().scan(&frame);
        assert_eq!(report.answers.len(), 60);
        for (block, marks) in block_marks.iter().enumerate() {
            for (row, mark) in marks.iter().enumerate() {
                let question = (block * 20 + row + 1) as u32;
                assert_eq!(
                    report.answers.get(question),
                    Some(letter(mark.expect("marked"))),
                    "question {question}"
                );
            }
        }
    }

    #[test]
    fn tied_marks_pick_the_left_most() {
        let spec = SheetLayoutSpec::default();
        let marks = cycling_marks(20, 2);
        let mut sheet = draw_answer_sheet(&spec, &marks, BubbleStyle::ThickRing);
        // Question 6 is marked B; ink D as well so both fills are 1.0.
        fill_bubble(&mut sheet, &spec, 5, 3, BubbleStyle::ThickRing);
        let frame = gray_frame(&sheet);

        let scanner = SheetScanner::default();
        for _ in 0..3 {
            let report = scanner.scan(&frame);
            assert_eq!(report.answers.get(6), Some(Answer::B));
        }
    }

    #[test]
    fn occluded_frame_falls_back_to_full_frame() {
        let mut gray = image::GrayImage::from_pixel(300, 400, Luma([40u8]));
        let triangle = [Point::new(30, 380), Point::new(150, 20), Point::new(270, 380)];
        draw_polygon_mut(&mut gray, &triangle, Luma([230u8]));
        let frame = gray_frame(&gray);

        let report = SheetScanner::default().scan(&frame);
        assert!(!report.diagnostics.document_found);
        assert_eq!(report.diagnostics.quadrilateral, Quadrilateral::full_frame(300, 400));
        assert_eq!(report.diagnostics.rectified_size, (300, 400));
        assert!(report.answers.is_empty());
    }

    /// Photograph a fully marked sheet on a `background` surface and check
    /// the scan decodes every row with no background left in the view.
    fn assert_photographed_sheet_decodes(background: u8, mode: DetectionMode) {
        let style = match mode {
            DetectionMode::Contour => BubbleStyle::ThickRing,
            DetectionMode::Strict => BubbleStyle::ThinRing,
        };
        let spec = SheetLayoutSpec::default();
        let marks = cycling_marks(20, 3);
        let sheet = draw_answer_sheet(&spec, &marks, style);
        let corners = [(70.0, 40.0), (330.0, 60.0), (320.0, 950.0), (60.0, 930.0)];
        let frame = photograph(&sheet, 400, 1000, corners, background);

        let config = ScanConfig {
            detection_mode: mode,
            ..ScanConfig::default()
        };
        let scan = SheetScanner::new(config).expect("config").scan_detailed(&frame);
        let report = &scan.report;
        let context = format!("background {background}, {mode:?}");
        assert!(report.diagnostics.document_found, "{context}");
        assert!(!report.diagnostics.rotated, "{context}");
        assert_eq!(report.diagnostics.status, ScanStatus::Ok, "{context}");

        let gray = &scan.rectified.gray;
        let (w, h) = gray.dimensions();
        let border = (0..w)
            .flat_map(|x| [(x, 0), (x, h - 1)])
            .chain((0..h).flat_map(|y| [(0, y), (w - 1, y)]));
        for (x, y) in border {
            assert!(gray.get_pixel(x, y)[0] > 127, "{context}: dark border at ({x}, {y})");
        }

        assert_eq!(report.answers.len(), 20, "{context}");
        for (row, mark) in marks.iter().enumerate() {
            assert_eq!(
                report.answers.get(row as u32 + 1),
                Some(letter(mark.expect("marked"))),
                "{context}: question {}",
                row + 1
            );
        }
        assert_eq!(scan.picks.len(), 20, "{context}");
    }

    #[test]
    fn photographed_sheet_is_rectified_and_decoded() {
        assert_photographed_sheet_decodes(140, DetectionMode::Contour);
    }

    #[test]
    fn photographed_sheet_on_dark_surface() {
        assert_photographed_sheet_decodes(40, DetectionMode::Contour);
        assert_photographed_sheet_decodes(40, DetectionMode::Strict);
    }

    #[test]
    fn photographed_sheet_on_mid_gray_surface() {
        assert_photographed_sheet_decodes(100, DetectionMode::Contour);
        assert_photographed_sheet_decodes(100, DetectionMode::Strict);
        assert_photographed_sheet_decodes(140, DetectionMode::Strict);
    }

    #[test]
    fn repeated_scans_are_identical() {
        let spec = SheetLayoutSpec::default();
        let sheet = draw_answer_sheet(&spec, &cycling_marks(20, 0), BubbleStyle::ThickRing);
        let corners = [(50.0, 30.0), (320.0, 45.0), (330.0, 940.0), (45.0, 925.0)];
        let frame = photograph(&sheet, 380, 980, corners, 150);

        let scanner = SheetScanner::default();
        assert_eq!(scanner.scan(&frame), scanner.scan(&frame));
    }

    #[test]
    fn strict_mode_reports_blank_rows() {
        let spec = SheetLayoutSpec::default();
        let mut marks = cycling_marks(20, 0);
        marks[4] = None;
        marks[11] = None;
        let frame = gray_frame(&draw_answer_sheet(&spec, &marks, BubbleStyle::ThinRing));

        let config = ScanConfig {
            detection_mode: DetectionMode::Strict,
            ..ScanConfig::default()
        };
        let report = SheetScanner::new(config).expect("config").scan(&frame);
        assert_eq!(report.answers.len(), 20);
        assert_eq!(report.answers.get(5), Some(Answer::Blank));
        assert_eq!(report.answers.get(12), Some(Answer::Blank));
        assert_eq!(report.answers.answered(), 18);
        assert_eq!(report.answers.get(1), Some(Answer::A));
    }

    #[test]
    fn empty_frame_is_not_an_error() {
        let frame = Frame::from_rgb(image::RgbImage::new(0, 0));
        let report = SheetScanner::default().scan(&frame);
        assert!(report.answers.is_empty());
        assert_eq!(report.diagnostics.status, ScanStatus::TooFewCandidates);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ScanConfig {
            max_options: 9,
            ..ScanConfig::default()
        };
        assert!(SheetScanner::new(config).is_err());
    }
}
