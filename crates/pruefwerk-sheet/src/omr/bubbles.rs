// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bubble candidate detection on the rectified grayscale view.

use image::GrayImage;
use imageproc::geometry::contour_area;
use pruefwerk_core::config::{DetectionMode, ScanConfig};
use pruefwerk_core::{BoundingBox, BubbleCandidate};
use tracing::{debug, info, instrument};

use crate::scan::binarize::{adaptive_binarize_inverted, binarize_inverted, mean_intensity};
use crate::scan::contour::{
    Contour, bounding_box, circularity, external_contours, fill_ratio, perimeter,
};

/// Scans a rectified sheet for blobs shaped like answer bubbles.
#[derive(Debug, Clone, Copy)]
pub struct BubbleCandidateDetector<'a> {
    config: &'a ScanConfig,
}

/// Shape measurements of a contour that passed the size and shape gates.
struct BubbleShape<'c> {
    contour: &'c Contour,
    area: f64,
    circularity: f64,
    bbox: BoundingBox,
}

impl<'a> BubbleCandidateDetector<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    /// Detect candidates with the configured detection mode. Order follows
    /// contour tracing (raster order of each blob's first pixel).
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height(), mode = ?self.config.detection_mode))]
    pub fn detect(&self, gray: &GrayImage) -> Vec<BubbleCandidate> {
        let candidates = match self.config.detection_mode {
            DetectionMode::Contour => self.detect_inked(gray),
            DetectionMode::Strict => self.detect_strict(gray),
        };
        info!(count = candidates.len(), "Bubble candidates detected");
        candidates
    }

    /// Fixed-threshold scan that admits only blobs with enough ink to be a
    /// mark. Unmarked bubbles are not returned.
    pub fn detect_inked(&self, gray: &GrayImage) -> Vec<BubbleCandidate> {
        let binary = binarize_inverted(gray, self.config.binary_level);
        let contours = external_contours(&binary);
        debug!(contour_count = contours.len(), "External contours traced");

        let mut candidates = Vec::new();
        for contour in &contours {
            let Some(shape) = self.measure(contour) else {
                continue;
            };

            let fill = fill_ratio(&binary, shape.contour, &shape.bbox);
            if fill <= self.config.fill_admission {
                continue;
            }

            candidates.push(BubbleCandidate {
                center: shape.bbox.center(),
                area: shape.area,
                fill_ratio: fill,
                circularity: shape.circularity,
                bbox: shape.bbox,
                marked: true,
                confidence: fill,
            });
        }
        candidates
    }

    /// Adaptive-threshold scan that returns every bubble, marked or not.
    ///
    /// A bubble is marked only when both its dark-pixel ratio and its mean
    /// intensity (against the sheet's overall brightness) say so.
    pub fn detect_strict(&self, gray: &GrayImage) -> Vec<BubbleCandidate> {
        let strict = &self.config.strict;
        let binary = adaptive_binarize_inverted(gray, strict.block_radius, strict.offset);
        let contours = external_contours(&binary);

        let global_mean = mean_intensity(gray);
        let intensity_threshold = global_mean * strict.intensity_factor;
        let (min_area, max_area) = (
            std::f64::consts::PI * strict.min_radius * strict.min_radius,
            std::f64::consts::PI * strict.max_radius * strict.max_radius,
        );
        debug!(
            contour_count = contours.len(),
            global_mean, intensity_threshold, "Strict scan prepared"
        );

        let mut candidates = Vec::new();
        for contour in &contours {
            let Some(shape) = self.measure(contour) else {
                continue;
            };
            if shape.area < min_area || shape.area > max_area {
                continue;
            }

            let center = shape.bbox.center();
            let radius = contour
                .iter()
                .map(|p| ((p.x as f32 - center.x).powi(2) + (p.y as f32 - center.y).powi(2)).sqrt())
                .fold(0.0f32, f32::max);
            let stats = disc_stats(gray, center.x, center.y, radius, strict.dark_level);
            if stats.count == 0 {
                continue;
            }

            let marked = stats.dark_ratio > strict.dark_ratio && stats.mean < intensity_threshold;
            let darkness = 1.0 - stats.mean / 255.0;
            let uniformity = 1.0 - (stats.stddev / 128.0).min(1.0);
            let confidence = (darkness * 0.7 + uniformity * 0.3).clamp(0.0, 1.0);

            candidates.push(BubbleCandidate {
                center,
                area: shape.area,
                fill_ratio: stats.dark_ratio,
                circularity: shape.circularity,
                bbox: shape.bbox,
                marked,
                confidence,
            });
        }
        candidates
    }

    /// Apply the area, circularity and aspect-ratio gates.
    fn measure<'c>(&self, contour: &'c Contour) -> Option<BubbleShape<'c>> {
        let area = contour_area(contour);
        if area < self.config.bubble_min_area {
            return None;
        }

        let circularity = circularity(area, perimeter(contour));
        let (c_lo, c_hi) = self.config.circularity_band;
        if !(circularity > c_lo && circularity < c_hi) {
            return None;
        }

        let bbox = bounding_box(contour);
        let aspect = bbox.aspect_ratio();
        let (a_lo, a_hi) = self.config.aspect_ratio_band;
        if !(aspect > a_lo && aspect < a_hi) {
            return None;
        }

        Some(BubbleShape {
            contour,
            area,
            circularity,
            bbox,
        })
    }
}

/// Intensity statistics over a disc of the grayscale view.
struct DiscStats {
    count: u64,
    mean: f64,
    stddev: f64,
    dark_ratio: f64,
}

fn disc_stats(gray: &GrayImage, cx: f32, cy: f32, radius: f32, dark_level: u8) -> DiscStats {
    let r2 = radius * radius;
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil().max(0.0) as u32).min(gray.width().saturating_sub(1));
    let y1 = ((cy + radius).ceil().max(0.0) as u32).min(gray.height().saturating_sub(1));

    let (mut count, mut sum, mut sum_sq, mut dark) = (0u64, 0f64, 0f64, 0u64);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (dx, dy) = (x as f32 - cx, y as f32 - cy);
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let v = gray.get_pixel(x, y).0[0];
            count += 1;
            sum += v as f64;
            sum_sq += (v as f64) * (v as f64);
            if v < dark_level {
                dark += 1;
            }
        }
    }

    if count == 0 {
        return DiscStats {
            count,
            mean: 0.0,
            stddev: 0.0,
            dark_ratio: 0.0,
        };
    }
    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
    DiscStats {
        count,
        mean,
        stddev: variance.sqrt(),
        dark_ratio: dark as f64 / count as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    use crate::test_support::{BubbleStyle, SheetLayoutSpec, draw_answer_sheet};

    fn paper(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([245u8]))
    }

    #[test]
    fn solid_and_thick_ring_bubbles_are_admitted() {
        let mut gray = paper(120, 60);
        draw_filled_circle_mut(&mut gray, (30, 30), 12, Luma([20u8]));
        draw_filled_circle_mut(&mut gray, (90, 30), 12, Luma([20u8]));
        draw_filled_circle_mut(&mut gray, (90, 30), 7, Luma([245u8]));

        let config = ScanConfig::default();
        let candidates = BubbleCandidateDetector::new(&config).detect(&gray);
        assert_eq!(candidates.len(), 2);
        let solid = candidates.iter().find(|c| c.center.x < 60.0).expect("solid");
        let ring = candidates.iter().find(|c| c.center.x > 60.0).expect("ring");
        assert!((solid.fill_ratio - 1.0).abs() < 1e-9);
        assert!(ring.fill_ratio > 0.4 && ring.fill_ratio < solid.fill_ratio);
        assert!(candidates.iter().all(|c| c.marked));
    }

    #[test]
    fn thin_outline_is_not_a_candidate() {
        let mut gray = paper(80, 80);
        draw_filled_circle_mut(&mut gray, (40, 40), 14, Luma([20u8]));
        draw_filled_circle_mut(&mut gray, (40, 40), 12, Luma([245u8]));

        let config = ScanConfig::default();
        assert!(BubbleCandidateDetector::new(&config).detect(&gray).is_empty());
    }

    #[test]
    fn small_and_elongated_blobs_are_rejected() {
        let mut gray = paper(200, 80);
        // Too small: area well under 100.
        draw_filled_circle_mut(&mut gray, (20, 40), 4, Luma([10u8]));
        // Text stroke.
        draw_filled_rect_mut(&mut gray, Rect::at(50, 35).of_size(60, 6), Luma([10u8]));
        // Tall oval-ish box: aspect ratio 0.5.
        draw_filled_rect_mut(&mut gray, Rect::at(150, 10).of_size(20, 40), Luma([10u8]));

        let config = ScanConfig::default();
        assert!(BubbleCandidateDetector::new(&config).detect(&gray).is_empty());
    }

    #[test]
    fn candidates_respect_measurement_bounds() {
        let spec = SheetLayoutSpec::default();
        let marks: Vec<Option<usize>> = (0..20).map(|i| Some(i % 4)).collect();
        for (mode, style) in [
            (DetectionMode::Contour, BubbleStyle::ThickRing),
            (DetectionMode::Strict, BubbleStyle::ThinRing),
        ] {
            let gray = draw_answer_sheet(&spec, &marks, style);
            let config = ScanConfig {
                detection_mode: mode,
                ..ScanConfig::default()
            };
            let candidates = BubbleCandidateDetector::new(&config).detect(&gray);
            assert!(!candidates.is_empty());
            for c in &candidates {
                assert!((0.0..=1.0).contains(&c.fill_ratio), "fill {}", c.fill_ratio);
                assert!(c.circularity > 0.5 && c.circularity < 1.2, "circ {}", c.circularity);
                assert!((0.0..=1.0).contains(&c.confidence));
            }
        }
    }

    #[test]
    fn strict_mode_returns_unmarked_bubbles_too() {
        let spec = SheetLayoutSpec::default();
        let mut marks: Vec<Option<usize>> = vec![None; 20];
        marks[0] = Some(2);
        let gray = draw_answer_sheet(&spec, &marks, BubbleStyle::ThinRing);

        let config = ScanConfig {
            detection_mode: DetectionMode::Strict,
            ..ScanConfig::default()
        };
        let candidates = BubbleCandidateDetector::new(&config).detect(&gray);
        assert_eq!(candidates.len(), 80);
        assert_eq!(candidates.iter().filter(|c| c.marked).count(), 1);
    }
}
