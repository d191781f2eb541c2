// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet boundary search: finds the four corners of the answer sheet in a
// raw photograph.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::contour_area;
use imageproc::morphology::{dilate, erode};
use pruefwerk_core::config::LocatorConfig;
use pruefwerk_core::{Point, Quadrilateral};
use tracing::{debug, info, instrument, warn};

use crate::image::Frame;
use crate::scan::contour::{approximate_closed, external_contours, perimeter};

/// Finds the sheet as the largest four-cornered outline in a photo.
#[derive(Debug, Clone, Default)]
pub struct DocumentLocator {
    config: LocatorConfig,
}

impl DocumentLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Locate the sheet boundary.
    ///
    /// ## Pipeline
    ///
    /// 1. Convert to grayscale
    /// 2. Optional extra blur (off by default; Canny smooths on its own)
    /// 3. Canny edge detection
    /// 4. Dilate then erode to close gaps in the boundary
    /// 5. Trace external contours
    /// 6. Drop contours under the minimum area
    /// 7. Simplify each survivor at 2% of its perimeter; keep 4-vertex ones
    /// 8. Take the largest by contour area
    /// 9. Pull its edges inwards by `boundary_inset` so the corners sit on
    ///    the paper rather than on the outside of the closed edge band
    ///
    /// Returns `None` when no contour qualifies; the caller then treats the
    /// whole frame as the sheet.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn locate(&self, frame: &Frame) -> Option<Quadrilateral> {
        let gray = frame.to_gray();
        let closed = self.edge_map(&gray);

        let contours = external_contours(&closed);
        debug!(contour_count = contours.len(), "External contours traced");

        let mut best: Option<(f64, Quadrilateral)> = None;
        for contour in &contours {
            let area = contour_area(contour);
            if area < self.config.min_area {
                continue;
            }

            let epsilon = self.config.approx_epsilon * perimeter(contour);
            let approx = approximate_closed(contour, epsilon);
            if approx.len() != 4 {
                continue;
            }

            if best.as_ref().is_none_or(|(best_area, _)| area > *best_area) {
                let corners = [0, 1, 2, 3].map(|i| Point::new(approx[i].x as f32, approx[i].y as f32));
                best = Some((area, Quadrilateral::from_points(corners)));
            }
        }

        match best {
            Some((area, outline)) => {
                let quad = outline.inset(self.config.boundary_inset);
                info!(
                    area,
                    top_left = ?quad.top_left(),
                    bottom_right = ?quad.bottom_right(),
                    inset = self.config.boundary_inset,
                    "Sheet boundary found"
                );
                Some(quad)
            }
            None => {
                warn!("No four-cornered contour above the area floor; no sheet found");
                None
            }
        }
    }

    /// Edge-detected and morphologically closed view of `gray`.
    fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        let blurred = if self.config.blur_sigma > 0.0 {
            gaussian_blur_f32(gray, self.config.blur_sigma)
        } else {
            gray.clone()
        };
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);

        let mut closed = edges;
        if self.config.dilate_radius > 0 {
            closed = dilate(&closed, Norm::LInf, self.config.dilate_radius);
        }
        if self.config.erode_radius > 0 {
            closed = erode(&closed, Norm::LInf, self.config.erode_radius);
        }
        closed
    }
}
