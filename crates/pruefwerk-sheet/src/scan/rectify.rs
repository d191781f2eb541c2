// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification: warps the located sheet to a top-down,
// portrait view.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use pruefwerk_core::Quadrilateral;
use tracing::{debug, info, instrument, warn};

use crate::image::Frame;

/// The sheet seen from straight above, in portrait orientation.
///
/// `gray` is derived from `color`, so the two align pixel for pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RectifiedDocument {
    pub color: RgbImage,
    pub gray: GrayImage,
    /// True when a landscape view was turned 90 degrees clockwise.
    pub rotated: bool,
}

impl RectifiedDocument {
    fn from_color(color: RgbImage) -> Self {
        let gray = image::imageops::grayscale(&color);
        Self {
            color,
            gray,
            rotated: false,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }
}

/// Rectifies a frame through a sheet quadrilateral.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerspectiveNormalizer;

impl PerspectiveNormalizer {
    /// Warp `quad` in `frame` to an upright rectangle, then force portrait.
    ///
    /// The output is as wide as the longer of the top and bottom edges and as
    /// tall as the longer of the left and right edges. A quadrilateral equal
    /// to the whole frame is copied without resampling. Degenerate
    /// quadrilaterals fall back to the unwarped frame.
    #[instrument(skip_all, fields(frame_w = frame.width(), frame_h = frame.height()))]
    pub fn rectify(&self, frame: &Frame, quad: &Quadrilateral) -> RectifiedDocument {
        let (frame_w, frame_h) = frame.dimensions();
        let (out_w, out_h) = target_size(quad);

        let document = if *quad == Quadrilateral::full_frame(frame_w, frame_h) {
            debug!("Quadrilateral covers the frame; copying without warp");
            RectifiedDocument::from_color(frame.as_rgb().clone())
        } else if out_w < 2 || out_h < 2 {
            warn!(out_w, out_h, "Degenerate quadrilateral; using the frame as-is");
            RectifiedDocument::from_color(frame.as_rgb().clone())
        } else {
            let (right, bottom) = ((out_w - 1) as f32, (out_h - 1) as f32);
            let dest: [(f32, f32); 4] = [
                (0.0, 0.0),      // top-left
                (right, 0.0),    // top-right
                (right, bottom), // bottom-right
                (0.0, bottom),   // bottom-left
            ];

            match Projection::from_control_points(quad.as_tuples(), dest) {
                Some(projection) => {
                    let default_pixel = Rgb([255u8, 255, 255]);
                    let mut output = RgbImage::new(out_w, out_h);
                    warp_into(
                        frame.as_rgb(),
                        &projection,
                        Interpolation::Bilinear,
                        default_pixel,
                        &mut output,
                    );
                    info!(out_w, out_h, "Perspective correction applied");
                    RectifiedDocument::from_color(output)
                }
                None => {
                    warn!("Failed to compute projective transform; using the frame as-is");
                    RectifiedDocument::from_color(frame.as_rgb().clone())
                }
            }
        };

        correct_orientation(document)
    }
}

/// Output size for a canonical quadrilateral: the longer horizontal edge by
/// the longer vertical edge, truncated to whole pixels.
pub fn target_size(quad: &Quadrilateral) -> (u32, u32) {
    let top = quad.top_left().distance(&quad.top_right());
    let bottom = quad.bottom_left().distance(&quad.bottom_right());
    let left = quad.top_left().distance(&quad.bottom_left());
    let right = quad.top_right().distance(&quad.bottom_right());

    let width = top.max(bottom);
    let height = left.max(right);
    (width as u32, height as u32)
}

/// Rotate a landscape view 90 degrees clockwise. Square views are kept.
fn correct_orientation(document: RectifiedDocument) -> RectifiedDocument {
    let (width, height) = document.dimensions();
    if width <= height {
        return document;
    }

    info!(width, height, "Landscape view; rotating to portrait");
    RectifiedDocument {
        color: image::imageops::rotate90(&document.color),
        gray: image::imageops::rotate90(&document.gray),
        rotated: true,
    }
}
