// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Debug overlays for checking a scan by eye.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use pruefwerk_core::Quadrilateral;

use crate::image::Frame;
use crate::pipeline::SheetScan;

const CANDIDATE: Rgb<u8> = Rgb([0, 160, 255]);
const UNMARKED: Rgb<u8> = Rgb([160, 160, 160]);
const ANSWER: Rgb<u8> = Rgb([0, 200, 0]);
const BLANK: Rgb<u8> = Rgb([230, 0, 0]);
const BOUNDARY: Rgb<u8> = Rgb([255, 0, 255]);

/// Rectified sheet with every candidate boxed and each row's winner dotted:
/// green for a decided answer, red for a blank.
pub fn render_overlay(scan: &SheetScan) -> RgbImage {
    let mut canvas = scan.rectified.color.clone();

    for candidate in &scan.candidates {
        let b = candidate.bbox;
        if b.width == 0 || b.height == 0 {
            continue;
        }
        let colour = if candidate.marked { CANDIDATE } else { UNMARKED };
        draw_hollow_rect_mut(
            &mut canvas,
            Rect::at(b.x as i32, b.y as i32).of_size(b.width, b.height),
            colour,
        );
    }

    for pick in &scan.picks {
        let colour = if pick.answer.is_blank() { BLANK } else { ANSWER };
        let centre = (pick.center.x.round() as i32, pick.center.y.round() as i32);
        draw_filled_circle_mut(&mut canvas, centre, 4, colour);
    }

    canvas
}

/// The input frame with the sheet quadrilateral outlined.
pub fn render_boundary(frame: &Frame, quad: &Quadrilateral) -> RgbImage {
    let mut canvas = frame.as_rgb().clone();
    let corners = quad.as_tuples();
    for i in 0..4 {
        draw_line_segment_mut(&mut canvas, corners[i], corners[(i + 1) % 4], BOUNDARY);
    }
    canvas
}
