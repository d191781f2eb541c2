// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic frames and answer sheets for unit tests.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::point::Point;
use pruefwerk_core::{BoundingBox, BubbleCandidate};

use crate::image::Frame;

pub const PAPER: u8 = 245;
pub const INK: u8 = 20;

pub fn solid_frame(width: u32, height: u32, value: u8) -> Frame {
    Frame::from_rgb(RgbImage::from_pixel(width, height, Rgb([value; 3])))
}

/// A `bg` frame with a `paper` quadrilateral painted on it.
pub fn frame_with_quad(width: u32, height: u32, corners: [(f32, f32); 4], bg: u8, paper: u8) -> Frame {
    paint_quad(&solid_frame(width, height, bg), corners, paper)
}

pub fn paint_quad(frame: &Frame, corners: [(f32, f32); 4], value: u8) -> Frame {
    let mut image = frame.as_rgb().clone();
    let poly: Vec<Point<i32>> = corners
        .iter()
        .map(|&(x, y)| Point::new(x.round() as i32, y.round() as i32))
        .collect();
    draw_polygon_mut(&mut image, &poly, Rgb([value; 3]));
    Frame::from_rgb(image)
}

/// A hand-built candidate with a 20x20 box (area 400).
pub fn candidate_at(x: f32, y: f32, fill: f64) -> BubbleCandidate {
    BubbleCandidate {
        center: pruefwerk_core::Point::new(x, y),
        area: 400.0,
        fill_ratio: fill,
        circularity: 0.85,
        bbox: BoundingBox {
            x: (x - 10.0).max(0.0) as u32,
            y: (y - 10.0).max(0.0) as u32,
            width: 20,
            height: 20,
        },
        marked: true,
        confidence: fill,
    }
}

/// How unmarked bubbles are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleStyle {
    /// r=12 outline, 5 px wide. Inked enough to pass contour admission.
    ThickRing,
    /// r=14 outline, 3 px wide. Only the strict detector sees these.
    ThinRing,
}

impl BubbleStyle {
    fn radii(self) -> (i32, i32) {
        match self {
            BubbleStyle::ThickRing => (12, 7),
            BubbleStyle::ThinRing => (14, 11),
        }
    }
}

/// Geometry of a synthetic single-column sheet.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayoutSpec {
    pub rows: usize,
    pub options: usize,
    pub row_pitch: u32,
    pub option_pitch: u32,
    pub margin: u32,
}

impl Default for SheetLayoutSpec {
    fn default() -> Self {
        Self {
            rows: 20,
            options: 4,
            row_pitch: 40,
            option_pitch: 50,
            margin: 40,
        }
    }
}

impl SheetLayoutSpec {
    pub fn size(&self) -> (u32, u32) {
        (
            2 * self.margin + (self.options as u32 - 1) * self.option_pitch,
            2 * self.margin + (self.rows as u32 - 1) * self.row_pitch,
        )
    }

    pub fn centre(&self, row: usize, option: usize) -> (i32, i32) {
        (
            (self.margin + option as u32 * self.option_pitch) as i32,
            (self.margin + row as u32 * self.row_pitch) as i32,
        )
    }
}

/// Draw a sheet with one filled bubble per row where `marks[row]` is set.
pub fn draw_answer_sheet(spec: &SheetLayoutSpec, marks: &[Option<usize>], style: BubbleStyle) -> GrayImage {
    let (w, h) = spec.size();
    let mut gray = GrayImage::from_pixel(w, h, Luma([PAPER]));
    let (outer, inner) = style.radii();
    for row in 0..spec.rows {
        for option in 0..spec.options {
            let centre = spec.centre(row, option);
            draw_filled_circle_mut(&mut gray, centre, outer, Luma([INK]));
            if marks.get(row).copied().flatten() != Some(option) {
                draw_filled_circle_mut(&mut gray, centre, inner, Luma([PAPER]));
            }
        }
    }
    gray
}

/// Ink in one more bubble.
pub fn fill_bubble(gray: &mut GrayImage, spec: &SheetLayoutSpec, row: usize, option: usize, style: BubbleStyle) {
    draw_filled_circle_mut(gray, spec.centre(row, option), style.radii().0, Luma([INK]));
}

/// Stack sheets top to bottom on one page.
pub fn stack_vertically(blocks: &[GrayImage]) -> GrayImage {
    let width = blocks.iter().map(|b| b.width()).max().unwrap_or(0);
    let height = blocks.iter().map(|b| b.height()).sum();
    let mut page = GrayImage::from_pixel(width, height, Luma([PAPER]));
    let mut y = 0i64;
    for block in blocks {
        image::imageops::replace(&mut page, block, 0, y);
        y += block.height() as i64;
    }
    page
}

pub fn gray_frame(gray: &GrayImage) -> Frame {
    Frame::from_dynamic(DynamicImage::ImageLuma8(gray.clone()))
}

/// Photograph `sheet` at an angle: warp it onto `corners` (tl, tr, br, bl)
/// of a `bg` frame.
pub fn photograph(sheet: &GrayImage, width: u32, height: u32, corners: [(f32, f32); 4], bg: u8) -> Frame {
    let color = DynamicImage::ImageLuma8(sheet.clone()).to_rgb8();
    let (right, bottom) = ((sheet.width() - 1) as f32, (sheet.height() - 1) as f32);
    let source = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];
    let mut out = RgbImage::from_pixel(width, height, Rgb([bg; 3]));
    if let Some(projection) = Projection::from_control_points(source, corners) {
        warp_into(&color, &projection, Interpolation::Bilinear, Rgb([bg; 3]), &mut out);
    }
    Frame::from_rgb(out)
}
