// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour geometry shared by the sheet locator and the bubble detectors:
// outer-border extraction, perimeter, polygon simplification, and
// filled-contour masks. Areas come from `imageproc::geometry::contour_area`.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::drawing::draw_polygon_mut;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use pruefwerk_core::BoundingBox;

/// A traced border, as pixel coordinates.
pub type Contour = Vec<Point<i32>>;

/// Outer borders of the foreground components that are not nested inside
/// any other component.
pub fn external_contours(binary: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Length of the closed contour.
pub fn perimeter(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    arc_length(points, true)
}

/// Shape roundness, `4 * pi * area / perimeter^2`; 1 for a perfect circle.
pub fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
}

/// Inclusive pixel bounding box of a non-empty contour.
pub fn bounding_box(points: &[Point<i32>]) -> BoundingBox {
    let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
    let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if points.is_empty() {
        return BoundingBox {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    }
    BoundingBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    }
}

/// Simplify a closed contour with Douglas-Peucker at `epsilon` pixels.
///
/// The contour is split at its first point and the point farthest from it,
/// each half is simplified as an open curve, and the halves are joined, so
/// the returned polygon has no repeated vertex.
pub fn approximate_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let start = points[0];
    let dist2 = |p: &Point<i32>| {
        let (dx, dy) = ((p.x - start.x) as i64, (p.y - start.y) as i64);
        dx * dx + dy * dy
    };
    let mut far = 0;
    for (i, p) in points.iter().enumerate() {
        if dist2(p) > dist2(&points[far]) {
            far = i;
        }
    }
    if far == 0 {
        return vec![start];
    }

    let first = approximate_polygon_dp(&points[..=far], epsilon, false);
    let mut second_half: Vec<Point<i32>> = points[far..].to_vec();
    second_half.push(start);
    let second = approximate_polygon_dp(&second_half, epsilon, false);

    let mut polygon = first;
    // `second` starts at the far point and ends at the start point, both of
    // which are already in `first`.
    if second.len() > 2 {
        polygon.extend_from_slice(&second[1..second.len() - 1]);
    }
    polygon
}

/// Fraction of the contour's filled interior that is foreground in `binary`.
///
/// The mask is the contour polygon filled, borders included, restricted to
/// `bbox`. Returns a value in [0, 1].
pub fn fill_ratio(binary: &GrayImage, points: &[Point<i32>], bbox: &BoundingBox) -> f64 {
    if points.is_empty() || bbox.width == 0 || bbox.height == 0 {
        return 0.0;
    }

    let mut mask = GrayImage::new(bbox.width, bbox.height);
    let mut local: Vec<Point<i32>> = points
        .iter()
        .map(|p| Point::new(p.x - bbox.x as i32, p.y - bbox.y as i32))
        .collect();
    // The polygon rasterizer rejects a closing vertex equal to the first.
    while local.len() > 1 && local.first() == local.last() {
        local.pop();
    }
    if local.len() >= 3 {
        draw_polygon_mut(&mut mask, &local, Luma([255u8]));
    }
    for p in &local {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < bbox.width && (p.y as u32) < bbox.height {
            mask.put_pixel(p.x as u32, p.y as u32, Luma([255u8]));
        }
    }

    let (mut inside, mut ink) = (0u64, 0u64);
    for (x, y, m) in mask.enumerate_pixels() {
        if m.0[0] == 0 {
            continue;
        }
        let (gx, gy) = (bbox.x + x, bbox.y + y);
        if gx >= binary.width() || gy >= binary.height() {
            continue;
        }
        inside += 1;
        if binary.get_pixel(gx, gy).0[0] > 0 {
            ink += 1;
        }
    }

    if inside == 0 {
        return 0.0;
    }
    ink as f64 / inside as f64
}
