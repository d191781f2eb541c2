// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pruefwerk answer-sheet reader.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in image coordinates (x to the right, y downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// The four corners of a sheet as seen in a photograph.
///
/// Always stored as `[top_left, top_right, bottom_right, bottom_left]`. The
/// order is derived from the coordinates alone: the two points with the
/// smallest y form the top edge, and each pair is split by x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    corners: [Point; 4],
}

impl Quadrilateral {
    /// Canonicalize four points in any traversal order.
    pub fn from_points(points: [Point; 4]) -> Self {
        let mut sorted = points;
        sorted.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        let (mut top, mut bottom) = ([sorted[0], sorted[1]], [sorted[2], sorted[3]]);
        top.sort_by(|a, b| a.x.total_cmp(&b.x));
        bottom.sort_by(|a, b| a.x.total_cmp(&b.x));
        Self {
            corners: [top[0], top[1], bottom[1], bottom[0]],
        }
    }

    /// The quadrilateral covering a whole `width` x `height` frame.
    pub fn full_frame(width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            corners: [
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(w, h),
                Point::new(0.0, h),
            ],
        }
    }

    pub fn corners(&self) -> [Point; 4] {
        self.corners
    }

    pub fn top_left(&self) -> Point {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.corners[3]
    }

    /// Corners as `(x, y)` tuples in canonical order.
    pub fn as_tuples(&self) -> [(f32, f32); 4] {
        self.corners.map(|p| (p.x, p.y))
    }

    /// Move every edge `distance` pixels towards the interior and return the
    /// quadrilateral formed by the shifted edges.
    ///
    /// Returns `self` unchanged when `distance` is not positive, when an edge
    /// is shorter than twice the distance, or when two shifted edges are
    /// parallel.
    pub fn inset(&self, distance: f32) -> Self {
        if distance.is_nan() || distance <= 0.0 {
            return *self;
        }
        let c = self.corners;
        let mut lines = [(Point::new(0.0, 0.0), Point::new(0.0, 0.0)); 4];
        for i in 0..4 {
            let (a, b) = (c[i], c[(i + 1) % 4]);
            let len = a.distance(&b);
            if len <= 2.0 * distance {
                return *self;
            }
            let dir = Point::new((b.x - a.x) / len, (b.y - a.y) / len);
            // Clockwise on screen, so the interior is to the right of travel.
            let normal = Point::new(-dir.y, dir.x);
            let origin = Point::new(a.x + normal.x * distance, a.y + normal.y * distance);
            lines[i] = (origin, dir);
        }

        let mut corners = c;
        for (i, corner) in corners.iter_mut().enumerate() {
            let (p, v) = lines[(i + 3) % 4];
            let (q, w) = lines[i];
            let denom = v.x * w.y - v.y * w.x;
            if denom.abs() < 1e-6 {
                return *self;
            }
            let t = ((q.x - p.x) * w.y - (q.y - p.y) * w.x) / denom;
            *corner = Point::new(p.x + v.x * t, p.y + v.y * t);
        }
        Self { corners }
    }
}

/// Axis-aligned pixel rectangle; `width` and `height` count pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

/// A blob that looks like an answer bubble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleCandidate {
    pub center: Point,
    /// Contour area in square pixels.
    pub area: f64,
    /// Fraction of the blob's interior that is ink, in [0, 1].
    pub fill_ratio: f64,
    pub circularity: f64,
    pub bbox: BoundingBox,
    /// Whether the detector considers this bubble filled in.
    pub marked: bool,
    /// Markedness score in [0, 1].
    pub confidence: f64,
}

/// One horizontal band of bubbles, ideally one question's options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// y of the member that opened the row.
    pub anchor_y: f32,
    /// Members sorted left to right.
    pub members: Vec<BubbleCandidate>,
}

impl Row {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Whole-sheet layout inferred from the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Options per question (most common row length, at most 4).
    pub option_count: usize,
    pub row_count: usize,
}

/// The decoded answer for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    A,
    B,
    C,
    D,
    /// No confident mark.
    #[serde(rename = "blank")]
    Blank,
}

impl Answer {
    /// Option letter at a left-to-right position, if there is one.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            3 => Some(Self::D),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::Blank => "blank",
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question number to decoded answer, ordered by question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<u32, Answer>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question: u32, answer: Answer) -> Option<Answer> {
        self.0.insert(question, answer)
    }

    pub fn get(&self, question: u32) -> Option<Answer> {
        self.0.get(&question).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Answer)> + '_ {
        self.0.iter().map(|(q, a)| (*q, *a))
    }

    /// Number of questions with an actual letter.
    pub fn answered(&self) -> usize {
        self.0.values().filter(|a| !a.is_blank()).count()
    }
}

impl FromIterator<(u32, Answer)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (u32, Answer)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Overall outcome of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// At least one row was decoded.
    Ok,
    /// Too few bubble candidates to be a real grid.
    TooFewCandidates,
    /// Enough candidates, but no row matched the inferred option count.
    NoRowsDecoded,
}

/// Side-channel information about how a scan went. Not part of the answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub status: ScanStatus,
    /// SHA-256 of the input frame's pixels, lowercase hex.
    pub frame_digest: String,
    pub frame_size: (u32, u32),
    /// False when the full frame was used as the sheet.
    pub document_found: bool,
    pub quadrilateral: Quadrilateral,
    /// True when the rectified view was turned to portrait.
    pub rotated: bool,
    pub rectified_size: (u32, u32),
    pub candidate_count: usize,
    pub row_count: usize,
    pub option_count: Option<usize>,
    /// Rows skipped because their length differed from the option count.
    pub dropped_rows: usize,
}

/// Everything a scan produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub answers: AnswerMap,
    pub layout: Option<SheetLayout>,
    pub diagnostics: Diagnostics,
}
