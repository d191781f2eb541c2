// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan configuration. Every numeric threshold the pipeline uses lives here
// under a name, so it can be tuned and tested apart from the algorithms.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PruefwerkError, Result};

/// Default values of the numeric contract.
pub mod defaults {
    /// Minimum contour area when searching for the sheet boundary.
    pub const DOCUMENT_MIN_AREA: f64 = 1000.0;
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub const POLY_APPROX_EPSILON: f64 = 0.02;
    /// Minimum contour area when searching for bubbles.
    pub const BUBBLE_MIN_AREA: f64 = 100.0;
    /// Open circularity band `(min, max)`.
    pub const CIRCULARITY_BAND: (f64, f64) = (0.5, 1.2);
    /// Open bounding-box aspect-ratio band `(min, max)`.
    pub const ASPECT_RATIO_BAND: (f64, f64) = (0.8, 1.2);
    /// A blob becomes a candidate only above this fill ratio.
    pub const FILL_ADMISSION: f64 = 0.4;
    /// A row winner counts as marked only above this fill ratio.
    pub const FILL_DECISION: f64 = 0.3;
    /// Fewer candidates than this means the photo is unusable.
    pub const MIN_CANDIDATES: usize = 20;
    /// Row tolerance is `floor(sqrt(avg area) * ROW_TOLERANCE_FACTOR)`.
    pub const ROW_TOLERANCE_FACTOR: f64 = 0.7;
    /// Inclusive surviving-row range that triggers the column remap.
    pub const REMAP_ROW_RANGE: (usize, usize) = (15, 25);
    /// Number of side-by-side column blocks assumed by the remap.
    pub const COLUMN_BLOCKS: usize = 3;
    /// Highest question number a sheet can carry.
    pub const MAX_QUESTION: u32 = 60;
    /// Option letters available (A-D).
    pub const MAX_OPTIONS: usize = 4;
    /// Fixed gray level separating ink from paper in the contour detector.
    pub const BUBBLE_BINARY_LEVEL: u8 = 127;
}

/// Which bubble detector the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Fixed-threshold contour scan that only admits inked blobs.
    #[default]
    Contour,
    /// Adaptive-threshold scan that returns every bubble and classifies
    /// marks with both a dark-pixel ratio and a mean-intensity test.
    Strict,
}

/// Settings for the sheet-boundary search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Extra Gaussian blur before edge detection; 0 disables it. Canny
    /// already smooths with sigma 1.4.
    pub blur_sigma: f32,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Dilation radius (L-infinity) used to close gaps in the boundary.
    pub dilate_radius: u8,
    /// Erosion radius applied after dilation.
    pub erode_radius: u8,
    pub min_area: f64,
    pub approx_epsilon: f64,
    /// Pixels each edge of the located boundary is pulled inwards. The
    /// closed edge band sits outside the paper, so without this the
    /// rectified view keeps a strip of background.
    pub boundary_inset: f32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 0.0,
            canny_low: 75.0,
            canny_high: 200.0,
            // Two passes of a 5x5 kernel, then one.
            dilate_radius: 4,
            erode_radius: 2,
            min_area: defaults::DOCUMENT_MIN_AREA,
            approx_epsilon: defaults::POLY_APPROX_EPSILON,
            boundary_inset: 5.0,
        }
    }
}

/// Settings for the adaptive-threshold bubble classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrictConfig {
    /// Half-size of the local-mean window (5 gives an 11x11 block).
    pub block_radius: u32,
    /// Constant subtracted from the local mean.
    pub offset: i32,
    /// Enclosing-circle radius range in pixels.
    pub min_radius: f64,
    pub max_radius: f64,
    /// Pixels below this gray level count as dark.
    pub dark_level: u8,
    /// Minimum fraction of dark pixels for a mark.
    pub dark_ratio: f64,
    /// Mark mean intensity must fall below `global mean * intensity_factor`.
    pub intensity_factor: f64,
}

impl Default for StrictConfig {
    fn default() -> Self {
        Self {
            block_radius: 5,
            offset: 2,
            min_radius: 10.0,
            max_radius: 30.0,
            dark_level: 128,
            dark_ratio: 0.5,
            intensity_factor: 0.85,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub locator: LocatorConfig,
    pub detection_mode: DetectionMode,
    pub strict: StrictConfig,
    /// Gray level at or below which a pixel is ink (contour detector).
    pub binary_level: u8,
    pub bubble_min_area: f64,
    pub circularity_band: (f64, f64),
    pub aspect_ratio_band: (f64, f64),
    pub fill_admission: f64,
    pub fill_decision: f64,
    pub min_candidates: usize,
    pub row_tolerance_factor: f64,
    pub max_options: usize,
    pub remap_row_range: (usize, usize),
    pub column_blocks: usize,
    pub max_question: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            locator: LocatorConfig::default(),
            detection_mode: DetectionMode::default(),
            strict: StrictConfig::default(),
            binary_level: defaults::BUBBLE_BINARY_LEVEL,
            bubble_min_area: defaults::BUBBLE_MIN_AREA,
            circularity_band: defaults::CIRCULARITY_BAND,
            aspect_ratio_band: defaults::ASPECT_RATIO_BAND,
            fill_admission: defaults::FILL_ADMISSION,
            fill_decision: defaults::FILL_DECISION,
            min_candidates: defaults::MIN_CANDIDATES,
            row_tolerance_factor: defaults::ROW_TOLERANCE_FACTOR,
            max_options: defaults::MAX_OPTIONS,
            remap_row_range: defaults::REMAP_ROW_RANGE,
            column_blocks: defaults::COLUMN_BLOCKS,
            max_question: defaults::MAX_QUESTION,
        }
    }
}

impl ScanConfig {
    /// Load a JSON configuration file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let band_ok = |(lo, hi): (f64, f64)| lo.is_finite() && hi.is_finite() && lo < hi;
        if !band_ok(self.circularity_band) {
            return Err(PruefwerkError::Config(format!(
                "circularity band {:?} is empty",
                self.circularity_band
            )));
        }
        if !band_ok(self.aspect_ratio_band) {
            return Err(PruefwerkError::Config(format!(
                "aspect-ratio band {:?} is empty",
                self.aspect_ratio_band
            )));
        }
        for (name, value) in [
            ("fill_admission", self.fill_admission),
            ("fill_decision", self.fill_decision),
            ("strict.dark_ratio", self.strict.dark_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PruefwerkError::Config(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if self.max_options == 0 || self.max_options > defaults::MAX_OPTIONS {
            return Err(PruefwerkError::Config(format!(
                "max_options must be 1..={}, got {}",
                defaults::MAX_OPTIONS,
                self.max_options
            )));
        }
        if self.column_blocks == 0 {
            return Err(PruefwerkError::Config("column_blocks must be positive".into()));
        }
        if self.remap_row_range.0 > self.remap_row_range.1 {
            return Err(PruefwerkError::Config(format!(
                "remap row range {:?} is inverted",
                self.remap_row_range
            )));
        }
        if self.locator.canny_low > self.locator.canny_high {
            return Err(PruefwerkError::Config(
                "canny_low must not exceed canny_high".into(),
            ));
        }
        for (name, value) in [
            ("locator.blur_sigma", self.locator.blur_sigma),
            ("locator.boundary_inset", self.locator.boundary_inset),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PruefwerkError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.strict.min_radius > self.strict.max_radius {
            return Err(PruefwerkError::Config(
                "strict.min_radius must not exceed strict.max_radius".into(),
            ));
        }
        Ok(())
    }
}
