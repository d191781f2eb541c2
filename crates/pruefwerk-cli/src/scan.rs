// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `pruefwerk scan`: load a photograph, run the sheet pipeline and write the
// report plus any requested debug images.

use image::DynamicImage;
use pruefwerk_core::human_errors::{HumanError, humanize_status};
use pruefwerk_core::{Result, ScanConfig, ScanReport};
use pruefwerk_sheet::image::frame;
use pruefwerk_sheet::{Frame, SheetScanner, render_boundary, render_overlay};
use tracing::{info, instrument};

use crate::ScanArgs;

/// What a scan produced, for the caller to print.
#[derive(Debug)]
pub struct ScanOutcome {
    pub report: ScanReport,
    pub json: String,
    pub notice: Option<HumanError>,
}

/// Resolve the configuration for `args`: file first, then flag overrides.
pub fn resolve_config(args: &ScanArgs) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.detection_mode = mode.into();
    }
    Ok(config)
}

#[instrument(skip_all, fields(image = %args.image.display()))]
pub fn run(args: &ScanArgs) -> Result<ScanOutcome> {
    let scanner = SheetScanner::new(resolve_config(args)?)?;
    let frame = Frame::open(&args.image)?;

    let scan = scanner.scan_detailed(&frame);

    if let Some(path) = &args.overlay {
        frame::save(&DynamicImage::ImageRgb8(render_overlay(&scan)), path)?;
    }
    if let Some(path) = &args.rectified {
        frame::save(&DynamicImage::ImageRgb8(scan.rectified.color.clone()), path)?;
    }
    if let Some(path) = &args.boundary {
        let outline = render_boundary(&frame, &scan.report.diagnostics.quadrilateral);
        frame::save(&DynamicImage::ImageRgb8(outline), path)?;
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&scan.report)?
    } else {
        serde_json::to_string(&scan.report)?
    };
    if let Some(path) = &args.out {
        std::fs::write(path, &json)?;
        info!(path = %path.display(), "Report written");
    }

    Ok(ScanOutcome {
        notice: humanize_status(&scan.report.diagnostics),
        report: scan.report,
        json,
    })
}
