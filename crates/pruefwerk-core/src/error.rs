// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pruefwerk.
//
// Only the I/O edge can fail: decoding a photograph, reading a configuration
// file, writing a debug image. The sheet pipeline itself always produces a
// report.

use thiserror::Error;

/// Top-level error type for all Pruefwerk operations.
#[derive(Debug, Error)]
pub enum PruefwerkError {
    // -- Image errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("frame is empty ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PruefwerkError>;
