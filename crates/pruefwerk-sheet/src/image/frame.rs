// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame: the immutable photograph a scan starts from. Decodes any format the
// `image` crate understands and normalises it to 3-channel RGB.

use image::{DynamicImage, GrayImage, RgbImage};
use pruefwerk_core::error::PruefwerkError;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

/// A captured photograph of an answer sheet.
///
/// Stages never modify a frame; they read from it and build their own
/// buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    // -- Construction ---------------------------------------------------------

    /// Load a frame from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, PruefwerkError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            PruefwerkError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Frame loaded");
        Self::non_empty(img)
    }

    /// Decode a frame from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PruefwerkError> {
        let img = image::load_from_memory(data).map_err(|err| {
            PruefwerkError::ImageError(format!("failed to decode frame: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Frame decoded from bytes"
        );
        Self::non_empty(img)
    }

    /// Wrap an already-decoded `DynamicImage`, converting it to RGB.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image: image.to_rgb8(),
        }
    }

    /// Wrap an RGB buffer.
    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image }
    }

    fn non_empty(image: DynamicImage) -> Result<Self, PruefwerkError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PruefwerkError::EmptyFrame {
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(Self::from_dynamic(image))
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// Borrow the RGB pixels.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    /// A fresh single-channel copy of the frame.
    pub fn to_gray(&self) -> GrayImage {
        image::imageops::grayscale(&self.image)
    }

    /// SHA-256 over the dimensions and pixels, lowercase hex.
    ///
    /// Equal digests mean the scanner saw identical input.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.image.width().to_le_bytes());
        hasher.update(self.image.height().to_le_bytes());
        hasher.update(self.image.as_raw());
        hex::encode(hasher.finalize())
    }
}

// -- Output -------------------------------------------------------------------

/// Write an image to a file. The format is inferred from the file extension.
pub fn save(image: &DynamicImage, path: impl AsRef<std::path::Path>) -> Result<(), PruefwerkError> {
    image.save(path.as_ref()).map_err(|err| {
        PruefwerkError::ImageError(format!(
            "failed to save image to {}: {}",
            path.as_ref().display(),
            err
        ))
    })
}
