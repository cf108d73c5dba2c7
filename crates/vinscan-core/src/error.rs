// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for vinscan.

use thiserror::Error;

/// Top-level error type for all vinscan operations.
#[derive(Debug, Error)]
pub enum VinScanError {
    // -- Capture errors --
    #[error("camera permission denied")]
    CameraPermission,

    #[error("camera bridge error: {0}")]
    Bridge(String),

    // -- Preprocessing errors --
    #[error("image processing failed: {0}")]
    Image(String),

    // -- OCR service errors --
    #[error("OCR transport failure: {0}")]
    Network(String),

    #[error("OCR service error: {0}")]
    OcrService(String),

    // -- Storage / serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VinScanError>;
