// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable knobs for the VIN recognition pipeline.
///
/// The defaults reproduce the empirically tuned production behaviour: one
/// preprocessing attempt at full target width, and a single automatic
/// downgrade to 1000 px / 0.5 quality when the encoded payload exceeds the
/// 900 KB budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Target width for the first preprocessing attempt, in pixels.
    pub target_width_px: u32,
    /// JPEG quality for the first attempt (0.0–1.0).
    pub jpeg_quality: f32,
    /// Encoded-payload budget in kilobytes. Exceeding it triggers exactly
    /// one downgrade attempt, never a loop.
    pub size_budget_kb: u32,
    /// Width used for the single downgrade attempt.
    pub fallback_width_px: u32,
    /// JPEG quality used for the single downgrade attempt.
    pub fallback_quality: f32,
    /// OCR service endpoint URL.
    pub ocr_endpoint: String,
    /// API key sent with OCR requests, if the service requires one.
    pub ocr_api_key: Option<String>,
    /// Hard timeout for the OCR call, in seconds.
    pub ocr_timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_width_px: 1280,
            jpeg_quality: 0.7,
            size_budget_kb: 900,
            fallback_width_px: 1000,
            fallback_quality: 0.5,
            ocr_endpoint: "https://api.ocr.space/parse/image".into(),
            ocr_api_key: None,
            ocr_timeout_secs: 30,
        }
    }
}

impl ScanConfig {
    /// The OCR timeout as a `Duration`.
    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }
}
