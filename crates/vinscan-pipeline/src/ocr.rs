// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async OCR client for the remote text-recognition service.
//
// One POST per attempt under a hard timeout; no retries here — all retry
// decisions belong to the scan session. Three failure classes stay
// distinct: service-reported processing errors and empty text come back as
// `OcrOutcome` values, transport failures as `VinScanError::Network`, and
// the timeout as `OcrOutcome::Timeout`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use vinscan_core::config::ScanConfig;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::{EncodedPayload, OcrOutcome};

/// Seam between the scan session and the network. The production
/// implementation is [`OcrClient`]; tests substitute stubs.
pub trait TextRecognizer {
    /// Perform exactly one recognition attempt for one payload.
    fn recognize(
        &self,
        payload: &EncodedPayload,
    ) -> impl std::future::Future<Output = Result<OcrOutcome>> + Send;
}

/// Request body sent to the OCR service. Field names follow the service's
/// wire contract, hence the renames.
#[derive(Debug, Serialize)]
struct RecognizeRequest {
    /// Data-URI form of the JPEG payload.
    #[serde(rename = "base64Image")]
    base64_image: String,
    /// Engine 2 is the high-accuracy mode.
    #[serde(rename = "OCREngine")]
    engine: u8,
    #[serde(rename = "scale")]
    scale: bool,
    #[serde(rename = "detectOrientation")]
    detect_orientation: bool,
    #[serde(rename = "isOverlayRequired")]
    overlay_required: bool,
}

/// One recognized region in the service response.
#[derive(Debug, Deserialize)]
struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    parsed_text: String,
}

/// The service reports errors either as a single string or as an array of
/// strings depending on the failure path.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    fn joined(&self) -> String {
        match self {
            Self::One(msg) => msg.clone(),
            Self::Many(msgs) => msgs.join("; "),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(rename = "ParsedResults", default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(rename = "IsErroredOnProcessing", default)]
    is_errored: bool,
    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<ErrorMessage>,
}

/// Async client for the remote OCR backend.
pub struct OcrClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OcrClient {
    /// Build a client with the configured endpoint and hard timeout.
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.ocr_timeout())
            .build()
            .map_err(|e| VinScanError::Network(format!("client construction: {e}")))?;
        Ok(Self {
            http,
            endpoint: config.ocr_endpoint.clone(),
            api_key: config.ocr_api_key.clone(),
            timeout: config.ocr_timeout(),
        })
    }

    /// Send one payload for recognition.
    ///
    /// Timeout expiry cancels the in-flight request (the connection is
    /// released when the future is dropped) and yields `OcrOutcome::Timeout`.
    #[instrument(skip_all, fields(size_kb = payload.size_kb, width = payload.width_px))]
    pub async fn recognize(&self, payload: &EncodedPayload) -> Result<OcrOutcome> {
        let request = RecognizeRequest {
            base64_image: format!("data:image/jpeg;base64,{}", payload.base64),
            engine: 2,
            scale: true,
            detect_orientation: true,
            overlay_required: false,
        };

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key);
        }

        debug!(timeout_ms = self.timeout.as_millis() as u64, "sending OCR request");
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!("OCR request timed out");
                return Ok(OcrOutcome::Timeout);
            }
            Err(e) => return Err(VinScanError::Network(format!("OCR request: {e}"))),
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "OCR service returned error status");
            return Ok(OcrOutcome::ServiceError {
                message: format!("HTTP {status}"),
            });
        }

        let body: RecognizeResponse = match response.json().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                warn!("OCR response body timed out");
                return Ok(OcrOutcome::Timeout);
            }
            Err(e) => return Err(VinScanError::Network(format!("OCR response: {e}"))),
        };

        let outcome = interpret_response(body);
        if let OcrOutcome::Text(text) = &outcome {
            info!(chars = text.len(), "OCR text received");
        }
        Ok(outcome)
    }
}

impl TextRecognizer for OcrClient {
    async fn recognize(&self, payload: &EncodedPayload) -> Result<OcrOutcome> {
        OcrClient::recognize(self, payload).await
    }
}

/// Map a decoded service response to an outcome. Empty text is a
/// successful call, not an error.
fn interpret_response(body: RecognizeResponse) -> OcrOutcome {
    if body.is_errored {
        let message = body
            .error_message
            .map(|m| m.joined())
            .unwrap_or_else(|| "unspecified processing error".into());
        return OcrOutcome::ServiceError { message };
    }

    let text = body
        .parsed_results
        .iter()
        .map(|r| r.parsed_text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    OcrOutcome::Text(text)
}
