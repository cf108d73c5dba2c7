// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the VIN recognition pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A photograph handed to the pipeline by the platform camera layer.
///
/// Owned exclusively by the scan session until it is consumed by the
/// preprocessor; discarded once the corresponding [`EncodedPayload`] exists.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// Raw encoded bytes as delivered by the camera (typically JPEG).
    pub bytes: Vec<u8>,
    /// Source width in pixels.
    pub width_px: u32,
    /// Source height in pixels.
    pub height_px: u32,
}

/// An OCR-ready payload produced by the image preprocessor.
///
/// Payloads are never mutated in place: each resize attempt builds a fresh
/// one and the previous payload is discarded.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    /// Base64-encoded JPEG data (without a data-URI prefix).
    pub base64: String,
    /// Estimated size of the encoded JPEG in kilobytes.
    pub size_kb: u32,
    /// Width of the resized image in pixels.
    pub width_px: u32,
}

/// Outcome of a single OCR service call.
///
/// Transport failures are *not* represented here — they surface as
/// `Err(VinScanError::Network)` from the client, keeping the three failure
/// classes (service-reported, transport, timeout) distinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutcome {
    /// The call succeeded; the string may be empty ("no text found" is a
    /// successful call, not an error).
    Text(String),
    /// The service explicitly reported it could not process the image.
    ServiceError { message: String },
    /// The hard timeout expired and the in-flight request was cancelled.
    Timeout,
}

/// Which extraction heuristic produced a candidate. Diagnostics only — it
/// never influences selection beyond the fixed union order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// Found immediately after a literal "VIN" label in the text.
    LabeledField,
    /// A 17-character window over the stripped full blob.
    SlidingWindow,
    /// A whole line that was exactly 17 characters after cleanup.
    LineMatch,
}

/// A structurally plausible VIN extracted from OCR text.
///
/// Invariant: `text` is exactly 17 characters drawn from the VIN alphabet
/// (digits and uppercase letters excluding I, O, Q).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub provenance: Provenance,
}

impl Candidate {
    pub fn new(text: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            text: text.into(),
            provenance,
        }
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Result of running the ISO 3779 check-digit algorithm over one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub candidate: Candidate,
    pub checksum_valid: bool,
}

/// Why a scan session ended without a VIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Camera access not granted; terminal without leaving the app flow.
    PermissionDenied,
    /// The captured image could not be decoded or resized.
    Preprocess { detail: String },
    /// Transport failure or timeout talking to the OCR service.
    Network,
    /// The OCR service explicitly reported a processing error.
    Service { message: String },
    /// OCR succeeded but produced no text, or no 17-character
    /// alphabet-valid candidate was found. Carries the recognized text
    /// (truncated) when any was present, to aid manual transcription.
    NoTextOrNoCandidate { recognized_text: Option<String> },
}

/// The terminal value of a scan session. Produced exactly once per session
/// and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanResult {
    /// A VIN was selected. `verified` is true iff it passed checksum
    /// validation; unverified results must be visibly flagged so the user
    /// can double-check against the physical label.
    Resolved { vin: String, verified: bool },
    /// No VIN could be produced.
    Failed { reason: FailureReason },
}

impl ScanResult {
    /// The selected VIN, if the session resolved one.
    pub fn vin(&self) -> Option<&str> {
        match self {
            Self::Resolved { vin, .. } => Some(vin),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}
