// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate resolution — pick the VIN the session will report.
//
// Policy: a checksum-valid candidate always wins (first such in union
// order); otherwise the first candidate overall is returned unverified.
// An unverified VIN is still more useful to the technician than nothing,
// but the caller must flag it for a manual double-check.

use tracing::{debug, instrument};

use vinscan_core::types::{Candidate, FailureReason, ScanResult};

use crate::checksum;

/// Select the best candidate and package the terminal result.
///
/// The slice must be in union order as produced by
/// [`extract_candidates`](crate::extract::extract_candidates) — labeled
/// matches first — since ties are broken by position.
#[instrument(skip(candidates), fields(count = candidates.len()))]
pub fn resolve(candidates: &[Candidate]) -> ScanResult {
    if candidates.is_empty() {
        return ScanResult::Failed {
            reason: FailureReason::NoTextOrNoCandidate {
                recognized_text: None,
            },
        };
    }

    if let Some(valid) = candidates
        .iter()
        .find(|c| checksum::validate(c).checksum_valid)
    {
        debug!(vin = %valid, provenance = ?valid.provenance, "checksum-valid candidate selected");
        return ScanResult::Resolved {
            vin: valid.text.clone(),
            verified: true,
        };
    }

    let first = &candidates[0];
    debug!(vin = %first, "no checksum-valid candidate, falling back unverified");
    ScanResult::Resolved {
        vin: first.text.clone(),
        verified: false,
    }
}
