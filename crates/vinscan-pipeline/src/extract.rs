// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate extraction — three independent heuristics over normalized OCR
// text, unioned in fixed priority order: labeled-field, sliding-window,
// per-line. De-duplication and first-found ordering are enforced by the
// CandidateSet container so the resolver's tie-break rule holds by
// construction rather than by accident.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};
use vinscan_core::types::{Candidate, Provenance};

use crate::normalize::{is_valid_first_char, normalize, strip_to_alphabet};

/// Matches a literal VIN label followed by a 17-character run from the VIN
/// alphabet. The normalizer has already applied `I→1`, so the label itself
/// appears as `V1N` in normalized text; both spellings are accepted.
static LABELED_VIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"V[I1]N[:#\s]*([0-9A-HJ-NPR-Z]{17})").expect("static pattern compiles")
});

/// An insertion-ordered set of candidates.
///
/// The first occurrence of a VIN string wins; later inserts of the same
/// string (from any heuristic) are ignored, preserving union order for the
/// resolver's tie-break.
#[derive(Debug, Default)]
pub struct CandidateSet {
    items: Vec<Candidate>,
    seen: HashSet<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate, returning `false` if its text was already present.
    pub fn insert(&mut self, candidate: Candidate) -> bool {
        if !self.seen.insert(candidate.text.clone()) {
            return false;
        }
        self.items.push(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.items
    }
}

/// Derive the set of candidate VIN strings from raw OCR text.
///
/// Empty or whitespace-only input yields no candidates; the caller must
/// treat that as "no text detected", not "invalid VIN".
#[instrument(skip(raw_text), fields(text_len = raw_text.len()))]
pub fn extract_candidates(raw_text: &str) -> Vec<Candidate> {
    if raw_text.trim().is_empty() {
        return Vec::new();
    }

    let normalized = normalize(raw_text);
    let mut set = CandidateSet::new();

    // Heuristic 1: labeled field. The label is the strongest signal, so
    // these land first in union order.
    for caps in LABELED_VIN.captures_iter(&normalized) {
        set.insert(Candidate::new(&caps[1], Provenance::LabeledField));
    }

    // Heuristic 2: every 17-character window over the stripped blob whose
    // first character is a plausible region code.
    let stripped = strip_to_alphabet(&normalized);
    let chars: Vec<char> = stripped.chars().collect();
    for window in chars.windows(17) {
        if is_valid_first_char(window[0]) {
            let text: String = window.iter().collect();
            set.insert(Candidate::new(text, Provenance::SlidingWindow));
        }
    }

    // Heuristic 3: lines of the raw text that clean up to exactly 17
    // characters. Normalization runs per line so a line that would fail the
    // length check uncorrected can still qualify.
    for line in raw_text.lines() {
        let cleaned = strip_to_alphabet(&normalize(line));
        if cleaned.len() == 17
            && cleaned.chars().next().is_some_and(is_valid_first_char)
        {
            set.insert(Candidate::new(cleaned, Provenance::LineMatch));
        }
    }

    debug!(candidates = set.len(), "extraction complete");
    set.into_vec()
}
