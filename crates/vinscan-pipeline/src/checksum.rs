// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ISO 3779 VIN check-digit validation.
//
// Position 9 of a VIN is a check digit computed as a weighted sum of the
// transliterated values of the other 16 characters, mod 11 (remainder 10 is
// written as the letter X).

use vinscan_core::types::{Candidate, ValidationOutcome};

/// Positional weights for the 17 VIN characters. Position 9 carries weight 0
/// because it *is* the check digit and is excluded from the sum.
const WEIGHTS: [u32; 17] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

/// Transliterate a VIN character to its numeric value per ISO 3779.
///
/// Digits map to themselves. I, O, and Q are disallowed in VINs and have no
/// value; any such character makes the containing candidate invalid.
pub fn transliterate(c: char) -> Option<u32> {
    match c {
        '0'..='9' => Some(c as u32 - '0' as u32),
        'A' => Some(1),
        'B' => Some(2),
        'C' => Some(3),
        'D' => Some(4),
        'E' => Some(5),
        'F' => Some(6),
        'G' => Some(7),
        'H' => Some(8),
        'J' => Some(1),
        'K' => Some(2),
        'L' => Some(3),
        'M' => Some(4),
        'N' => Some(5),
        'P' => Some(7),
        'R' => Some(9),
        'S' => Some(2),
        'T' => Some(3),
        'U' => Some(4),
        'V' => Some(5),
        'W' => Some(6),
        'X' => Some(7),
        'Y' => Some(8),
        'Z' => Some(9),
        _ => None,
    }
}

/// Compute the expected check character for a 17-character VIN string.
///
/// Returns `None` if the string is not exactly 17 characters or contains a
/// character without a transliteration value.
pub fn expected_check_digit(vin: &str) -> Option<char> {
    if vin.chars().count() != 17 {
        return None;
    }

    let mut sum = 0u32;
    for (i, c) in vin.chars().enumerate() {
        // The check digit position contributes nothing (weight 0), but its
        // character must still carry a transliteration value ('X' does).
        let value = transliterate(c)?;
        sum += value * WEIGHTS[i];
    }

    let remainder = sum % 11;
    Some(if remainder == 10 {
        'X'
    } else {
        char::from_digit(remainder, 10).expect("remainder 0-9 is a digit")
    })
}

/// Apply the check-digit algorithm to one candidate.
///
/// Pure: the same input always yields the same outcome.
pub fn validate(candidate: &Candidate) -> ValidationOutcome {
    let checksum_valid = match expected_check_digit(&candidate.text) {
        Some(expected) => candidate.text.chars().nth(8) == Some(expected),
        None => false,
    };
    ValidationOutcome {
        candidate: candidate.clone(),
        checksum_valid,
    }
}

/// Convenience wrapper for callers that only need the boolean.
pub fn is_checksum_valid(vin: &str) -> bool {
    matches!(expected_check_digit(vin), Some(expected) if vin.chars().nth(8) == Some(expected))
}
