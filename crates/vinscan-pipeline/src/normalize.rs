// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR text normalization, aware of the VIN alphabet.
//
// VINs never contain I, O, or Q (ISO 3779), so the classic OCR confusions
// O/0, I/1, Q/0 can be corrected unconditionally before extraction.

/// Uppercase the text and apply the VIN confusion substitutions
/// (`O→0`, `I→1`, `Q→0`). Line breaks and all other characters are
/// retained so the result can still be split per line.
///
/// Idempotent: normalizing twice yields the same string.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|c| match c.to_ascii_uppercase() {
            'O' | 'Q' => '0',
            'I' => '1',
            upper => upper,
        })
        .collect()
}

/// Drop every character outside the VIN alphabet. Used to form the
/// fixed-length windows for sliding-window extraction.
pub fn strip_to_alphabet(text: &str) -> String {
    text.chars().filter(|&c| is_vin_char(c)).collect()
}

/// Whether `c` belongs to the VIN alphabet: digits and uppercase letters
/// excluding I, O, Q.
pub fn is_vin_char(c: char) -> bool {
    matches!(c, '0'..='9') || (c.is_ascii_uppercase() && !matches!(c, 'I' | 'O' | 'Q'))
}

/// Whether `c` is a plausible first VIN character. World manufacturer
/// identifiers in the field start with `1`–`5` (North America) or one of
/// `J`–`N`, `P`, `R`–`Z` (Asia, Europe, Oceania, South America).
pub fn is_valid_first_char(c: char) -> bool {
    matches!(c, '1'..='5' | 'J'..='N' | 'P' | 'R'..='Z')
}
