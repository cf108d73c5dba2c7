// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for scan failures.
//
// Every terminal failure reason is mapped to plain English with a clear
// suggestion, so field technicians are never shown raw error strings.

use crate::types::FailureReason;

/// Severity of a failure from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, timeout — retrying the scan is likely to succeed.
    Transient,
    /// User must do something (grant permission, re-frame the label).
    ActionRequired,
    /// Cannot be fixed by retrying inside the app flow.
    Permanent,
}

/// A human-readable failure with a plain English message and suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the UI should offer a "Try Again" action that restarts the
    /// whole session from image capture.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `FailureReason` into something a technician in a parking lot
/// can act on.
pub fn humanize_reason(reason: &FailureReason) -> HumanError {
    match reason {
        FailureReason::PermissionDenied => HumanError {
            message: "Camera access is turned off.".into(),
            suggestion: "Allow camera access for this app in your device settings, then come back and scan again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FailureReason::Preprocess { .. } => HumanError {
            message: "That photo couldn't be processed.".into(),
            suggestion: "Take the photo again. If it keeps happening, try the standard camera mode instead of any special modes.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        FailureReason::Network => HumanError {
            message: "We couldn't reach the text recognition service.".into(),
            suggestion: "Check your connection and tap Try Again to retake the photo.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FailureReason::Service { .. } => HumanError {
            message: "The recognition service couldn't read that photo.".into(),
            suggestion: "Retake the photo from a different angle, with less glare on the VIN label.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FailureReason::NoTextOrNoCandidate { recognized_text } => {
            let suggestion = match recognized_text {
                Some(text) => format!(
                    "Move closer so the 17-character VIN fills the frame, and avoid shadows. \
                     Text we could read: \"{text}\""
                ),
                None => "Make sure the VIN label is well lit and fills most of the frame, then scan again.".into(),
            };
            HumanError {
                message: "No VIN was found in that photo.".into(),
                suggestion,
                retriable: true,
                severity: Severity::ActionRequired,
            }
        }
    }
}
