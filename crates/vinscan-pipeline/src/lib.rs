// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// vinscan-pipeline — The VIN recognition pipeline.
//
// Camera capture → image preprocessing → remote OCR → text normalization →
// candidate extraction → ISO 3779 checksum validation → resolution, all
// orchestrated by an explicit scan session state machine. Everything up to
// the session is pure (or async with no UI dependency); only the session
// holds user-facing state.

pub mod checksum;
pub mod extract;
pub mod normalize;
pub mod ocr;
pub mod preprocess;
pub mod resolve;
pub mod session;

pub use extract::extract_candidates;
pub use ocr::{OcrClient, TextRecognizer};
pub use preprocess::{preprocess, preprocess_within_budget};
pub use resolve::resolve;
pub use session::{CameraBridge, CancelToken, ScanSession, SessionState};
