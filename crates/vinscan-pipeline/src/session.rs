// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session state machine.
//
// The only layer allowed to hold user-facing state. States are an explicit
// enum with transition points in `run`, not a bag of boolean flags. The
// session is single-flight: one OCR request at most, one terminal
// ScanResult at most, cancellable at any pre-terminal point.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::{info, instrument, warn};

use vinscan_core::config::ScanConfig;
use vinscan_core::error::Result;
use vinscan_core::types::{CapturedImage, FailureReason, OcrOutcome, ScanResult, SessionId};

use crate::extract::extract_candidates;
use crate::ocr::TextRecognizer;
use crate::preprocess::preprocess_within_budget;
use crate::resolve::resolve;

/// How much recognized text is surfaced alongside a no-candidate failure,
/// to aid manual transcription.
const RAW_TEXT_SNIPPET_CHARS: usize = 120;

/// Platform camera seam. The capture UI, permission prompts, and hardware
/// access live outside the pipeline; the session only needs these two calls.
pub trait CameraBridge {
    /// Whether camera permission is currently granted. Prompting the user
    /// is the platform layer's concern.
    fn permission_granted(&self) -> bool;

    /// Launch the capture flow. Returns `Ok(None)` when the user backs out
    /// without taking a photo.
    fn capture(&self) -> Result<Option<CapturedImage>>;
}

/// Cooperative cancellation handle shared between the session and the UI.
///
/// Cancelling drops the in-flight OCR future (releasing its connection)
/// at the next await or stage boundary; no result is recorded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            // Register interest before re-checking so a cancel between the
            // check and the await is not lost.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Lifecycle states of a scan session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
    Preprocessing,
    Recognizing,
    Extracting,
    Resolved { vin: String, verified: bool },
    Failed { reason: FailureReason },
}

/// One user-facing VIN scan from camera trigger to terminal result.
pub struct ScanSession {
    id: SessionId,
    config: ScanConfig,
    state: SessionState,
    cancel: CancelToken,
}

impl ScanSession {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            id: SessionId::new(),
            config,
            state: SessionState::Idle,
            cancel: CancelToken::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handle the UI can use to cancel this session from another task.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Return to `Idle` with a fresh cancellation token, ready for the
    /// "Try Again" full re-capture. Any previous result stays with the
    /// caller; the session itself never re-emits it.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.cancel = CancelToken::new();
    }

    /// Drive one full scan: capture → preprocess → recognize → extract →
    /// resolve.
    ///
    /// Returns `None` only when the user cancelled (via the camera UI or
    /// the cancel token) — no result is recorded in that case. Otherwise
    /// exactly one `ScanResult` is produced and also retained in
    /// [`state`](Self::state).
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn run<C, R>(&mut self, camera: &C, recognizer: &R) -> Option<ScanResult>
    where
        C: CameraBridge,
        R: TextRecognizer,
    {
        if self.state != SessionState::Idle {
            warn!(state = ?self.state, "session not idle, ignoring scan trigger");
            return None;
        }

        // -- Capturing ------------------------------------------------------
        self.state = SessionState::Capturing;
        if !camera.permission_granted() {
            return Some(self.fail(FailureReason::PermissionDenied));
        }
        let image = match camera.capture() {
            Ok(Some(image)) => image,
            Ok(None) => {
                info!("capture cancelled by user");
                self.state = SessionState::Idle;
                return None;
            }
            Err(e) => {
                return Some(self.fail(FailureReason::Preprocess {
                    detail: e.to_string(),
                }));
            }
        };
        if self.cancel.is_cancelled() {
            return self.cancelled();
        }

        // -- Preprocessing --------------------------------------------------
        // CPU-bound; keep it off the async executor. The capture moves into
        // the worker and is dropped once the payload exists.
        self.state = SessionState::Preprocessing;
        let config = self.config.clone();
        let payload =
            match tokio::task::spawn_blocking(move || preprocess_within_budget(&image, &config))
                .await
            {
                Ok(Ok(payload)) => payload,
                Ok(Err(e)) => {
                    return Some(self.fail(FailureReason::Preprocess {
                        detail: e.to_string(),
                    }));
                }
                Err(join_err) => {
                    return Some(self.fail(FailureReason::Preprocess {
                        detail: format!("preprocess worker failed: {join_err}"),
                    }));
                }
            };
        if self.cancel.is_cancelled() {
            return self.cancelled();
        }

        // -- Recognizing ----------------------------------------------------
        // The only suspension point. Racing against the token drops the
        // in-flight request immediately on cancel.
        self.state = SessionState::Recognizing;
        let cancel = self.cancel.clone();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return self.cancelled(),
            outcome = recognizer.recognize(&payload) => outcome,
        };
        let text = match outcome {
            Ok(OcrOutcome::Text(text)) => text,
            Ok(OcrOutcome::Timeout) => return Some(self.fail(FailureReason::Network)),
            Ok(OcrOutcome::ServiceError { message }) => {
                return Some(self.fail(FailureReason::Service { message }));
            }
            Err(e) => {
                warn!(error = %e, "OCR transport failure");
                return Some(self.fail(FailureReason::Network));
            }
        };
        if self.cancel.is_cancelled() {
            return self.cancelled();
        }

        // -- Extracting -----------------------------------------------------
        self.state = SessionState::Extracting;
        let candidates = extract_candidates(&text);
        let result = match resolve(&candidates) {
            // Attach the truncated raw text so the technician can transcribe
            // by hand when extraction found nothing.
            ScanResult::Failed {
                reason: FailureReason::NoTextOrNoCandidate { .. },
            } => ScanResult::Failed {
                reason: FailureReason::NoTextOrNoCandidate {
                    recognized_text: snippet(&text),
                },
            },
            resolved => resolved,
        };
        Some(self.finish(result))
    }

    fn cancelled(&mut self) -> Option<ScanResult> {
        info!("session cancelled, no result recorded");
        self.state = SessionState::Idle;
        None
    }

    fn fail(&mut self, reason: FailureReason) -> ScanResult {
        warn!(reason = ?reason, "scan failed");
        self.state = SessionState::Failed {
            reason: reason.clone(),
        };
        ScanResult::Failed { reason }
    }

    fn finish(&mut self, result: ScanResult) -> ScanResult {
        match &result {
            ScanResult::Resolved { vin, verified } => {
                info!(vin = %vin, verified, "scan resolved");
                self.state = SessionState::Resolved {
                    vin: vin.clone(),
                    verified: *verified,
                };
            }
            ScanResult::Failed { reason } => {
                warn!(reason = ?reason, "scan failed");
                self.state = SessionState::Failed {
                    reason: reason.clone(),
                };
            }
        }
        result
    }
}

/// First `RAW_TEXT_SNIPPET_CHARS` characters of the recognized text, or
/// `None` when there was none worth showing.
fn snippet(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(RAW_TEXT_SNIPPET_CHARS).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vinscan_core::error::VinScanError;
    use vinscan_core::types::EncodedPayload;

    enum Recognition {
        Text(&'static str),
        Timeout,
        Service(&'static str),
        Transport,
        Hang,
    }

    struct StubRecognizer {
        behaviour: Recognition,
    }

    impl TextRecognizer for StubRecognizer {
        async fn recognize(&self, _payload: &EncodedPayload) -> Result<OcrOutcome> {
            match &self.behaviour {
                Recognition::Text(t) => Ok(OcrOutcome::Text((*t).into())),
                Recognition::Timeout => Ok(OcrOutcome::Timeout),
                Recognition::Service(m) => Ok(OcrOutcome::ServiceError {
                    message: (*m).into(),
                }),
                Recognition::Transport => {
                    Err(VinScanError::Network("connection reset by peer".into()))
                }
                Recognition::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }

    struct StubCamera {
        permission: bool,
        capture: Option<CapturedImage>,
    }

    impl CameraBridge for StubCamera {
        fn permission_granted(&self) -> bool {
            self.permission
        }

        fn capture(&self) -> Result<Option<CapturedImage>> {
            Ok(self.capture.clone())
        }
    }

    fn test_capture() -> CapturedImage {
        let img = image::RgbImage::from_fn(64, 32, |x, y| {
            image::Rgb([(x * 3) as u8, (y * 5) as u8, 128])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode test PNG");
        CapturedImage {
            bytes,
            width_px: 64,
            height_px: 32,
        }
    }

    fn camera() -> StubCamera {
        StubCamera {
            permission: true,
            capture: Some(test_capture()),
        }
    }

    #[tokio::test]
    async fn permission_denied_fails_terminally() {
        let mut session = ScanSession::new(ScanConfig::default());
        let camera = StubCamera {
            permission: false,
            capture: None,
        };
        let result = session
            .run(&camera, &StubRecognizer {
                behaviour: Recognition::Text(""),
            })
            .await;
        assert_eq!(
            result,
            Some(ScanResult::Failed {
                reason: FailureReason::PermissionDenied
            })
        );
        assert!(matches!(session.state(), SessionState::Failed { .. }));
    }

    #[tokio::test]
    async fn user_capture_cancel_returns_to_idle_without_result() {
        let mut session = ScanSession::new(ScanConfig::default());
        let camera = StubCamera {
            permission: true,
            capture: None,
        };
        let result = session
            .run(&camera, &StubRecognizer {
                behaviour: Recognition::Text(""),
            })
            .await;
        assert_eq!(result, None);
        assert_eq!(*session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn timeout_maps_to_network_failure() {
        let mut session = ScanSession::new(ScanConfig::default());
        let result = session
            .run(&camera(), &StubRecognizer {
                behaviour: Recognition::Timeout,
            })
            .await;
        assert_eq!(
            result,
            Some(ScanResult::Failed {
                reason: FailureReason::Network
            })
        );
        // "Try Again" restarts from capture after a reset.
        session.reset();
        assert_eq!(*session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn transport_failure_maps_to_network_failure() {
        let mut session = ScanSession::new(ScanConfig::default());
        let result = session
            .run(&camera(), &StubRecognizer {
                behaviour: Recognition::Transport,
            })
            .await;
        assert_eq!(
            result,
            Some(ScanResult::Failed {
                reason: FailureReason::Network
            })
        );
    }

    #[tokio::test]
    async fn service_error_is_terminal_for_the_attempt() {
        let mut session = ScanSession::new(ScanConfig::default());
        let result = session
            .run(&camera(), &StubRecognizer {
                behaviour: Recognition::Service("E101: timed out waiting for results"),
            })
            .await;
        assert_eq!(
            result,
            Some(ScanResult::Failed {
                reason: FailureReason::Service {
                    message: "E101: timed out waiting for results".into()
                }
            })
        );
    }

    #[tokio::test]
    async fn cancel_during_recognition_records_nothing() {
        let mut session = ScanSession::new(ScanConfig::default());
        let token = session.cancel_token();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            token.cancel();
        });
        let result = session
            .run(&camera(), &StubRecognizer {
                behaviour: Recognition::Hang,
            })
            .await;
        assert_eq!(result, None);
        assert_eq!(*session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn session_is_single_flight() {
        let mut session = ScanSession::new(ScanConfig::default());
        let recognizer = StubRecognizer {
            behaviour: Recognition::Text("VIN: 1HGCM82633A004352"),
        };
        let first = session.run(&camera(), &recognizer).await;
        assert!(first.is_some());
        // A second trigger without reset is ignored.
        let second = session.run(&camera(), &recognizer).await;
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn no_candidate_failure_carries_truncated_text() {
        let mut session = ScanSession::new(ScanConfig::default());
        // Only characters that can never start a window candidate, so the
        // scan genuinely finds nothing despite plenty of text.
        let long_text = "BAGGAGE DECADE FACADE 0896 ".repeat(20);
        let long_text: &'static str = Box::leak(long_text.into_boxed_str());
        let result = session
            .run(&camera(), &StubRecognizer {
                behaviour: Recognition::Text(long_text),
            })
            .await
            .expect("terminal result");
        match result {
            ScanResult::Failed {
                reason: FailureReason::NoTextOrNoCandidate { recognized_text },
            } => {
                let text = recognized_text.expect("snippet present");
                assert!(text.chars().count() <= RAW_TEXT_SNIPPET_CHARS);
            }
            other => panic!("expected no-candidate failure, got {other:?}"),
        }
    }

    #[test]
    fn cancel_token_is_idempotent_and_observable() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            true
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        token.cancel();
        assert!(handle.await.expect("join"));
    }
}
