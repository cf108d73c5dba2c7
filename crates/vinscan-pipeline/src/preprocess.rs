// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image preprocessing — resize a captured photo to the OCR target width,
// JPEG-encode it, and base64 it into an upload payload. If the payload
// blows the size budget, exactly one downgrade attempt is made at a
// smaller width and lower quality (never a loop).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use tracing::{debug, info, instrument};

use vinscan_core::config::ScanConfig;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::{CapturedImage, EncodedPayload};

/// Parameters for a single preprocessing attempt.
#[derive(Debug, Clone, Copy)]
pub struct PreprocessOptions {
    /// The output width in pixels; height follows the source aspect ratio.
    pub target_width_px: u32,
    /// JPEG quality in 0.0–1.0.
    pub quality: f32,
}

/// Resize and encode one capture into an OCR payload.
///
/// Each call produces a fresh [`EncodedPayload`]; nothing is mutated in
/// place. Decoding failures are fatal to the scan session.
#[instrument(skip(image), fields(
    src_w = image.width_px,
    src_h = image.height_px,
    target_w = options.target_width_px,
))]
pub fn preprocess(image: &CapturedImage, options: &PreprocessOptions) -> Result<EncodedPayload> {
    let decoded = image::load_from_memory(&image.bytes)
        .map_err(|err| VinScanError::Image(format!("failed to decode capture: {err}")))?;

    let resized = resize_to_width(decoded, options.target_width_px);
    let jpeg = encode_jpeg(&resized, options.quality)?;
    let size_kb = (jpeg.len() / 1024) as u32;

    debug!(size_kb, out_w = resized.width(), "payload encoded");
    Ok(EncodedPayload {
        base64: STANDARD.encode(&jpeg),
        size_kb,
        width_px: resized.width(),
    })
}

/// Preprocess with the configured target, downgrading once if the encoded
/// size exceeds the budget.
///
/// The downgraded payload is returned whatever its size — the budget gates
/// the retry, not the final result.
#[instrument(skip(image, config), fields(budget_kb = config.size_budget_kb))]
pub fn preprocess_within_budget(
    image: &CapturedImage,
    config: &ScanConfig,
) -> Result<EncodedPayload> {
    let first = preprocess(
        image,
        &PreprocessOptions {
            target_width_px: config.target_width_px,
            quality: config.jpeg_quality,
        },
    )?;

    if first.size_kb <= config.size_budget_kb {
        return Ok(first);
    }

    info!(
        size_kb = first.size_kb,
        budget_kb = config.size_budget_kb,
        "payload over budget, downgrading once"
    );
    preprocess(
        image,
        &PreprocessOptions {
            target_width_px: config.fallback_width_px,
            quality: config.fallback_quality,
        },
    )
}

/// Scale so the output width equals `target_width`, preserving aspect ratio.
/// Lanczos3 keeps label text legible through the downscale.
fn resize_to_width(img: DynamicImage, target_width: u32) -> DynamicImage {
    if img.width() == target_width {
        return img;
    }
    let height = ((img.height() as u64 * target_width as u64) / img.width() as u64).max(1) as u32;
    img.resize_exact(target_width, height, image::imageops::FilterType::Lanczos3)
}

/// Encode as JPEG at a 0.0–1.0 quality hint (mapped to the encoder's 1–100).
fn encode_jpeg(img: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
    let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
    let mut buffer = Vec::new();
    let rgb = img.to_rgb8();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|err| VinScanError::Image(format!("JPEG encoding failed: {err}")))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a synthetic capture with enough texture that JPEG output is
    /// not trivially small.
    fn test_capture(width: u32, height: u32) -> CapturedImage {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode test PNG");
        CapturedImage {
            bytes,
            width_px: width,
            height_px: height,
        }
    }

    #[test]
    fn resizes_to_target_width() {
        let capture = test_capture(400, 200);
        let payload = preprocess(
            &capture,
            &PreprocessOptions {
                target_width_px: 100,
                quality: 0.7,
            },
        )
        .expect("preprocess");
        assert_eq!(payload.width_px, 100);
        assert!(!payload.base64.is_empty());
    }

    #[test]
    fn each_attempt_builds_a_fresh_payload() {
        let capture = test_capture(300, 150);
        let a = preprocess(
            &capture,
            &PreprocessOptions {
                target_width_px: 200,
                quality: 0.9,
            },
        )
        .expect("first");
        let b = preprocess(
            &capture,
            &PreprocessOptions {
                target_width_px: 120,
                quality: 0.4,
            },
        )
        .expect("second");
        assert_ne!(a.base64, b.base64);
        assert_eq!(a.width_px, 200);
        assert_eq!(b.width_px, 120);
    }

    #[test]
    fn budget_overflow_triggers_single_downgrade() {
        let capture = test_capture(600, 300);
        let config = ScanConfig {
            target_width_px: 500,
            jpeg_quality: 0.9,
            // A zero budget guarantees the first attempt overflows.
            size_budget_kb: 0,
            fallback_width_px: 240,
            fallback_quality: 0.5,
            ..Default::default()
        };
        let payload = preprocess_within_budget(&capture, &config).expect("preprocess");
        // The downgraded payload is returned even if still over budget.
        assert_eq!(payload.width_px, 240);
    }

    #[test]
    fn within_budget_keeps_first_attempt() {
        let capture = test_capture(600, 300);
        let config = ScanConfig {
            target_width_px: 500,
            jpeg_quality: 0.7,
            size_budget_kb: 100_000,
            ..Default::default()
        };
        let payload = preprocess_within_budget(&capture, &config).expect("preprocess");
        assert_eq!(payload.width_px, 500);
    }

    #[test]
    fn undecodable_bytes_are_fatal() {
        let capture = CapturedImage {
            bytes: vec![0xde, 0xad, 0xbe, 0xef],
            width_px: 0,
            height_px: 0,
        };
        let err = preprocess(
            &capture,
            &PreprocessOptions {
                target_width_px: 100,
                quality: 0.7,
            },
        )
        .unwrap_err();
        assert!(matches!(err, VinScanError::Image(_)));
    }

    #[test]
    fn quality_hint_is_clamped() {
        let capture = test_capture(100, 50);
        // Out-of-range hints must not panic the encoder.
        for quality in [-1.0, 0.0, 1.5] {
            preprocess(
                &capture,
                &PreprocessOptions {
                    target_width_px: 80,
                    quality,
                },
            )
            .expect("preprocess with clamped quality");
        }
    }
}
