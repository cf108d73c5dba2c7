// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// vinscan — run the VIN recognition pipeline against a photo on disk.
//
// Usage: vinscan <image-path>
//
// The OCR endpoint and API key come from VINSCAN_OCR_ENDPOINT and
// VINSCAN_OCR_API_KEY; unset, the defaults in ScanConfig apply.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use vinscan_core::config::ScanConfig;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::human_errors::humanize_reason;
use vinscan_core::types::{CapturedImage, ScanResult};
use vinscan_pipeline::ocr::OcrClient;
use vinscan_pipeline::session::{CameraBridge, ScanSession};

/// Stand-in for the platform camera: "captures" a photo already on disk.
struct FileCamera {
    path: PathBuf,
}

impl CameraBridge for FileCamera {
    fn permission_granted(&self) -> bool {
        true
    }

    fn capture(&self) -> Result<Option<CapturedImage>> {
        let bytes = std::fs::read(&self.path)?;
        let (width_px, height_px) = image::image_dimensions(&self.path)
            .map_err(|e| VinScanError::Image(format!("cannot read image dimensions: {e}")))?;
        Ok(Some(CapturedImage {
            bytes,
            width_px,
            height_px,
        }))
    }
}

fn config_from_env() -> ScanConfig {
    let mut config = ScanConfig::default();
    if let Ok(endpoint) = std::env::var("VINSCAN_OCR_ENDPOINT") {
        config.ocr_endpoint = endpoint;
    }
    if let Ok(key) = std::env::var("VINSCAN_OCR_API_KEY") {
        config.ocr_api_key = Some(key);
    }
    config
}

async fn scan(path: &Path) -> Result<Option<ScanResult>> {
    let config = config_from_env();
    let camera = FileCamera {
        path: path.to_path_buf(),
    };
    let recognizer = OcrClient::new(&config)?;
    let mut session = ScanSession::new(config);
    Ok(session.run(&camera, &recognizer).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: vinscan <image-path>");
        return ExitCode::FAILURE;
    };

    match scan(Path::new(&path)).await {
        Ok(Some(ScanResult::Resolved { vin, verified })) => {
            if verified {
                println!("{vin}");
            } else {
                println!("{vin}");
                eprintln!("warning: checksum not verified, double-check against the label");
            }
            ExitCode::SUCCESS
        }
        Ok(Some(ScanResult::Failed { reason })) => {
            let human = humanize_reason(&reason);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
        // Cancellation cannot happen in this harness, but the session
        // contract allows it.
        Ok(None) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "scan aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
