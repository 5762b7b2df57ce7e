//! Timelapse batch worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lapse_drive::DriveClient;
use lapse_media::{Encoder, GifAnimationEncoder, OutputFormat, RemoteFfmpegEncoder};
use lapse_worker::{run_batch, BatchContext, FolderTree, Storage, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("lapse=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting lapse-worker");

    // Load configuration
    let config = match WorkerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Authentication failures are fatal to the whole invocation
    let drive = match DriveClient::from_env() {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to create Drive client: {}", e);
            std::process::exit(1);
        }
    };

    let encoder: Arc<dyn Encoder> = match config.output_format {
        OutputFormat::Mp4 => match RemoteFfmpegEncoder::from_env() {
            Ok(e) => Arc::new(e),
            Err(e) => {
                error!("Failed to create FFmpeg API encoder: {}", e);
                std::process::exit(1);
            }
        },
        OutputFormat::Gif => Arc::new(GifAnimationEncoder::new()),
    };

    let storage: Arc<dyn Storage> = Arc::new(drive);

    // So is an unreachable folder hierarchy
    let folders = match FolderTree::resolve(storage.as_ref(), &config).await {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to resolve folder hierarchy: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = BatchContext {
        config,
        storage,
        encoder,
        folders,
    };

    let reports = run_batch(&ctx).await;

    for report in &reports {
        info!(cadence = %report.cadence, "{}", report.outcome);
    }
    let failures = reports.iter().filter(|r| r.outcome.is_failure()).count();
    info!(
        cadences = reports.len(),
        failures, "Batch invocation complete"
    );
}
