//! Batch orchestration.
//!
//! One invocation attempts the three cadences in fixed order. Each cadence
//! is fully processed (gates, fetch, encode, upload, cleanup) before the
//! next begins, a failure aborts only its own cadence, and nothing an
//! earlier cadence uploaded or deleted is ever rolled back.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{error, info, warn};

use lapse_media::{prepare_frames, Encoder};
use lapse_models::{
    cleanup_actions, BuildDecision, Cadence, CadenceOutcome, CleanupAction, TimeWindow,
    REFERENCE_ZONE,
};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::folders::FolderTree;
use crate::policy;
use crate::storage::Storage;

/// Everything one batch invocation needs.
pub struct BatchContext {
    pub config: WorkerConfig,
    pub storage: Arc<dyn Storage>,
    pub encoder: Arc<dyn Encoder>,
    pub folders: FolderTree,
}

/// Per-cadence result of one invocation.
#[derive(Debug)]
pub struct CadenceReport {
    pub cadence: Cadence,
    pub outcome: CadenceOutcome,
}

/// Run all cadences against the current wall clock.
pub async fn run_batch(ctx: &BatchContext) -> Vec<CadenceReport> {
    run_batch_at(ctx, Utc::now().with_timezone(&REFERENCE_ZONE)).await
}

/// Run all cadences as of `now`. Failures never cross cadence boundaries.
pub async fn run_batch_at(ctx: &BatchContext, now: DateTime<Tz>) -> Vec<CadenceReport> {
    let mut reports = Vec::with_capacity(Cadence::ALL.len());

    for cadence in Cadence::ALL {
        let outcome = match process_cadence(ctx, cadence, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%cadence, "Cadence failed: {}", e);
                CadenceOutcome::Failed(e.to_string())
            }
        };
        info!(%cadence, %outcome, "Cadence finished");
        reports.push(CadenceReport { cadence, outcome });
    }

    reports
}

async fn process_cadence(
    ctx: &BatchContext,
    cadence: Cadence,
    now: DateTime<Tz>,
) -> WorkerResult<CadenceOutcome> {
    let window = TimeWindow::current(cadence, now);
    let artifact = format!(
        "{}.{}",
        window.artifact_stem(),
        ctx.encoder.format().extension()
    );
    let output_folder = ctx.folders.output(cadence);
    info!(window = %window, artifact = %artifact, "Processing cadence");

    let decision = policy::evaluate(
        ctx.storage.as_ref(),
        output_folder,
        &ctx.folders.images,
        &window,
        &artifact,
        ctx.config.enforce_thresholds,
    )
    .await;

    if let BuildDecision::Skip(reason) = decision {
        return Ok(CadenceOutcome::Skipped(reason));
    }

    // Scoped workspace for this cadence's files; removed on drop no matter
    // how the build ends.
    let workspace = tempfile::tempdir()?;

    let buffers = download_frames(ctx, &window, workspace.path()).await?;
    let frames = prepare_frames(&buffers)?;
    let frame_count = frames.len();

    let bytes = ctx
        .encoder
        .encode(&frames, cadence.frame_duration_ms())
        .await?;
    info!(artifact = %artifact, bytes = bytes.len(), "Encoded artifact");

    ctx.storage
        .upload_file(
            output_folder,
            &artifact,
            bytes,
            ctx.encoder.format().mime_type(),
        )
        .await?;

    run_cleanup(ctx, &window).await;

    Ok(CadenceOutcome::Built {
        frames: frame_count,
        artifact,
    })
}

/// Download the window's images, oldest first, into the workspace.
async fn download_frames(
    ctx: &BatchContext,
    window: &TimeWindow,
    workspace: &Path,
) -> WorkerResult<Vec<Vec<u8>>> {
    let files = ctx.storage.list_images(&ctx.folders.images, window).await?;
    info!(count = files.len(), window = %window, "Found images for window");

    let mut buffers = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let bytes = ctx.storage.download_file(&file.id).await?;
        if bytes.is_empty() {
            warn!(name = %file.name, "Skipping empty download");
            continue;
        }
        tokio::fs::write(workspace.join(format!("{:04}.jpg", index)), &bytes).await?;
        buffers.push(bytes);
    }

    if buffers.is_empty() {
        return Err(WorkerError::processing_failed(format!(
            "no images downloaded for {}",
            window
        )));
    }

    Ok(buffers)
}

/// Apply the window's compaction plan. Best-effort: failures are logged and
/// never escalate past this function.
async fn run_cleanup(ctx: &BatchContext, window: &TimeWindow) {
    for action in cleanup_actions(window) {
        match action {
            CleanupAction::PurgeArtifacts(tier) => {
                let folder = ctx.folders.output(tier);
                match ctx.storage.delete_artifacts(folder).await {
                    Ok(deleted) => {
                        info!(%tier, deleted, "Purged subsumed artifacts");
                    }
                    Err(e) => {
                        warn!(cadence = %window.cadence, %tier, "Artifact cleanup failed: {}", e);
                    }
                }
            }
            CleanupAction::PurgeImagesBefore(bound) => {
                let before = bound.with_timezone(&Utc);
                match ctx
                    .storage
                    .delete_images_before(&ctx.folders.images, before)
                    .await
                {
                    Ok(deleted) => {
                        info!(deleted, before = %before, "Purged consumed source images");
                    }
                    Err(e) => {
                        warn!(cadence = %window.cadence, "Image cleanup failed: {}", e);
                    }
                }
            }
        }
    }
}
