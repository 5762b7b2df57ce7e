//! Pre-build retention gates.
//!
//! Two gates run before any image is fetched: the artifact-existence check
//! (idempotence across invocations) and the minimum-image threshold. Both
//! fail open: a failed existence check is treated as "missing" so the
//! artifact is rebuilt, a failed count as zero so the cadence skips. Either
//! way the batch keeps going.

use tracing::{info, warn};

use lapse_drive::FolderId;
use lapse_models::{BuildDecision, SkipReason, TimeWindow};

use crate::storage::Storage;

/// Decide whether to build the artifact for `window`.
pub async fn evaluate<S: Storage + ?Sized>(
    storage: &S,
    output_folder: &FolderId,
    image_folder: &FolderId,
    window: &TimeWindow,
    artifact_name: &str,
    enforce_threshold: bool,
) -> BuildDecision {
    match storage.artifact_exists(output_folder, artifact_name).await {
        Ok(true) => {
            info!(cadence = %window.cadence, artifact = %artifact_name, "Artifact already exists");
            return BuildDecision::Skip(SkipReason::AlreadyBuilt);
        }
        Ok(false) => {}
        Err(e) => {
            warn!(
                cadence = %window.cadence,
                "Existence check failed, assuming artifact is missing: {}", e
            );
        }
    }

    if enforce_threshold {
        let required = window.cadence.min_images();
        let found = match storage.count_images(image_folder, window).await {
            Ok(count) => count,
            Err(e) => {
                warn!(cadence = %window.cadence, "Image count failed, assuming zero: {}", e);
                0
            }
        };

        if found < required {
            info!(
                cadence = %window.cadence,
                found, required, "Too few images in window"
            );
            return BuildDecision::Skip(SkipReason::TooFewImages { found, required });
        }
    }

    BuildDecision::Proceed
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use lapse_drive::{DriveError, DriveFile, DriveResult};
    use lapse_models::{Cadence, REFERENCE_ZONE};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Storage double for the two gate queries; everything else panics.
    struct GateStore {
        exists: DriveResult<bool>,
        count: DriveResult<usize>,
        count_calls: AtomicUsize,
    }

    impl GateStore {
        fn new(exists: DriveResult<bool>, count: DriveResult<usize>) -> Self {
            Self {
                exists,
                count,
                count_calls: AtomicUsize::new(0),
            }
        }
    }

    fn clone_result<T: Copy>(r: &DriveResult<T>) -> DriveResult<T> {
        match r {
            Ok(v) => Ok(*v),
            Err(e) => Err(DriveError::request_failed(e.to_string())),
        }
    }

    #[async_trait]
    impl Storage for GateStore {
        async fn verify_folder(&self, _: &FolderId) -> DriveResult<String> {
            unreachable!("gates never verify folders")
        }
        async fn find_or_create_folder(&self, _: &FolderId, _: &str) -> DriveResult<FolderId> {
            unreachable!("gates never resolve folders")
        }
        async fn artifact_exists(&self, _: &FolderId, _: &str) -> DriveResult<bool> {
            clone_result(&self.exists)
        }
        async fn count_images(&self, _: &FolderId, _: &TimeWindow) -> DriveResult<usize> {
            self.count_calls.fetch_add(1, Ordering::SeqCst);
            clone_result(&self.count)
        }
        async fn list_images(&self, _: &FolderId, _: &TimeWindow) -> DriveResult<Vec<DriveFile>> {
            unreachable!("gates never list images")
        }
        async fn download_file(&self, _: &str) -> DriveResult<Vec<u8>> {
            unreachable!("gates never download")
        }
        async fn upload_file(&self, _: &FolderId, _: &str, _: Vec<u8>, _: &str) -> DriveResult<()> {
            unreachable!("gates never upload")
        }
        async fn delete_artifacts(&self, _: &FolderId) -> DriveResult<usize> {
            unreachable!("gates never delete")
        }
        async fn delete_images_before(
            &self,
            _: &FolderId,
            _: DateTime<Utc>,
        ) -> DriveResult<usize> {
            unreachable!("gates never delete")
        }
    }

    fn hourly_window() -> TimeWindow {
        let now = REFERENCE_ZONE
            .with_ymd_and_hms(2024, 3, 14, 15, 47, 0)
            .single()
            .expect("valid reference-zone time");
        TimeWindow::current(Cadence::Hourly, now)
    }

    async fn run(store: &GateStore, enforce: bool) -> BuildDecision {
        let window = hourly_window();
        evaluate(
            store,
            &FolderId::new("out"),
            &FolderId::new("img"),
            &window,
            "timelapse_hour_20240314_15.mp4",
            enforce,
        )
        .await
    }

    #[tokio::test]
    async fn test_existing_artifact_skips_without_counting() {
        let store = GateStore::new(Ok(true), Ok(1000));
        let decision = run(&store, true).await;
        assert_eq!(decision, BuildDecision::Skip(SkipReason::AlreadyBuilt));
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_threshold_boundary() {
        // One below the hourly threshold skips...
        let store = GateStore::new(Ok(false), Ok(59));
        assert_eq!(
            run(&store, true).await,
            BuildDecision::Skip(SkipReason::TooFewImages {
                found: 59,
                required: 60
            })
        );

        // ...exactly at the threshold proceeds.
        let store = GateStore::new(Ok(false), Ok(60));
        assert_eq!(run(&store, true).await, BuildDecision::Proceed);
    }

    #[tokio::test]
    async fn test_threshold_gate_can_be_disabled() {
        let store = GateStore::new(Ok(false), Ok(0));
        assert_eq!(run(&store, false).await, BuildDecision::Proceed);
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_existence_failure_fails_open_to_rebuild() {
        let store = GateStore::new(Err(DriveError::request_failed("boom")), Ok(1000));
        assert_eq!(run(&store, true).await, BuildDecision::Proceed);
    }

    #[tokio::test]
    async fn test_count_failure_treated_as_zero() {
        let store = GateStore::new(Ok(false), Err(DriveError::request_failed("boom")));
        assert_eq!(
            run(&store, true).await,
            BuildDecision::Skip(SkipReason::TooFewImages {
                found: 0,
                required: 60
            })
        );
    }
}
