//! Drive folder hierarchy resolution.

use tracing::info;

use lapse_drive::FolderId;
use lapse_models::Cadence;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::storage::Storage;

/// Resolved folder ids for one camera's hierarchy.
#[derive(Debug, Clone)]
pub struct FolderTree {
    /// Source images uploaded by the camera.
    pub images: FolderId,
    pub hourly: FolderId,
    pub daily: FolderId,
    pub weekly: FolderId,
}

impl FolderTree {
    /// Output folder for a cadence's artifacts.
    pub fn output(&self, cadence: Cadence) -> &FolderId {
        match cadence {
            Cadence::Hourly => &self.hourly,
            Cadence::Daily => &self.daily,
            Cadence::Weekly => &self.weekly,
        }
    }

    /// Resolve the full hierarchy, creating missing folders.
    ///
    /// Verifies the configured root first; any failure here aborts the
    /// whole invocation.
    pub async fn resolve<S: Storage + ?Sized>(
        storage: &S,
        config: &WorkerConfig,
    ) -> WorkerResult<Self> {
        let root = FolderId::new(&config.root_folder_id);
        let root_name = storage.verify_folder(&root).await?;
        info!(root = %root, name = %root_name, "Root folder verified");

        let site = storage
            .find_or_create_folder(&root, &config.site_folder)
            .await?;
        let camera = storage
            .find_or_create_folder(&site, &config.camera_folder)
            .await?;
        let images = storage
            .find_or_create_folder(&camera, &config.image_folder)
            .await?;
        let timelapse = storage
            .find_or_create_folder(&camera, &config.timelapse_folder)
            .await?;

        let hourly = storage
            .find_or_create_folder(&timelapse, Cadence::Hourly.output_folder())
            .await?;
        let daily = storage
            .find_or_create_folder(&timelapse, Cadence::Daily.output_folder())
            .await?;
        let weekly = storage
            .find_or_create_folder(&timelapse, Cadence::Weekly.output_folder())
            .await?;

        Ok(Self {
            images,
            hourly,
            daily,
            weekly,
        })
    }
}
