//! Remote storage operations the batch consumes.
//!
//! The worker talks to the storage hierarchy through this seam rather than
//! the concrete client, so the orchestrator and policy can be exercised
//! against in-memory doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lapse_drive::{DriveClient, DriveFile, DriveResult, FolderId};
use lapse_models::TimeWindow;

/// Storage operations used by the batch.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Verify a folder is reachable; returns its display name.
    async fn verify_folder(&self, folder: &FolderId) -> DriveResult<String>;

    /// Find a child folder by name, creating it when absent.
    async fn find_or_create_folder(&self, parent: &FolderId, name: &str) -> DriveResult<FolderId>;

    /// Whether a file with this exact name exists in the folder.
    async fn artifact_exists(&self, folder: &FolderId, name: &str) -> DriveResult<bool>;

    /// Number of source images inside the window.
    async fn count_images(&self, folder: &FolderId, window: &TimeWindow) -> DriveResult<usize>;

    /// Source images inside the window, oldest first.
    async fn list_images(
        &self,
        folder: &FolderId,
        window: &TimeWindow,
    ) -> DriveResult<Vec<DriveFile>>;

    /// Download a file's content.
    async fn download_file(&self, file_id: &str) -> DriveResult<Vec<u8>>;

    /// Upload an artifact into a folder.
    async fn upload_file(
        &self,
        folder: &FolderId,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> DriveResult<()>;

    /// Delete every timelapse artifact in a folder; returns the count.
    async fn delete_artifacts(&self, folder: &FolderId) -> DriveResult<usize>;

    /// Delete files created strictly before `before`; returns the count.
    async fn delete_images_before(
        &self,
        folder: &FolderId,
        before: DateTime<Utc>,
    ) -> DriveResult<usize>;
}

#[async_trait]
impl Storage for DriveClient {
    async fn verify_folder(&self, folder: &FolderId) -> DriveResult<String> {
        DriveClient::verify_folder(self, folder).await
    }

    async fn find_or_create_folder(&self, parent: &FolderId, name: &str) -> DriveResult<FolderId> {
        DriveClient::find_or_create_folder(self, parent, name).await
    }

    async fn artifact_exists(&self, folder: &FolderId, name: &str) -> DriveResult<bool> {
        DriveClient::artifact_exists(self, folder, name).await
    }

    async fn count_images(&self, folder: &FolderId, window: &TimeWindow) -> DriveResult<usize> {
        DriveClient::count_images(self, folder, window).await
    }

    async fn list_images(
        &self,
        folder: &FolderId,
        window: &TimeWindow,
    ) -> DriveResult<Vec<DriveFile>> {
        DriveClient::list_images(self, folder, window).await
    }

    async fn download_file(&self, file_id: &str) -> DriveResult<Vec<u8>> {
        DriveClient::download_file(self, file_id).await
    }

    async fn upload_file(
        &self,
        folder: &FolderId,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> DriveResult<()> {
        DriveClient::upload_file(self, folder, name, data, content_type).await
    }

    async fn delete_artifacts(&self, folder: &FolderId) -> DriveResult<usize> {
        DriveClient::delete_artifacts(self, folder).await
    }

    async fn delete_images_before(
        &self,
        folder: &FolderId,
        before: DateTime<Utc>,
    ) -> DriveResult<usize> {
        DriveClient::delete_images_before(self, folder, before).await
    }
}
