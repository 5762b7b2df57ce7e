//! Google Drive v3 REST API client.
//!
//! Thin typed wrapper over the `files` endpoint with:
//! - Service-account authentication via gcp_auth, with token caching
//! - Exponential backoff with jitter on transient failures
//! - Full pagination of list queries
//! - Observability (tracing spans, request metrics)
//!
//! Every call passes `supportsAllDrives` so the client works against shared
//! drives as well as "My Drive" folders.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::header::{CONTENT_TYPE, LOCATION, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, info_span, warn, Instrument};

use lapse_models::TimeWindow;

use crate::error::{DriveError, DriveResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::token_cache::TokenCache;
use crate::types::{DriveFile, FileList, FolderId};

// =============================================================================
// Constants
// =============================================================================

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// MIME filter for source images.
const IMAGE_MIME_FILTER: &str =
    "(mimeType='image/jpeg' or mimeType='image/png' or mimeType='image/jpg')";

/// MIME filter for produced timelapse artifacts.
const ARTIFACT_MIME_FILTER: &str = "(mimeType='image/gif' or mimeType='video/mp4')";

const PAGE_SIZE: &str = "1000";

// =============================================================================
// Configuration
// =============================================================================

/// Drive client configuration.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl DriveConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let timeout_secs: u64 = std::env::var("DRIVE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let connect_timeout_secs: u64 = std::env::var("DRIVE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Self {
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Google Drive REST API client.
pub struct DriveClient {
    http: Client,
    config: DriveConfig,
    files_url: String,
    upload_url: String,
    token_cache: Arc<TokenCache>,
}

impl Clone for DriveClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            files_url: self.files_url.clone(),
            upload_url: self.upload_url.clone(),
            token_cache: Arc::clone(&self.token_cache),
        }
    }
}

impl DriveClient {
    /// Create a new Drive client.
    pub fn new(config: DriveConfig) -> DriveResult<Self> {
        let auth = Self::create_auth_provider()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("lapse-drive/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DriveError::Network)?;

        Ok(Self {
            http,
            config,
            files_url: FILES_URL.to_string(),
            upload_url: UPLOAD_URL.to_string(),
            token_cache: Arc::new(TokenCache::new(auth)),
        })
    }

    fn create_auth_provider() -> DriveResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env()
            .map_err(|e| DriveError::auth_error(format!("Failed to load service account: {}", e)))?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(DriveError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> DriveResult<Self> {
        Self::new(DriveConfig::from_env())
    }

    /// Client wired to a local mock server with a canned token.
    #[cfg(test)]
    pub(crate) fn for_tests(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            config: DriveConfig {
                timeout: Duration::from_secs(5),
                connect_timeout: Duration::from_secs(2),
                retry: RetryConfig {
                    max_retries: 0,
                    base_delay_ms: 1,
                    max_delay_ms: 2,
                },
            },
            files_url: format!("{}/drive/v3/files", base_url),
            upload_url: format!("{}/upload/drive/v3/files", base_url),
            token_cache: Arc::new(TokenCache::with_static_token("test-token")),
        }
    }

    async fn get_token(&self) -> DriveResult<String> {
        self.token_cache.get_token().await
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("UNAUTHENTICATED")
            || body.contains("Invalid Credentials")
            || body.contains("authError")
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Run a request future under a span, recording request metrics.
    async fn execute_request<T, F>(&self, operation: &str, fut: F) -> DriveResult<T>
    where
        F: std::future::Future<Output = DriveResult<T>>,
    {
        let span = info_span!("drive_request", operation = %operation);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    /// Send an authorized request, refreshing the token once on a stale-token
    /// 401 (the same request is rebuilt and resent with the fresh token).
    async fn send_with_auth(
        &self,
        build: impl Fn(&str) -> RequestBuilder,
    ) -> DriveResult<Response> {
        let mut token = self.get_token().await?;
        let mut response = build(&token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            if Self::is_access_token_expired(&body) {
                self.token_cache.invalidate().await;
                token = self.get_token().await?;
                response = build(&token).send().await?;
            } else {
                return Err(DriveError::from_http_status(401, body));
            }
        }

        Ok(response)
    }

    /// Map a non-success response to a typed error, consuming the body.
    async fn check_status(operation: &str, response: Response) -> DriveResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(DriveError::RateLimited(retry_after_ms));
        }

        let body = response.text().await.unwrap_or_default();
        Err(DriveError::from_http_status(
            status.as_u16(),
            format!("{} failed: {}", operation, body),
        ))
    }

    /// Fetch one `files.list` page.
    async fn list_page(
        &self,
        operation: &str,
        query: &str,
        order_by: Option<&str>,
        fields: &str,
        page_token: Option<&str>,
    ) -> DriveResult<FileList> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("fields", format!("nextPageToken, {}", fields)),
            ("pageSize", PAGE_SIZE.to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("includeItemsFromAllDrives", "true".to_string()),
        ];
        if let Some(order_by) = order_by {
            params.push(("orderBy", order_by.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let response = self
            .send_with_auth(|token| self.http.get(&self.files_url).query(&params).bearer_auth(token))
            .await?;
        let response = Self::check_status(operation, response).await?;
        Ok(response.json().await?)
    }

    /// Fetch every page of a `files.list` query.
    async fn list_all(
        &self,
        operation: &str,
        query: &str,
        order_by: Option<&str>,
        fields: &str,
    ) -> DriveResult<Vec<DriveFile>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = with_retry(&self.config.retry, operation, || {
                self.list_page(operation, query, order_by, fields, page_token.as_deref())
            })
            .await?;

            files.extend(page.files);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }

    // =========================================================================
    // Folder operations
    // =========================================================================

    /// Verify the folder is reachable with the current credentials.
    ///
    /// Used on the configured root before any cadence runs; a failure here
    /// is fatal to the whole invocation.
    pub async fn verify_folder(&self, folder: &FolderId) -> DriveResult<String> {
        let url = format!("{}/{}", self.files_url, folder);
        let params: Vec<(&str, String)> = vec![
            ("fields", "id, name".to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];

        self.execute_request("verify_folder", async {
            let file: DriveFile = with_retry(&self.config.retry, "verify_folder", || async {
                let response = self
                    .send_with_auth(|token| self.http.get(&url).query(&params).bearer_auth(token))
                    .await?;
                let response = Self::check_status("verify_folder", response).await?;
                Ok(response.json().await?)
            })
            .await?;

            debug!(folder = %folder, name = %file.name, "Folder verified");
            Ok(file.name)
        })
        .await
    }

    /// Find a child folder by name, creating it when absent. Idempotent.
    pub async fn find_or_create_folder(
        &self,
        parent: &FolderId,
        name: &str,
    ) -> DriveResult<FolderId> {
        let query = format!(
            "'{}' in parents and name = '{}' and mimeType = '{}' and trashed = false",
            parent,
            escape_query_value(name),
            FOLDER_MIME,
        );

        self.execute_request("find_or_create_folder", async {
            let existing = self
                .list_all("find_or_create_folder", &query, None, "files(id, name)")
                .await?;
            if let Some(folder) = existing.first() {
                debug!(name = %name, id = %folder.id, "Found folder");
                return Ok(FolderId::new(&folder.id));
            }

            let body = serde_json::json!({
                "name": name,
                "mimeType": FOLDER_MIME,
                "parents": [parent.as_str()],
            });
            let params: Vec<(&str, String)> = vec![
                ("fields", "id".to_string()),
                ("supportsAllDrives", "true".to_string()),
            ];

            let created: CreatedFile =
                with_retry(&self.config.retry, "create_folder", || async {
                    let response = self
                        .send_with_auth(|token| {
                            self.http
                                .post(&self.files_url)
                                .query(&params)
                                .bearer_auth(token)
                                .json(&body)
                        })
                        .await?;
                    let response = Self::check_status("create_folder", response).await?;
                    Ok(response.json().await?)
                })
                .await?;

            info!(name = %name, id = %created.id, "Created folder");
            Ok(FolderId::new(created.id))
        })
        .await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Check whether a file with this exact name exists in the folder.
    pub async fn artifact_exists(&self, folder: &FolderId, name: &str) -> DriveResult<bool> {
        let query = format!(
            "'{}' in parents and name = '{}' and trashed = false",
            folder,
            escape_query_value(name),
        );

        self.execute_request("artifact_exists", async {
            let files = self
                .list_all("artifact_exists", &query, None, "files(id)")
                .await?;
            Ok(!files.is_empty())
        })
        .await
    }

    /// Count source images whose `createdTime` falls inside the window.
    pub async fn count_images(&self, folder: &FolderId, window: &TimeWindow) -> DriveResult<usize> {
        let query = images_in_window_query(folder, window);

        self.execute_request("count_images", async {
            let files = self.list_all("count_images", &query, None, "files(id)").await?;
            Ok(files.len())
        })
        .await
    }

    /// List source images inside the window, oldest first.
    pub async fn list_images(
        &self,
        folder: &FolderId,
        window: &TimeWindow,
    ) -> DriveResult<Vec<DriveFile>> {
        let query = images_in_window_query(folder, window);

        self.execute_request("list_images", async {
            self.list_all(
                "list_images",
                &query,
                Some("createdTime"),
                "files(id, name, mimeType, createdTime)",
            )
            .await
        })
        .await
    }

    // =========================================================================
    // Content transfer
    // =========================================================================

    /// Download a file's content.
    pub async fn download_file(&self, file_id: &str) -> DriveResult<Vec<u8>> {
        let url = format!("{}/{}", self.files_url, file_id);
        let params: Vec<(&str, String)> = vec![
            ("alt", "media".to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];

        self.execute_request("download_file", async {
            with_retry(&self.config.retry, "download_file", || async {
                let response = self
                    .send_with_auth(|token| self.http.get(&url).query(&params).bearer_auth(token))
                    .await?;
                let response = Self::check_status("download_file", response).await?;
                Ok(response.bytes().await?.to_vec())
            })
            .await
        })
        .await
    }

    /// Upload a file via a resumable session.
    ///
    /// Two-step: initiate a session for the metadata, then PUT the content
    /// to the returned session URL. A transient failure restarts the whole
    /// session rather than resuming a partial upload.
    pub async fn upload_file(
        &self,
        folder: &FolderId,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> DriveResult<()> {
        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder.as_str()],
        });
        let params: Vec<(&str, String)> = vec![
            ("uploadType", "resumable".to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];

        self.execute_request("upload_file", async {
            with_retry(&self.config.retry, "upload_file", || async {
                let response = self
                    .send_with_auth(|token| {
                        self.http
                            .post(&self.upload_url)
                            .query(&params)
                            .bearer_auth(token)
                            .header("X-Upload-Content-Type", content_type)
                            .header("X-Upload-Content-Length", data.len())
                            .json(&metadata)
                    })
                    .await?;
                let response = Self::check_status("upload_file", response).await?;

                let session_url = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        DriveError::upload_failed("resumable session returned no Location")
                    })?;

                let put = self
                    .http
                    .put(&session_url)
                    .header(CONTENT_TYPE, content_type)
                    .body(data.clone())
                    .send()
                    .await?;
                Self::check_status("upload_file", put).await?;
                Ok(())
            })
            .await?;

            info!(name = %name, folder = %folder, bytes = data.len(), "Uploaded file");
            Ok(())
        })
        .await
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Delete a single file.
    pub async fn delete_file(&self, file_id: &str) -> DriveResult<()> {
        let url = format!("{}/{}", self.files_url, file_id);
        let params: Vec<(&str, String)> = vec![("supportsAllDrives", "true".to_string())];

        with_retry(&self.config.retry, "delete_file", || async {
            let response = self
                .send_with_auth(|token| self.http.delete(&url).query(&params).bearer_auth(token))
                .await?;
            Self::check_status("delete_file", response).await?;
            Ok(())
        })
        .await
    }

    /// Delete every timelapse artifact (MP4/GIF) in a folder.
    ///
    /// Best-effort: individual delete failures are logged and skipped.
    /// Returns the number of files actually deleted.
    pub async fn delete_artifacts(&self, folder: &FolderId) -> DriveResult<usize> {
        let query = format!(
            "'{}' in parents and {} and trashed = false",
            folder, ARTIFACT_MIME_FILTER,
        );

        self.execute_request("delete_artifacts", async {
            let files = self
                .list_all("delete_artifacts", &query, None, "files(id)")
                .await?;
            Ok(self.delete_each(&files, folder.as_str()).await)
        })
        .await
    }

    /// Delete every file in a folder created strictly before `before`.
    ///
    /// Files created at or after the bound are never touched. Best-effort
    /// per file, like [`Self::delete_artifacts`].
    pub async fn delete_images_before(
        &self,
        folder: &FolderId,
        before: chrono::DateTime<chrono::Utc>,
    ) -> DriveResult<usize> {
        let bound = before.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let query = format!(
            "'{}' in parents and createdTime < '{}' and trashed = false",
            folder, bound,
        );

        self.execute_request("delete_images_before", async {
            let files = self
                .list_all("delete_images_before", &query, None, "files(id)")
                .await?;
            Ok(self.delete_each(&files, folder.as_str()).await)
        })
        .await
    }

    async fn delete_each(&self, files: &[DriveFile], folder: &str) -> usize {
        let mut deleted = 0;
        for file in files {
            match self.delete_file(&file.id).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!(file = %file.id, folder = %folder, "Delete failed: {}", e),
            }
        }
        info!(folder = %folder, deleted, total = files.len(), "Deleted files");
        deleted
    }
}

/// Escape a value interpolated into a Drive `q` expression.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn images_in_window_query(folder: &FolderId, window: &TimeWindow) -> String {
    format!(
        "'{}' in parents and createdTime >= '{}' and createdTime < '{}' and {} and trashed = false",
        folder,
        window.start_rfc3339_utc(),
        window.end_rfc3339_utc(),
        IMAGE_MIME_FILTER,
    )
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

// =============================================================================
// Tests
// =============================================================================
