//! Google Drive REST API client.
//!
//! This crate provides:
//! - Service account authentication via gcp_auth, with token caching
//! - Folder verification and find-or-create resolution
//! - Windowed image queries (count, ordered list)
//! - File download, resumable upload, and predicate deletion
//! - Retry with exponential backoff and request metrics

pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod token_cache;
pub mod types;

pub use client::{DriveClient, DriveConfig};
pub use error::{DriveError, DriveResult};
pub use retry::RetryConfig;
pub use types::{DriveFile, FileList, FolderId};
