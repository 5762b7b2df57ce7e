//! Timelapse batch worker.
//!
//! Run-to-completion job: resolve the Drive folder hierarchy, then for each
//! cadence (hourly, daily, weekly) decide whether an artifact is due, build
//! and upload it, and compact the tiers it subsumes.

pub mod config;
pub mod error;
pub mod folders;
pub mod policy;
pub mod processor;
pub mod storage;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use folders::FolderTree;
pub use processor::{run_batch, run_batch_at, BatchContext, CadenceReport};
pub use storage::Storage;
