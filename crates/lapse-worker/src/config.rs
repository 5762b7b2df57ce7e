//! Worker configuration.

use lapse_media::OutputFormat;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
///
/// The folder names mirror the Drive hierarchy the camera uploads into:
/// `root / site / camera / {image, timelapse/{hourly,daily,weekly}}`.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Drive folder id of the shared root. Required.
    pub root_folder_id: String,
    /// Site folder name under the root.
    pub site_folder: String,
    /// Camera folder name under the site.
    pub camera_folder: String,
    /// Source image folder name under the camera.
    pub image_folder: String,
    /// Timelapse output root name under the camera.
    pub timelapse_folder: String,
    /// Container format for produced artifacts.
    pub output_format: OutputFormat,
    /// Whether the minimum-image gate applies before building.
    pub enforce_thresholds: bool,
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let root_folder_id = std::env::var("DRIVE_ROOT_FOLDER_ID")
            .map_err(|_| WorkerError::config_error("DRIVE_ROOT_FOLDER_ID not set"))?;

        let output_format = std::env::var("LAPSE_OUTPUT_FORMAT")
            .unwrap_or_else(|_| "mp4".to_string())
            .parse::<OutputFormat>()
            .map_err(|e| WorkerError::config_error(format!("LAPSE_OUTPUT_FORMAT: {}", e)))?;

        let enforce_thresholds = std::env::var("LAPSE_ENFORCE_THRESHOLDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);

        Ok(Self {
            root_folder_id,
            site_folder: std::env::var("LAPSE_SITE_FOLDER")
                .unwrap_or_else(|_| "10botics.com".to_string()),
            camera_folder: std::env::var("LAPSE_CAMERA_FOLDER")
                .unwrap_or_else(|_| "cam1".to_string()),
            image_folder: std::env::var("LAPSE_IMAGE_FOLDER")
                .unwrap_or_else(|_| "image".to_string()),
            timelapse_folder: std::env::var("LAPSE_TIMELAPSE_FOLDER")
                .unwrap_or_else(|_| "timelapse".to_string()),
            output_format,
            enforce_thresholds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "DRIVE_ROOT_FOLDER_ID",
            "LAPSE_SITE_FOLDER",
            "LAPSE_CAMERA_FOLDER",
            "LAPSE_IMAGE_FOLDER",
            "LAPSE_TIMELAPSE_FOLDER",
            "LAPSE_OUTPUT_FORMAT",
            "LAPSE_ENFORCE_THRESHOLDS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_requires_root_folder() {
        clear_env();
        assert!(matches!(
            WorkerConfig::from_env(),
            Err(WorkerError::ConfigError(_))
        ));
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();
        std::env::set_var("DRIVE_ROOT_FOLDER_ID", "root-id");
        let config = WorkerConfig::from_env().unwrap();
        assert_eq!(config.root_folder_id, "root-id");
        assert_eq!(config.camera_folder, "cam1");
        assert_eq!(config.image_folder, "image");
        assert_eq!(config.timelapse_folder, "timelapse");
        assert_eq!(config.output_format, OutputFormat::Mp4);
        assert!(config.enforce_thresholds);
    }

    #[test]
    #[serial]
    fn test_config_parses_overrides() {
        clear_env();
        std::env::set_var("DRIVE_ROOT_FOLDER_ID", "root-id");
        std::env::set_var("LAPSE_OUTPUT_FORMAT", "gif");
        std::env::set_var("LAPSE_ENFORCE_THRESHOLDS", "false");
        std::env::set_var("LAPSE_CAMERA_FOLDER", "cam2");
        let config = WorkerConfig::from_env().unwrap();
        assert_eq!(config.output_format, OutputFormat::Gif);
        assert!(!config.enforce_thresholds);
        assert_eq!(config.camera_folder, "cam2");
    }

    #[test]
    #[serial]
    fn test_config_rejects_unknown_format() {
        clear_env();
        std::env::set_var("DRIVE_ROOT_FOLDER_ID", "root-id");
        std::env::set_var("LAPSE_OUTPUT_FORMAT", "webm");
        assert!(matches!(
            WorkerConfig::from_env(),
            Err(WorkerError::ConfigError(_))
        ));
    }
}
