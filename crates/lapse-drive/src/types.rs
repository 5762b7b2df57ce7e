//! Drive REST API types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Opaque Drive folder identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FolderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One file entry from a `files.list` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

/// A `files.list` response page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_list_deserializes_drive_payload() {
        let json = r#"{
            "files": [
                {"id": "abc", "name": "0001.jpg", "mimeType": "image/jpeg",
                 "createdTime": "2024-03-14T06:15:00.000Z"}
            ],
            "nextPageToken": "tok"
        }"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 1);
        assert_eq!(list.files[0].name, "0001.jpg");
        assert_eq!(list.files[0].mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(list.next_page_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_file_list_tolerates_missing_fields() {
        let list: FileList = serde_json::from_str(r#"{"files": [{"id": "x"}]}"#).unwrap();
        assert_eq!(list.files[0].id, "x");
        assert!(list.files[0].name.is_empty());
        assert!(list.next_page_token.is_none());
    }
}
