//! Profile snapshots read from disk, for offline syncs and fixtures.

use std::path::PathBuf;

use arsenal_core::{Platform, ProfileSnapshot};
use async_trait::async_trait;
use tracing::info;

use crate::source::{FetchError, ProfileSource};

/// Reads one snapshot JSON file regardless of which player is requested.
pub struct FileProfileSource {
    path: PathBuf,
}

impl FileProfileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProfileSource for FileProfileSource {
    async fn fetch(
        &self,
        natural_id: &str,
        platform: Platform,
    ) -> Result<ProfileSnapshot, FetchError> {
        info!(path = %self.path.display(), natural_id, %platform, "reading profile snapshot");
        let text = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_snapshot_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("profile.json");
        std::fs::write(
            &path,
            r#"{"displayName": "Tenno123", "xp": [{"naturalKey": "/a", "xp": 10}]}"#,
        )
        .unwrap();

        let snapshot = FileProfileSource::new(&path)
            .fetch("tenno", Platform::Pc)
            .await
            .unwrap();
        assert_eq!(snapshot.display_name.as_deref(), Some("Tenno123"));
        assert_eq!(snapshot.xp.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_transport_failure() {
        let err = FileProfileSource::new("/nonexistent/profile.json")
            .fetch("tenno", Platform::Pc)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test]
    async fn malformed_json_is_transport_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("profile.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileProfileSource::new(&path)
            .fetch("tenno", Platform::Pc)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Json(_)));
    }
}
