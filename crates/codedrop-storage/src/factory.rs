use crate::{LocalStorage, Storage, StorageResult};
use codedrop_core::Config;
use std::sync::Arc;

/// Create the content-area backend described by configuration.
///
/// When `purge_content_on_startup` is set, objects left behind by a previous
/// process are removed before the backend is handed out. Their codes died with
/// that process, so nothing could ever reference them again.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.content_dir().clone()).await?;

    if config.purge_content_on_startup() {
        let removed = storage.clear().await?;
        if removed > 0 {
            tracing::info!(removed = removed, "Purged stale content from a previous run");
        }
    }

    Ok(Arc::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn config_for(dir: &std::path::Path, purge: bool) -> Config {
        let vars: HashMap<&str, String> = HashMap::from([
            ("CONTENT_DIR", dir.display().to_string()),
            ("PURGE_CONTENT_ON_STARTUP", purge.to_string()),
        ]);
        Config::from_source(|key| vars.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn test_startup_purge_removes_leftovers() {
        let dir = tempdir().unwrap();
        let first = create_storage(&config_for(dir.path(), true)).await.unwrap();
        let mut reader = std::io::Cursor::new(b"stale".to_vec());
        let stored = first
            .upload_stream("stale.txt", u64::MAX, &mut reader)
            .await
            .unwrap();

        let second = create_storage(&config_for(dir.path(), true)).await.unwrap();
        assert!(!second.exists(&stored.key).await.unwrap());
    }

    #[tokio::test]
    async fn test_startup_purge_can_be_disabled() {
        let dir = tempdir().unwrap();
        let first = create_storage(&config_for(dir.path(), false)).await.unwrap();
        let mut reader = std::io::Cursor::new(b"kept".to_vec());
        let stored = first
            .upload_stream("kept.txt", u64::MAX, &mut reader)
            .await
            .unwrap();

        let second = create_storage(&config_for(dir.path(), false)).await.unwrap();
        assert!(second.exists(&stored.key).await.unwrap());
    }
}
