//! Subscription and config storage.
//!
//! `JsonFileStore` keeps one JSON blob per table in a data directory,
//! `MemoryStore` keeps everything in process.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use substrack_core::config::NotificationConfig;
use substrack_core::error::{Result, SubsTrackError};
use substrack_core::traits::{ConfigProvider, SubscriptionStore};
use substrack_core::types::Subscription;
use tokio::sync::RwLock;

pub const SUBSCRIPTIONS_FILE: &str = "subscriptions.json";
pub const CONFIG_FILE: &str = "config.json";

/// File-based store: `subscriptions.json` and `config.json` in one directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Blob contents, `None` when the file does not exist yet.
    async fn read_blob(&self, file: &str) -> std::io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.dir.join(file)).await {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write via a temp file and rename so readers never see a partial blob.
    async fn write_blob(&self, file: &str, contents: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file);
        let tmp = self.dir.join(format!(".{file}.tmp"));
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &path).await
    }
}

#[async_trait]
impl SubscriptionStore for JsonFileStore {
    async fn get_all(&self) -> Result<Vec<Subscription>> {
        let blob = self
            .read_blob(SUBSCRIPTIONS_FILE)
            .await
            .map_err(|e| SubsTrackError::store(format!("read {SUBSCRIPTIONS_FILE}: {e}")))?;
        match blob {
            Some(text) => serde_json::from_str(&text)
                .map_err(|e| SubsTrackError::store(format!("parse {SUBSCRIPTIONS_FILE}: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    async fn put_all(&self, subscriptions: &[Subscription]) -> Result<()> {
        let text = serde_json::to_string_pretty(subscriptions)?;
        self.write_blob(SUBSCRIPTIONS_FILE, &text)
            .await
            .map_err(|e| SubsTrackError::store(format!("write {SUBSCRIPTIONS_FILE}: {e}")))?;
        tracing::debug!(count = subscriptions.len(), "💾 Wrote {}", self.dir.join(SUBSCRIPTIONS_FILE).display());
        Ok(())
    }
}

#[async_trait]
impl ConfigProvider for JsonFileStore {
    async fn get_config(&self) -> Result<NotificationConfig> {
        let blob = self
            .read_blob(CONFIG_FILE)
            .await
            .map_err(|e| SubsTrackError::config(format!("read {CONFIG_FILE}: {e}")))?;
        match blob {
            Some(text) => NotificationConfig::from_json(&text)
                .map_err(|e| SubsTrackError::config(format!("parse {CONFIG_FILE}: {e}"))),
            None => Ok(NotificationConfig::default()),
        }
    }
}

/// In-process store for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    subscriptions: RwLock<Vec<Subscription>>,
    config: RwLock<NotificationConfig>,
    put_count: AtomicUsize,
    fail_reads: AtomicBool,
    fail_config: AtomicBool,
}

impl MemoryStore {
    pub fn new(subscriptions: Vec<Subscription>, config: NotificationConfig) -> Self {
        Self {
            subscriptions: RwLock::new(subscriptions),
            config: RwLock::new(config),
            ..Default::default()
        }
    }

    /// Number of `put_all` calls so far.
    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<Subscription> {
        self.subscriptions.read().await.clone()
    }

    /// Make `get_all` fail until reset.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `get_config` fail until reset.
    pub fn fail_config(&self, fail: bool) {
        self.fail_config.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<Subscription>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SubsTrackError::store("memory store reads disabled"));
        }
        Ok(self.subscriptions.read().await.clone())
    }

    async fn put_all(&self, subscriptions: &[Subscription]) -> Result<()> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        *self.subscriptions.write().await = subscriptions.to_vec();
        Ok(())
    }
}

#[async_trait]
impl ConfigProvider for MemoryStore {
    async fn get_config(&self) -> Result<NotificationConfig> {
        if self.fail_config.load(Ordering::SeqCst) {
            return Err(SubsTrackError::config("memory config reads disabled"));
        }
        Ok(self.config.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrack_core::config::ReminderMode;

    #[tokio::test]
    async fn test_missing_files_give_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data"));
        assert!(store.get_all().await.unwrap().is_empty());
        assert_eq!(store.get_config().await.unwrap(), NotificationConfig::default());
    }

    #[tokio::test]
    async fn test_put_then_get_keeps_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        tokio::fs::write(
            dir.path().join(SUBSCRIPTIONS_FILE),
            r#"[{"id":"1","name":"Netflix","price":"15.99","isActive":true}]"#,
        )
        .await
        .unwrap();

        let mut subs = store.get_all().await.unwrap();
        subs[0].updated_at = Some("2024-01-10T08:00:00.000Z".into());
        store.put_all(&subs).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SUBSCRIPTIONS_FILE)).unwrap()).unwrap();
        assert_eq!(raw[0]["price"], "15.99");
        assert_eq!(raw[0]["updatedAt"], "2024-01-10T08:00:00.000Z");
        assert!(!dir.path().join(format!(".{SUBSCRIPTIONS_FILE}.tmp")).exists());
    }

    #[tokio::test]
    async fn test_config_blob_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"ENABLED_NOTIFIERS":["bark"],"REMINDER_MODE":"DAILY","BARK_KEY":"k"}"#,
        )
        .unwrap();
        let config = JsonFileStore::new(dir.path()).get_config().await.unwrap();
        assert_eq!(config.enabled_channels, vec!["bark".to_string()]);
        assert_eq!(config.reminder_mode, ReminderMode::Daily);
    }

    #[tokio::test]
    async fn test_corrupt_blobs_are_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SUBSCRIPTIONS_FILE), "{not json").unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[1, 2").unwrap();
        let store = JsonFileStore::new(dir.path());

        let err = store.get_all().await.unwrap_err();
        assert!(matches!(err, SubsTrackError::StoreUnavailable(_)));
        let err = store.get_config().await.unwrap_err();
        assert!(matches!(err, SubsTrackError::ConfigUnavailable(_)));
    }

    #[tokio::test]
    async fn test_memory_store_counts_writes_and_fails_on_demand() {
        let store = MemoryStore::new(vec![Subscription::new("a", "A")], NotificationConfig::default());
        assert_eq!(store.get_all().await.unwrap().len(), 1);

        store.put_all(&[]).await.unwrap();
        assert_eq!(store.put_count(), 1);
        assert!(store.snapshot().await.is_empty());

        store.fail_reads(true);
        assert!(store.get_all().await.is_err());
        store.fail_config(true);
        assert!(store.get_config().await.is_err());
    }
}
