//! The code store: TTL-bound entries keyed by transfer code.
//!
//! Only metadata operations run under the lock. Content deletion happens after an
//! entry has been detached from the map, so no I/O ever blocks other callers and
//! an entry's content is purged by exactly one path: whichever caller detached it.
//! Purges that outlive their caller run on the store's task tracker.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use codedrop_core::{AppError, Code, CodeEntry, ObjectRecord};
use codedrop_storage::Storage;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;

use crate::code::CodeGenerator;

struct StoreInner {
    entries: HashMap<Code, CodeEntry>,
    generator: CodeGenerator,
}

pub struct Store {
    inner: Mutex<StoreInner>,
    storage: Arc<dyn Storage>,
    ttl: chrono::Duration,
    cleanups: TaskTracker,
}

impl Store {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self::with_generator(storage, ttl, CodeGenerator::new())
    }

    pub fn with_generator(storage: Arc<dyn Storage>, ttl: Duration, generator: CodeGenerator) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        Self {
            inner: Mutex::new(StoreInner {
                entries: HashMap::new(),
                generator,
            }),
            storage,
            ttl,
            cleanups: TaskTracker::new(),
        }
    }

    /// Entry lifetime in whole seconds.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl.num_seconds().max(0) as u64
    }

    /// Register `records` under a fresh code.
    ///
    /// The entry is visible to [`Store::get`] and [`Store::take`] as soon as this
    /// returns. Empty record lists are rejected.
    pub async fn put(&self, records: Vec<ObjectRecord>) -> Result<CodeEntry, AppError> {
        self.put_at(records, Utc::now()).await
    }

    pub async fn put_at(
        &self,
        records: Vec<ObjectRecord>,
        now: DateTime<Utc>,
    ) -> Result<CodeEntry, AppError> {
        if records.is_empty() {
            return Err(AppError::NoFileProvided);
        }

        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        // Expired-but-unswept entries still occupy their code until detached.
        let code = inner
            .generator
            .generate(|candidate| inner.entries.contains_key(candidate))?;
        let entry = CodeEntry::new(code.clone(), records, now, self.ttl);
        inner.entries.insert(code.clone(), entry.clone());
        let live = inner.entries.len();
        drop(guard);

        tracing::info!(
            code = %code,
            files = entry.records().len(),
            total_bytes = entry.total_bytes(),
            live_codes = live,
            "Code issued"
        );

        Ok(entry)
    }

    /// Read-only lookup. An expired entry is treated as absent and removed.
    pub async fn get(&self, code: &Code) -> Option<CodeEntry> {
        self.get_at(code, Utc::now()).await
    }

    pub async fn get_at(&self, code: &Code, now: DateTime<Utc>) -> Option<CodeEntry> {
        let expired = {
            let mut inner = self.inner.lock().await;
            let entry = inner.entries.get(code)?;
            if !entry.is_expired_at(now) {
                return Some(entry.clone());
            }
            inner.entries.remove(code)
        };

        if let Some(entry) = expired {
            tracing::debug!(code = %code, "Expired code removed on lookup");
            self.purge(&entry).await;
        }
        None
    }

    /// Atomic lookup-and-remove. Of any number of concurrent calls for one code,
    /// at most one returns the entry.
    ///
    /// The caller owns the returned entry's content and must hand it back through
    /// [`Store::release`] once done with it.
    pub async fn take(&self, code: &Code) -> Option<CodeEntry> {
        self.take_at(code, Utc::now()).await
    }

    pub async fn take_at(&self, code: &Code, now: DateTime<Utc>) -> Option<CodeEntry> {
        let entry = self.inner.lock().await.entries.remove(code)?;

        if entry.is_expired_at(now) {
            tracing::debug!(code = %code, "Expired code removed on take");
            self.purge(&entry).await;
            return None;
        }

        tracing::info!(code = %code, "Code consumed");
        Some(entry)
    }

    /// Remove an entry and its content. Returns whether this call removed it.
    pub async fn remove(&self, code: &Code) -> bool {
        let removed = self.inner.lock().await.entries.remove(code);
        match removed {
            Some(entry) => {
                self.purge(&entry).await;
                tracing::info!(code = %code, "Code removed");
                true
            }
            None => false,
        }
    }

    /// Delete the content of an entry previously detached by [`Store::take`].
    pub async fn release(&self, entry: CodeEntry) {
        self.purge(&entry).await;
        tracing::debug!(code = %entry.code(), "Released consumed code content");
    }

    /// Remove every expired entry and return how many were removed.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let (expired, remaining) = {
            let mut inner = self.inner.lock().await;
            let expired_codes: Vec<Code> = inner
                .entries
                .values()
                .filter(|entry| entry.is_expired_at(now))
                .map(|entry| entry.code().clone())
                .collect();
            let expired: Vec<CodeEntry> = expired_codes
                .iter()
                .filter_map(|code| inner.entries.remove(code))
                .collect();
            (expired, inner.entries.len())
        };

        for entry in &expired {
            tracing::info!(
                code = %entry.code(),
                expires_at = %entry.expires_at(),
                "Deleting expired code"
            );
            self.purge(entry).await;
        }

        if !expired.is_empty() {
            tracing::info!(
                removed = expired.len(),
                live_codes = remaining,
                "Sweep completed"
            );
        }

        expired.len()
    }

    /// Number of entries currently held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of entries that have not yet expired.
    pub async fn live_len(&self) -> usize {
        self.live_len_at(Utc::now()).await
    }

    pub async fn live_len_at(&self, now: DateTime<Utc>) -> usize {
        self.inner
            .lock()
            .await
            .entries
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    /// Run a content cleanup in the background, tracked until [`Store::clear`].
    ///
    /// Returns false when no runtime is available and the cleanup did not start.
    pub fn spawn_cleanup<F>(&self, cleanup: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                self.cleanups.spawn_on(cleanup, &handle);
                true
            }
            Err(_) => false,
        }
    }

    /// Drain every entry, purge its content and wait for background cleanups.
    pub async fn clear(&self) -> usize {
        let drained: Vec<CodeEntry> = {
            let mut inner = self.inner.lock().await;
            inner.entries.drain().map(|(_, entry)| entry).collect()
        };

        for entry in &drained {
            self.purge(entry).await;
        }

        let pending = self.cleanups.len();
        self.cleanups.close();
        self.cleanups.wait().await;
        self.cleanups.reopen();

        tracing::info!(
            removed = drained.len(),
            pending_cleanups = pending,
            "Store cleared"
        );
        drained.len()
    }

    /// Delete the content of every record. Failures are logged and never stop the
    /// remaining deletions.
    async fn purge(&self, entry: &CodeEntry) {
        for record in entry.records() {
            match self.storage.delete(record.content_location()).await {
                Ok(_) => {
                    tracing::debug!(
                        storage_key = %record.content_location(),
                        "Successfully deleted from storage"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        code = %entry.code(),
                        storage_key = %record.content_location(),
                        "Failed to delete file from storage, continuing"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::ScriptedSource;
    use codedrop_storage::LocalStorage;
    use std::collections::HashSet;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        storage: Arc<dyn Storage>,
        store: Arc<Store>,
    }

    async fn fixture(ttl_secs: u64) -> Fixture {
        let dir = tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let store = Arc::new(Store::new(storage.clone(), Duration::from_secs(ttl_secs)));
        Fixture {
            _dir: dir,
            storage,
            store,
        }
    }

    async fn stored_record(storage: &Arc<dyn Storage>, name: &str, data: &[u8]) -> ObjectRecord {
        let mut reader = std::io::Cursor::new(data.to_vec());
        let stored = storage
            .upload_stream(name, u64::MAX, &mut reader)
            .await
            .unwrap();
        ObjectRecord::new(stored.key, name, "text/plain", stored.size_bytes)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let f = fixture(600).await;
        let record = stored_record(&f.storage, "a.txt", b"0123456789").await;

        let entry = f.store.put(vec![record.clone()]).await.unwrap();
        let found = f.store.get(entry.code()).await.unwrap();

        assert_eq!(found.records(), &[record]);
        assert_eq!(found.expires_at() - found.created_at(), chrono::Duration::seconds(600));
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_put_rejects_empty_records() {
        let f = fixture(600).await;
        let result = f.store.put(Vec::new()).await;
        assert!(matches!(result, Err(AppError::NoFileProvided)));
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_puts_yield_unique_codes() {
        let f = fixture(600).await;
        let mut handles = Vec::new();
        for i in 0..200 {
            let store = f.store.clone();
            handles.push(tokio::spawn(async move {
                let record = ObjectRecord::new(format!("objects/{}", i), "x", "text/plain", 1);
                store.put(vec![record]).await.unwrap().code().clone()
            }));
        }

        let mut codes = HashSet::new();
        for handle in handles {
            assert!(codes.insert(handle.await.unwrap()));
        }
        assert_eq!(codes.len(), 200);
        assert_eq!(f.store.len().await, 200);
    }

    #[tokio::test]
    async fn test_put_retries_on_collision() {
        let dir = tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let generator = CodeGenerator::with_source(
            ScriptedSource::new(vec![111_111, 111_111, 111_111, 222_222]),
            10,
        );
        let store = Store::with_generator(storage, Duration::from_secs(600), generator);

        let first = store
            .put(vec![ObjectRecord::new("objects/a", "a", "text/plain", 1)])
            .await
            .unwrap();
        let second = store
            .put(vec![ObjectRecord::new("objects/b", "b", "text/plain", 1)])
            .await
            .unwrap();

        assert_eq!(first.code().as_str(), "111111");
        assert_eq!(second.code().as_str(), "222222");
    }

    #[tokio::test]
    async fn test_exhausted_code_space_is_an_error() {
        let dir = tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let generator = CodeGenerator::with_source(ScriptedSource::new(vec![333_333]), 3);
        let store = Store::with_generator(storage, Duration::from_secs(600), generator);

        store
            .put(vec![ObjectRecord::new("objects/a", "a", "text/plain", 1)])
            .await
            .unwrap();
        let result = store
            .put(vec![ObjectRecord::new("objects/b", "b", "text/plain", 1)])
            .await;
        assert!(matches!(result, Err(AppError::CodeSpaceExhausted { .. })));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_invisible_before_sweep() {
        let f = fixture(600).await;
        let record = stored_record(&f.storage, "a.txt", b"data").await;
        let entry = f.store.put(vec![record.clone()]).await.unwrap();

        let later = entry.expires_at();
        assert!(f.store.get_at(entry.code(), later).await.is_none());
        // The lookup removed the entry and its content
        assert_eq!(f.store.len().await, 0);
        assert!(!f.storage.exists(record.content_location()).await.unwrap());
    }

    #[tokio::test]
    async fn test_take_on_expired_entry_returns_none() {
        let f = fixture(600).await;
        let record = stored_record(&f.storage, "a.txt", b"data").await;
        let entry = f.store.put(vec![record.clone()]).await.unwrap();

        let later = entry.expires_at() + chrono::Duration::seconds(1);
        assert!(f.store.take_at(entry.code(), later).await.is_none());
        assert!(!f.storage.exists(record.content_location()).await.unwrap());
    }

    #[tokio::test]
    async fn test_only_one_concurrent_take_succeeds() {
        let f = fixture(600).await;
        let record = stored_record(&f.storage, "a.txt", b"data").await;
        let code = f.store.put(vec![record]).await.unwrap().code().clone();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = f.store.clone();
            let code = code.clone();
            handles.push(tokio::spawn(async move { store.take(&code).await }));
        }

        let mut winners = 0;
        for handle in handles {
            if let Some(entry) = handle.await.unwrap() {
                winners += 1;
                f.store.release(entry).await;
            }
        }
        assert_eq!(winners, 1);
        assert!(f.store.get(&code).await.is_none());
    }

    #[tokio::test]
    async fn test_take_then_release_deletes_content() {
        let f = fixture(600).await;
        let record = stored_record(&f.storage, "a.txt", b"data").await;
        let code = f.store.put(vec![record.clone()]).await.unwrap().code().clone();

        let entry = f.store.take(&code).await.unwrap();
        // Content stays until released
        assert!(f.storage.exists(record.content_location()).await.unwrap());

        f.store.release(entry).await;
        assert!(!f.storage.exists(record.content_location()).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let f = fixture(600).await;
        let record = stored_record(&f.storage, "a.txt", b"data").await;
        let code = f.store.put(vec![record.clone()]).await.unwrap().code().clone();

        assert!(f.store.remove(&code).await);
        assert!(!f.store.remove(&code).await);
        assert!(!f.storage.exists(record.content_location()).await.unwrap());
        assert!(f.store.get(&code).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_continues_past_missing_content() {
        let f = fixture(600).await;
        let present = stored_record(&f.storage, "b.txt", b"data").await;
        let missing = ObjectRecord::new("objects/already-gone", "a.txt", "text/plain", 4);
        let code = f
            .store
            .put(vec![missing, present.clone()])
            .await
            .unwrap()
            .code()
            .clone();

        assert!(f.store.remove(&code).await);
        assert!(!f.storage.exists(present.content_location()).await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_entries() {
        let f = fixture(600).await;
        let old = stored_record(&f.storage, "old.txt", b"old").await;
        let fresh = stored_record(&f.storage, "new.txt", b"new").await;

        let start = Utc::now();
        let old_entry = f.store.put_at(vec![old.clone()], start).await.unwrap();
        let fresh_entry = f
            .store
            .put_at(vec![fresh.clone()], start + chrono::Duration::seconds(300))
            .await
            .unwrap();

        let removed = f.store.sweep_at(start + chrono::Duration::seconds(600)).await;
        assert_eq!(removed, 1);
        assert!(!f.storage.exists(old.content_location()).await.unwrap());
        assert!(f.storage.exists(fresh.content_location()).await.unwrap());
        assert!(f
            .store
            .get_at(old_entry.code(), start + chrono::Duration::seconds(600))
            .await
            .is_none());
        assert!(f
            .store
            .get_at(fresh_entry.code(), start + chrono::Duration::seconds(600))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_sweep_and_remove_race_purges_once() {
        let f = fixture(600).await;
        let record = stored_record(&f.storage, "a.txt", b"data").await;
        let entry = f.store.put(vec![record.clone()]).await.unwrap();
        let code = entry.code().clone();
        let later = entry.expires_at();

        let sweeper = {
            let store = f.store.clone();
            tokio::spawn(async move { store.sweep_at(later).await })
        };
        let remover = {
            let store = f.store.clone();
            tokio::spawn(async move { store.remove(&code).await })
        };

        let swept = sweeper.await.unwrap();
        let removed = remover.await.unwrap();
        assert_eq!(swept + usize::from(removed), 1);
        assert!(f.store.is_empty().await);
        assert!(!f.storage.exists(record.content_location()).await.unwrap());
    }

    #[tokio::test]
    async fn test_live_len_skips_expired_entries() {
        let f = fixture(600).await;
        let start = Utc::now();
        let old = f
            .store
            .put_at(vec![ObjectRecord::new("objects/a", "a", "text/plain", 1)], start)
            .await
            .unwrap();
        f.store
            .put_at(
                vec![ObjectRecord::new("objects/b", "b", "text/plain", 1)],
                start + chrono::Duration::seconds(300),
            )
            .await
            .unwrap();

        let now = old.expires_at();
        assert_eq!(f.store.len().await, 2);
        assert_eq!(f.store.live_len_at(now).await, 1);
        assert_eq!(f.store.live_len_at(start).await, 2);
    }

    #[tokio::test]
    async fn test_clear_waits_for_background_cleanups() {
        let f = fixture(600).await;
        let record = stored_record(&f.storage, "a.txt", b"data").await;
        let code = f.store.put(vec![record.clone()]).await.unwrap().code().clone();
        let entry = f.store.take(&code).await.unwrap();

        let store = f.store.clone();
        assert!(f.store.spawn_cleanup(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            store.release(entry).await;
        }));

        f.store.clear().await;
        assert!(!f.storage.exists(record.content_location()).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_drains_everything() {
        let f = fixture(600).await;
        let a = stored_record(&f.storage, "a.txt", b"a").await;
        let b = stored_record(&f.storage, "b.txt", b"b").await;
        f.store.put(vec![a.clone()]).await.unwrap();
        f.store.put(vec![b.clone()]).await.unwrap();

        assert_eq!(f.store.clear().await, 2);
        assert!(f.store.is_empty().await);
        assert!(!f.storage.exists(a.content_location()).await.unwrap());
        assert!(!f.storage.exists(b.content_location()).await.unwrap());
    }
}
