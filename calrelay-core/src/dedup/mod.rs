//! Dedup store: the persisted set of event ids that have already been
//! processed.
//!
//! Reads (`exists`) and writes (`record`) are separate calls so that the
//! pipeline can announce a whole batch in one message and only then mark it
//! as seen. Records are never removed.

mod file;
mod noop;
mod sqlite;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RelayError, RelayResult};
use crate::notify::Notifier;

pub use file::FileStore;
pub use noop::NoopStore;
pub use sqlite::SqliteStore;

/// A persisted set of opaque event ids.
pub trait DedupStore: Send {
    /// Whether `id` has been recorded before. Has no side effects.
    fn exists(&self, id: &str) -> RelayResult<bool>;

    /// Mark every id as seen. Already-present ids are a no-op. Either the
    /// whole batch becomes visible to later `exists` calls or none of it does.
    fn record(&mut self, ids: &[String]) -> RelayResult<()>;

    /// `false` for the no-op fallback, which remembers nothing.
    fn is_persistent(&self) -> bool {
        true
    }
}

/// Which on-disk backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    File,
}

impl StoreBackend {
    /// File name used when no explicit path is configured.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            StoreBackend::Sqlite => "calrelay.db",
            StoreBackend::File => "seen_ids",
        }
    }
}

/// Open the store for `backend` at `path`.
pub fn open_store(backend: StoreBackend, path: &Path) -> RelayResult<Box<dyn DedupStore>> {
    match backend {
        StoreBackend::Sqlite => Ok(Box::new(SqliteStore::open(path)?)),
        StoreBackend::File => Ok(Box::new(FileStore::open(path)?)),
    }
}

/// Fall back to [`NoopStore`] when the real store could not be opened.
///
/// The operator is told through `notifier`; the substitution is never silent.
pub async fn open_or_noop(
    opened: RelayResult<Box<dyn DedupStore>>,
    notifier: &dyn Notifier,
) -> Box<dyn DedupStore> {
    match opened {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "dedup store unavailable, continuing without dedup");
            if let Err(send_err) = notifier.send(&format!("Can't open storage: {}", e)).await {
                warn!(error = %send_err, "failed to report dedup store outage");
            }
            Box::new(NoopStore)
        }
    }
}

pub(crate) fn check_id(id: &str) -> RelayResult<()> {
    if id.is_empty() {
        return Err(RelayError::Store("event id must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &str) -> RelayResult<()> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_open_failure_falls_back_to_noop_and_reports() {
        let notifier = RecordingNotifier::default();
        let store = open_or_noop(Err(RelayError::Store("disk on fire".into())), &notifier).await;

        assert!(!store.is_persistent());
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(
            sent[0].starts_with("Can't open storage:") && sent[0].contains("disk on fire"),
            "unexpected message: {}",
            sent[0]
        );
    }

    #[tokio::test]
    async fn test_open_success_is_passed_through_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = RecordingNotifier::default();
        let opened = open_store(StoreBackend::Sqlite, &dir.path().join("ids.db"));
        let store = open_or_noop(opened, &notifier).await;

        assert!(store.is_persistent());
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_every_backend_is_idempotent_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        for backend in [StoreBackend::Sqlite, StoreBackend::File] {
            let path = dir.path().join(backend.default_file_name());
            let ids = vec!["a".to_string(), "b".to_string()];

            let mut store = open_store(backend, &path).unwrap();
            store.record(&ids).unwrap();
            store.record(&ids).unwrap();
            drop(store);

            let store = open_store(backend, &path).unwrap();
            assert!(store.exists("a").unwrap(), "{:?} lost 'a'", backend);
            assert!(store.exists("b").unwrap(), "{:?} lost 'b'", backend);
            assert!(!store.exists("c").unwrap(), "{:?} invented 'c'", backend);
        }
    }

    #[test]
    fn test_backend_config_names() {
        let backend: StoreBackend = serde_json::from_str("\"file\"").unwrap();
        assert_eq!(backend, StoreBackend::File);
        assert_eq!(StoreBackend::default(), StoreBackend::Sqlite);
    }
}
