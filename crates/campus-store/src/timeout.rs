//! Explicit per-call deadlines for any backend.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::batch::WriteBatch;
use crate::error::{Result, StoreError};
use crate::query::Query;
use crate::store::DocumentStore;
use crate::value::{Document, Fields};

/// Wraps a store so that every call fails with
/// [`StoreError::DeadlineExceeded`] once `timeout` elapses.
///
/// A timed-out write may still land on the backend; the caller only learns
/// that it did not hear back in time.
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: DocumentStore> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(&self, op: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.timeout.as_millis() as u64, "store call timed out");
                Err(StoreError::DeadlineExceeded(self.timeout))
            }
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TimeoutStore<S> {
    async fn get(&self, path: &str) -> Result<Option<Document>> {
        self.bounded("get", self.inner.get(path)).await
    }

    async fn set(&self, path: &str, fields: Fields) -> Result<()> {
        self.bounded("set", self.inner.set(path, fields)).await
    }

    async fn update(&self, path: &str, fields: Fields) -> Result<()> {
        self.bounded("update", self.inner.update(path, fields)).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.bounded("delete", self.inner.delete(path)).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        self.bounded("query", self.inner.query(query)).await
    }

    async fn count(&self, query: &Query) -> Result<usize> {
        self.bounded("count", self.inner.count(query)).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.bounded("commit", self.inner.commit(batch)).await
    }

    fn new_id(&self) -> String {
        self.inner.new_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    struct StalledStore;

    #[async_trait]
    impl DocumentStore for StalledStore {
        async fn get(&self, _path: &str) -> Result<Option<Document>> {
            std::future::pending().await
        }
        async fn set(&self, _path: &str, _fields: Fields) -> Result<()> {
            std::future::pending().await
        }
        async fn update(&self, _path: &str, _fields: Fields) -> Result<()> {
            std::future::pending().await
        }
        async fn delete(&self, _path: &str) -> Result<()> {
            std::future::pending().await
        }
        async fn query(&self, _query: &Query) -> Result<Vec<Document>> {
            std::future::pending().await
        }
        async fn commit(&self, _batch: WriteBatch) -> Result<()> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let store = TimeoutStore::new(StalledStore, Duration::from_millis(20));
        let err = store.get("events/e1").await.unwrap_err();
        assert_eq!(err, StoreError::DeadlineExceeded(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_passes_through_results() {
        let store = TimeoutStore::new(MemoryStore::new(), Duration::from_secs(5));
        store.set("events/e1", Fields::new()).await.unwrap();
        assert!(store.get("events/e1").await.unwrap().is_some());
        assert!(store.inner().contains("events/e1").await);
    }
}
