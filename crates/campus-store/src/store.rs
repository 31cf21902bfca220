//! The capability contract every backend satisfies.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::batch::WriteBatch;
use crate::error::Result;
use crate::query::Query;
use crate::value::{Document, Fields};

/// A remote (or embedded) document database addressed by path.
///
/// Implementations are shared behind `Arc<dyn DocumentStore>` and must be
/// safe to call from concurrent tasks.  Security-rule rejections surface as
/// [`StoreError::PermissionDenied`](crate::StoreError::PermissionDenied).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read.  `Ok(None)` when the document does not exist.
    async fn get(&self, path: &str) -> Result<Option<Document>>;

    /// Create or fully replace a document.
    async fn set(&self, path: &str, fields: Fields) -> Result<()>;

    /// Merge top-level fields into an existing document.
    async fn update(&self, path: &str, fields: Fields) -> Result<()>;

    /// Remove a document.  Deleting an absent document succeeds.
    async fn delete(&self, path: &str) -> Result<()>;

    async fn query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Number of documents matching `query`.
    async fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.query(query).await?.len())
    }

    /// Apply every write in `batch`, or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Fresh document id for client-assigned creation paths.
    fn new_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get(&self, path: &str) -> Result<Option<Document>> {
        (**self).get(path).await
    }

    async fn set(&self, path: &str, fields: Fields) -> Result<()> {
        (**self).set(path, fields).await
    }

    async fn update(&self, path: &str, fields: Fields) -> Result<()> {
        (**self).update(path, fields).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        (**self).query(query).await
    }

    async fn count(&self, query: &Query) -> Result<usize> {
        (**self).count(query).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        (**self).commit(batch).await
    }

    fn new_id(&self) -> String {
        (**self).new_id()
    }
}
