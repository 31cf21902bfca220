//! Embedded in-memory backend.
//!
//! [`MemoryStore`] implements the full [`DocumentStore`] contract over a
//! `BTreeMap` keyed by document path.  It mirrors the behaviour of a managed
//! document database closely enough to exercise the social layer end to
//! end: ordered queries skip documents missing the ordered field, `update`
//! of an absent document fails, batches are all-or-nothing, and server
//! timestamps come from a strictly increasing clock.
//!
//! Faults can be injected per path prefix to reproduce security-rule
//! rejections or missing indexes.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::batch::{WriteBatch, WriteOp};
use crate::error::{Result, StoreError};
use crate::query::{Direction, Filter, Query, MAX_IN_VALUES};
use crate::store::DocumentStore;
use crate::value::{Document, FieldValue, Fields};

/// Which operations an injected fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultScope {
    All,
    Reads,
    Queries,
    Writes,
}

#[derive(Debug, Clone)]
struct Fault {
    prefix: String,
    scope: FaultScope,
    error: StoreError,
}

#[derive(Debug, Default)]
struct Inner {
    docs: BTreeMap<String, Fields>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// Next server timestamp, strictly after every one issued before.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(next);
        next
    }
}

/// In-memory [`DocumentStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    faults: Mutex<Vec<Fault>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every matching operation on paths starting with `prefix`.
    pub async fn inject_fault(&self, prefix: impl Into<String>, scope: FaultScope, error: StoreError) {
        self.faults.lock().await.push(Fault {
            prefix: prefix.into(),
            scope,
            error,
        });
    }

    pub async fn clear_faults(&self) {
        self.faults.lock().await.clear();
    }

    /// Paths of every stored document under `prefix`, sorted.
    pub async fn paths_under(&self, prefix: &str) -> Vec<String> {
        self.inner
            .read()
            .await
            .docs
            .keys()
            .filter(|path| path.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.inner.read().await.docs.contains_key(path)
    }

    async fn check_fault(&self, path: &str, op: FaultScope) -> Result<()> {
        let faults = self.faults.lock().await;
        for fault in faults.iter() {
            let scope_matches = fault.scope == FaultScope::All || fault.scope == op;
            if scope_matches && path.starts_with(&fault.prefix) {
                tracing::debug!(path, prefix = %fault.prefix, "injected store fault");
                return Err(fault.error.clone());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Document>> {
        validate_doc_path(path)?;
        self.check_fault(path, FaultScope::Reads).await?;

        let inner = self.inner.read().await;
        Ok(inner
            .docs
            .get(path)
            .map(|fields| Document::new(path, fields.clone())))
    }

    async fn set(&self, path: &str, fields: Fields) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.set(path, fields);
        self.commit(batch).await
    }

    async fn update(&self, path: &str, fields: Fields) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.update(path, fields);
        self.commit(batch).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.delete(path);
        self.commit(batch).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        if !query.group {
            validate_collection_path(&query.collection)?;
        }
        for filter in &query.filters {
            if let Filter::In(field, values) = filter {
                if values.is_empty() || values.len() > MAX_IN_VALUES {
                    return Err(StoreError::InvalidArgument(format!(
                        "'in' filter on {field} needs 1 to {MAX_IN_VALUES} values, got {}",
                        values.len()
                    )));
                }
            }
        }
        if query.start_after.is_some() && query.order_by.is_none() {
            return Err(StoreError::InvalidArgument(
                "startAfter requires orderBy".to_string(),
            ));
        }
        self.check_fault(&query.collection, FaultScope::Queries).await?;

        let inner = self.inner.read().await;
        let mut matches: Vec<Document> = inner
            .docs
            .iter()
            .filter(|(path, _)| in_collection(path, query))
            .filter(|(_, fields)| query.filters.iter().all(|f| filter_matches(f, fields)))
            .map(|(path, fields)| Document::new(path.as_str(), fields.clone()))
            .collect();
        drop(inner);

        if let Some(order) = &query.order_by {
            matches.retain(|doc| doc.fields.contains_key(&order.field));
            matches.sort_by(|a, b| {
                let ordering = a.fields[&order.field]
                    .compare(&b.fields[&order.field])
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.path.cmp(&b.path));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });

            if let Some(cursor) = &query.start_after {
                let wanted = match order.direction {
                    Direction::Ascending => Ordering::Greater,
                    Direction::Descending => Ordering::Less,
                };
                matches.retain(|doc| doc.fields[&order.field].compare(cursor) == Some(wanted));
            }
        }

        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        for op in batch.ops() {
            validate_doc_path(op.path())?;
            self.check_fault(op.path(), FaultScope::Writes).await?;
        }

        let mut inner = self.inner.write().await;
        let now = inner.tick();

        // Stage against an overlay so a failing op leaves the store untouched.
        let mut staged: BTreeMap<String, Option<Fields>> = BTreeMap::new();
        for op in batch.into_ops() {
            match op {
                WriteOp::Set { path, mut fields } => {
                    resolve_all(&mut fields, now);
                    staged.insert(path, Some(fields));
                }
                WriteOp::Update { path, mut fields } => {
                    let current = match staged.get(&path) {
                        Some(pending) => pending.clone(),
                        None => inner.docs.get(&path).cloned(),
                    };
                    let Some(mut merged) = current else {
                        return Err(StoreError::NotFound(path));
                    };
                    resolve_all(&mut fields, now);
                    merged.extend(fields);
                    staged.insert(path, Some(merged));
                }
                WriteOp::Delete { path } => {
                    staged.insert(path, None);
                }
            }
        }

        for (path, fields) in staged {
            match fields {
                Some(fields) => {
                    inner.docs.insert(path, fields);
                }
                None => {
                    inner.docs.remove(&path);
                }
            }
        }
        Ok(())
    }
}

fn resolve_all(fields: &mut Fields, now: DateTime<Utc>) {
    fields
        .values_mut()
        .for_each(|value| value.resolve_server_timestamp(now));
}

fn segments(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('/').collect();
    if path.is_empty() || parts.iter().any(|part| part.is_empty()) {
        return Err(StoreError::InvalidArgument(format!("invalid path: '{path}'")));
    }
    Ok(parts)
}

fn validate_doc_path(path: &str) -> Result<()> {
    if segments(path)?.len() % 2 != 0 {
        return Err(StoreError::InvalidArgument(format!(
            "'{path}' is not a document path"
        )));
    }
    Ok(())
}

fn validate_collection_path(path: &str) -> Result<()> {
    if segments(path)?.len() % 2 != 1 {
        return Err(StoreError::InvalidArgument(format!(
            "'{path}' is not a collection path"
        )));
    }
    Ok(())
}

fn in_collection(path: &str, query: &Query) -> bool {
    let Some((parent, _)) = path.rsplit_once('/') else {
        return false;
    };
    if query.group {
        parent.rsplit('/').next() == Some(query.collection.as_str())
    } else {
        parent == query.collection
    }
}

fn values_equal(a: &FieldValue, b: &FieldValue) -> bool {
    a.compare(b) == Some(Ordering::Equal) || a == b
}

fn filter_matches(filter: &Filter, fields: &Fields) -> bool {
    let Some(value) = fields.get(filter.field()) else {
        return false;
    };
    match filter {
        Filter::Equals(_, expected) => values_equal(value, expected),
        Filter::In(_, candidates) => candidates.iter().any(|c| values_equal(value, c)),
        Filter::GreaterOrEqual(_, bound) => {
            matches!(value.compare(bound), Some(Ordering::Greater | Ordering::Equal))
        }
        Filter::LessThan(_, bound) => value.compare(bound) == Some(Ordering::Less),
    }
}
