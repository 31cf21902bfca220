//! Event feed assembly.
//!
//! The store cannot express "public, or mine, or friends-only by one of my
//! friends" as a single query, so the feed runs one query per arm and
//! merges the results client-side: duplicates dropped, newest first,
//! truncated to the page size.  There is no cursor across merged results;
//! the next page is a re-issue with a larger `page_size`.

use std::collections::HashSet;
use std::sync::Arc;

use campus_store::{Direction, DocumentStore, FieldValue, Query};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{PREFIX_RANGE_END, SEARCH_MIN_CHARS};
use crate::error::{Result, SocialError};
use crate::model::event::Event;
use crate::model::StoredEntity;
use crate::paths;
use crate::telemetry;
use crate::types::Visibility;

/// Inputs to [`FeedService::fetch_feed`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedOptions {
    /// Falls back to the configured feed page size.
    pub page_size: Option<usize>,
    /// Adds the caller's own events of any visibility.
    pub current_uid: Option<String>,
    /// Adds friends-only events created by these users.
    pub friend_uids: Vec<String>,
    pub category_id: Option<String>,
}

#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn DocumentStore>,
    page_size: usize,
    search_limit: usize,
    max_in_values: usize,
}

impl FeedService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        page_size: usize,
        search_limit: usize,
        max_in_values: usize,
    ) -> Self {
        Self {
            store,
            page_size,
            search_limit,
            max_in_values: max_in_values.max(1),
        }
    }

    fn newest(&self, page_size: usize) -> Query {
        Query::collection(paths::EVENTS)
            .order_by("createdAt", Direction::Descending)
            .limit(page_size)
    }

    /// Queries for the caller's own events and friends-only events by
    /// `friend_uids`.  The friend list is split to respect the `IN` limit.
    fn personal_queries(&self, options: &FeedOptions, page_size: usize) -> Vec<Query> {
        let mut queries = Vec::new();
        if let Some(uid) = &options.current_uid {
            queries.push(self.newest(page_size).where_eq("createdBy", uid.as_str()));
        }
        for chunk in options.friend_uids.chunks(self.max_in_values) {
            queries.push(
                self.newest(page_size)
                    .where_eq("visibility", Visibility::Friends.as_str())
                    .where_in("createdBy", chunk.iter().map(|uid| FieldValue::from(uid.as_str())).collect()),
            );
        }
        queries
    }

    /// Runs every query concurrently.  The first permission or precondition
    /// failure is returned as-is; any other failure is reported and the
    /// whole result degrades to empty.
    async fn run_all(&self, operation: &str, queries: &[Query]) -> Result<Vec<Event>> {
        let results = join_all(queries.iter().map(|q| self.store.query(q))).await;

        let mut events = Vec::new();
        let mut soft_failure = None;
        for result in results {
            match result {
                Ok(docs) => events.extend(docs.iter().map(Event::from_document)),
                Err(err) => {
                    let err = SocialError::from(err);
                    if err.is_permission_denied() || err.is_failed_precondition() {
                        return Err(err);
                    }
                    soft_failure.get_or_insert(err);
                }
            }
        }
        if let Some(err) = soft_failure {
            telemetry::report(operation, &err);
            return Ok(Vec::new());
        }
        Ok(events)
    }

    pub async fn fetch_feed(&self, options: &FeedOptions) -> Result<Vec<Event>> {
        let page_size = options.page_size.unwrap_or(self.page_size);

        let mut queries = vec![self
            .newest(page_size)
            .where_eq("visibility", Visibility::Public.as_str())];
        queries.extend(self.personal_queries(options, page_size));
        if let Some(category) = &options.category_id {
            queries = queries
                .into_iter()
                .map(|q| q.where_eq("categoryId", category.as_str()))
                .collect();
        }

        let events = self.run_all("fetch_feed", &queries).await?;
        debug!(queries = queries.len(), candidates = events.len(), page_size, "feed merged");
        Ok(merge_feed(events, page_size))
    }

    /// Feed restricted to events whose category is in `interests`.  An
    /// empty interest list gives the regular feed.  `options.category_id`
    /// is ignored here.
    pub async fn fetch_interests_feed(
        &self,
        interests: &[String],
        options: &FeedOptions,
    ) -> Result<Vec<Event>> {
        if interests.is_empty() {
            return self.fetch_feed(options).await;
        }
        let page_size = options.page_size.unwrap_or(self.page_size);

        let in_values = |chunk: &[String]| -> Vec<FieldValue> {
            chunk.iter().map(|c| FieldValue::from(c.as_str())).collect()
        };

        // The category constraint goes into every query so that the page
        // limit applies to matching events only.  One `IN` per query: the
        // friends arm takes the friend chunk and one category at a time.
        let mut queries = Vec::new();
        for chunk in interests.chunks(self.max_in_values) {
            queries.push(
                self.newest(page_size)
                    .where_eq("visibility", Visibility::Public.as_str())
                    .where_in("categoryId", in_values(chunk)),
            );
            if let Some(uid) = &options.current_uid {
                queries.push(
                    self.newest(page_size)
                        .where_eq("createdBy", uid.as_str())
                        .where_in("categoryId", in_values(chunk)),
                );
            }
        }
        for chunk in options.friend_uids.chunks(self.max_in_values) {
            for category in interests {
                queries.push(
                    self.newest(page_size)
                        .where_eq("visibility", Visibility::Friends.as_str())
                        .where_eq("categoryId", category.as_str())
                        .where_in("createdBy", in_values(chunk)),
                );
            }
        }

        let wanted: HashSet<&str> = interests.iter().map(String::as_str).collect();
        let events = self
            .run_all("fetch_interests_feed", &queries)
            .await?
            .into_iter()
            .filter(|event| wanted.contains(event.category_id.as_str()))
            .collect();
        Ok(merge_feed(events, page_size))
    }

    /// Case-insensitive title prefix search over public events.  Queries
    /// shorter than two characters return nothing.
    pub async fn search_events(&self, text: &str) -> Result<Vec<Event>> {
        let prefix = text.trim().to_lowercase();
        if prefix.chars().count() < SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }

        let query = Query::collection(paths::EVENTS)
            .where_eq("visibility", Visibility::Public.as_str())
            .where_gte("titleLower", prefix.as_str())
            .where_lt("titleLower", format!("{prefix}{PREFIX_RANGE_END}"))
            .order_by("titleLower", Direction::Ascending)
            .limit(self.search_limit);
        self.run_all("search_events", std::slice::from_ref(&query)).await
    }
}

/// Drops repeated ids, sorts newest first (undated last) and keeps at most
/// `page_size` events.
pub fn merge_feed(events: Vec<Event>, page_size: usize) -> Vec<Event> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Event> = events
        .into_iter()
        .filter(|event| seen.insert(event.id.clone()))
        .collect();
    merged.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
    merged.truncate(page_size);
    merged
}
