//! Read-query cache shared by the dashboard client and the upload wizard.
//!
//! The cache is an explicit value: whoever needs it gets a clone, and
//! invalidation is addressed by [`QueryKey`].

use std::future::Future;
use std::time::Duration;

use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
const MAX_ENTRIES: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Subscription(String),
    Reports(String),
    JobPosts(Uuid),
    JobPostCount(Uuid),
    MatchScore {
        job_post_id: Uuid,
        job_report_id: Uuid,
        user_id: String,
    },
}

impl QueryKey {
    pub fn policy(&self) -> FetchPolicy {
        match self {
            QueryKey::Reports(_) => FetchPolicy::AlwaysFresh,
            _ => FetchPolicy::Cached,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Served from the cache until the entry expires or is invalidated.
    Cached,
    /// Fetched on every read. The result is still stored for `peek`.
    AlwaysFresh,
}

#[derive(Clone)]
pub struct QueryCache {
    entries: Cache<QueryKey, JsonValue>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self { entries }
    }

    /// Returns the cached value for `key` or runs `fetch` and stores its
    /// result. Failed fetches are not cached.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if key.policy() == FetchPolicy::Cached {
            if let Some(hit) = self.peek::<T>(&key).await {
                debug!(?key, "query cache hit");
                return Ok(hit);
            }
        }

        let value = fetch().await?;
        match serde_json::to_value(&value) {
            Ok(json) => self.entries.insert(key, json).await,
            Err(e) => warn!(?key, error = %e, "query result is not cacheable"),
        }
        Ok(value)
    }

    /// Cached value without fetching.
    pub async fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let json = self.entries.get(key).await?;
        serde_json::from_value(json).ok()
    }

    pub async fn invalidate(&self, key: &QueryKey) {
        self.entries.invalidate(key).await;
    }

    pub fn invalidate_where<P>(&self, predicate: P)
    where
        P: Fn(&QueryKey) -> bool + Send + Sync + 'static,
    {
        if let Err(e) = self
            .entries
            .invalidate_entries_if(move |key, _| predicate(key))
        {
            warn!(error = %e, "predicate invalidation unavailable, clearing cache");
            self.entries.invalidate_all();
        }
    }
}
