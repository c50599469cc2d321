//! Map Suggestion Service - Autocomplete map names per repository category
//!
//! Listings are cached per category, but freshness is tracked by one shared
//! timestamp: when it lapses, the next lookup for any category refetches,
//! even for a category cached after the timestamp was last set by another.
//! Concurrent misses may both fetch; the later write wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::application::ports::outbound::{RemoteContentPort, RemoteEntry};
use crate::domain::value_objects::filter_by_prefix;

/// Default cache lifetime: 15 minutes
pub const DEFAULT_SUGGESTION_TTL: Duration = Duration::from_millis(900_000);

const NEVER: u64 = u64::MAX;

pub struct MapSuggestionService {
    remote: Arc<dyn RemoteContentPort>,
    maps_root_folder: String,
    ttl: Duration,
    epoch: Instant,
    /// Milliseconds since `epoch` of the last successful fetch
    last_update: AtomicU64,
    cache: RwLock<HashMap<String, Vec<String>>>,
}

impl MapSuggestionService {
    pub fn new(
        remote: Arc<dyn RemoteContentPort>,
        maps_root_folder: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            remote,
            maps_root_folder: maps_root_folder.into(),
            ttl,
            epoch: Instant::now(),
            last_update: AtomicU64::new(NEVER),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Map names in `category` starting with `prefix` (case-insensitive).
    ///
    /// Failures are logged and produce an empty list.
    pub async fn suggest(&self, category: &str, prefix: &str) -> Vec<String> {
        if category.is_empty() {
            return Vec::new();
        }

        if self.is_fresh() {
            if let Some(names) = self.cached(category) {
                return filter_by_prefix(&names, prefix);
            }
        }

        let path = self.category_path(category);
        let names: Vec<String> = match self.remote.list_directory(&path).await {
            Ok(entries) => entries
                .into_iter()
                .filter(RemoteEntry::is_dir)
                .map(|entry| entry.name)
                .collect(),
            Err(e) => {
                warn!(category = %category, error = %e, "Failed to fetch map suggestions");
                return Vec::new();
            }
        };
        debug!(category = %category, count = names.len(), "Refreshed map suggestions");

        let filtered = filter_by_prefix(&names, prefix);
        {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            cache.insert(category.to_string(), names);
        }
        self.last_update.store(self.now_ms(), Ordering::Release);
        filtered
    }

    fn is_fresh(&self) -> bool {
        let last = self.last_update.load(Ordering::Acquire);
        last != NEVER && self.now_ms().saturating_sub(last) <= self.ttl.as_millis() as u64
    }

    fn cached(&self, category: &str) -> Option<Vec<String>> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(category)
            .cloned()
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn category_path(&self, category: &str) -> String {
        let root = self.maps_root_folder.trim_matches('/');
        if root.is_empty() {
            category.to_string()
        } else {
            format!("{}/{}", root, category)
        }
    }
}
