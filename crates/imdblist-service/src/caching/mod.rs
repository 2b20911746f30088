//! In-memory caching of fetched catalogs.
//!
//! The [`CatalogCache`] stores the translated item partitions per
//! [`ListKey`], together with a freshness deadline. Expiry is lazy: every
//! read checks the entry's deadline, and a population simply installs a new
//! deadline. Freshness is therefore always measured from the *latest*
//! population of a key; there are no timers that could wipe out a fresh
//! entry.
//!
//! A companion map holds the [`ListDescriptor`] derived from a successful
//! fetch. Descriptors never expire; their absence merely means the manifest
//! falls back to its generic defaults.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::manifest::ListDescriptor;
use crate::types::{ListKey, MediaType, Meta};

mod coalesce;

pub use coalesce::Coalescer;

/// One stored population of a key: all media-type partitions plus the
/// deadline after which the entry no longer counts as fresh.
///
/// A population replaces the whole value, so readers either see the
/// previous snapshot or the new one, never a mix.
#[derive(Debug)]
struct StoredList {
    by_type: BTreeMap<MediaType, Arc<[Meta]>>,
    deadline: Instant,
}

/// The result of a cache read.
///
/// An empty `Fetched` sequence means "confirmed fetched, zero items of this
/// type" and is distinguished from `Absent` ("never populated, or no longer
/// fresh") by callers deciding whether to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLookup {
    Absent,
    Fetched(Arc<[Meta]>),
}

impl CatalogLookup {
    /// Returns the fetched items, treating `Absent` as an empty sequence.
    pub fn into_metas(self) -> Arc<[Meta]> {
        match self {
            CatalogLookup::Absent => Arc::from(Vec::new()),
            CatalogLookup::Fetched(metas) => metas,
        }
    }
}

/// The in-memory catalog cache.
pub struct CatalogCache {
    lists: moka::sync::Cache<ListKey, Arc<StoredList>>,
    descriptors: Mutex<BTreeMap<ListKey, Arc<ListDescriptor>>>,
    ttl: Duration,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let descriptors = self
            .descriptors
            .try_lock()
            .map(|d| d.len())
            .unwrap_or_default();
        f.debug_struct("CatalogCache")
            .field("cached lists", &self.lists.entry_count())
            .field("descriptors", &descriptors)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl CatalogCache {
    /// Creates a cache whose entries stay fresh for `ttl` after their latest
    /// population, bounded to `max_capacity` weighed by item count.
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let lists = moka::sync::Cache::builder()
            .max_capacity(max_capacity)
            // NOTE: we count the bookkeeping towards the weight as well
            .weigher(|_k, v: &Arc<StoredList>| {
                let items: usize = v.by_type.values().map(|metas| metas.len()).sum();
                (items as u32).max(1)
            })
            .build();

        CatalogCache {
            lists,
            descriptors: Mutex::new(BTreeMap::new()),
            ttl,
        }
    }

    /// Looks up the items of one media type under `key`.
    ///
    /// Entries past their deadline read as [`CatalogLookup::Absent`] and are
    /// evicted on the way out.
    pub fn lookup(&self, key: &ListKey, media_type: MediaType) -> CatalogLookup {
        let Some(stored) = self.lists.get(key) else {
            return CatalogLookup::Absent;
        };

        if stored.deadline <= Instant::now() {
            self.lists.invalidate(key);
            return CatalogLookup::Absent;
        }

        let metas = stored
            .by_type
            .get(&media_type)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()));
        CatalogLookup::Fetched(metas)
    }

    /// Stores one population of `key`, replacing all media-type partitions
    /// in a single swap.
    ///
    /// Partitions for media types missing from `items_by_type` are stored
    /// as confirmed-empty, so every supported type reads as fetched until
    /// the deadline passes.
    pub fn put(&self, key: &ListKey, items_by_type: BTreeMap<MediaType, Vec<Meta>>) {
        let mut by_type: BTreeMap<MediaType, Arc<[Meta]>> = items_by_type
            .into_iter()
            .map(|(media_type, metas)| (media_type, Arc::from(metas)))
            .collect();
        for media_type in MediaType::all() {
            by_type
                .entry(media_type)
                .or_insert_with(|| Arc::from(Vec::new()));
        }

        let stored = StoredList {
            by_type,
            deadline: Instant::now() + self.ttl,
        };
        self.lists.insert(key.clone(), Arc::new(stored));
    }

    /// The descriptor recorded for `key`, if a fetch has produced one.
    pub fn descriptor(&self, key: &ListKey) -> Option<Arc<ListDescriptor>> {
        self.descriptors.lock().unwrap().get(key).cloned()
    }

    /// Records the descriptor derived from a successful fetch.
    pub fn put_descriptor(&self, key: &ListKey, descriptor: ListDescriptor) {
        self.descriptors
            .lock()
            .unwrap()
            .insert(key.clone(), Arc::new(descriptor));
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::{self, Duration};

    use crate::types::{ListId, SortOrder};

    use super::*;

    fn key() -> ListKey {
        ListKey {
            id: ListId::from_url("https://www.imdb.com/list/ls047677021/").unwrap(),
            sort: SortOrder::ListOrder,
        }
    }

    fn meta(id: &str, media_type: MediaType) -> Meta {
        Meta {
            id: Some(id.to_owned()),
            name: Some(format!("Title {id}")),
            poster: None,
            media_type,
        }
    }

    fn day() -> Duration {
        Duration::from_secs(86400)
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_and_lookup() {
        let cache = CatalogCache::new(day(), 1_000);
        let key = key();

        assert_eq!(cache.lookup(&key, MediaType::Movie), CatalogLookup::Absent);

        let movies = vec![meta("tt1", MediaType::Movie), meta("tt2", MediaType::Movie)];
        cache.put(&key, BTreeMap::from([(MediaType::Movie, movies.clone())]));

        let CatalogLookup::Fetched(metas) = cache.lookup(&key, MediaType::Movie) else {
            panic!("expected a fetched movie partition");
        };
        assert_eq!(metas.as_ref(), movies.as_slice());

        // The series partition was not part of the population, but the key
        // is confirmed fetched: it reads as empty, not absent.
        let series = cache.lookup(&key, MediaType::Series);
        assert_eq!(series, CatalogLookup::Fetched(Arc::from(Vec::new())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_after_ttl() {
        let cache = CatalogCache::new(day(), 1_000);
        let key = key();

        cache.put(
            &key,
            BTreeMap::from([(MediaType::Movie, vec![meta("tt1", MediaType::Movie)])]),
        );

        time::advance(day() - Duration::from_secs(1)).await;
        assert!(matches!(
            cache.lookup(&key, MediaType::Movie),
            CatalogLookup::Fetched(_)
        ));

        time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.lookup(&key, MediaType::Movie), CatalogLookup::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repopulation_extends_freshness() {
        // A population shortly before an earlier one would have expired must
        // not be wiped out by it: freshness counts from the latest put.
        let cache = CatalogCache::new(day(), 1_000);
        let key = key();

        cache.put(
            &key,
            BTreeMap::from([(MediaType::Movie, vec![meta("tt1", MediaType::Movie)])]),
        );

        time::advance(day() - Duration::from_secs(60)).await;
        cache.put(
            &key,
            BTreeMap::from([(MediaType::Movie, vec![meta("tt2", MediaType::Movie)])]),
        );

        // Past the first population's deadline, the second stays fresh.
        time::advance(Duration::from_secs(3600)).await;
        let CatalogLookup::Fetched(metas) = cache.lookup(&key, MediaType::Movie) else {
            panic!("expected the repopulated partition to stay fresh");
        };
        assert_eq!(metas[0].id.as_deref(), Some("tt2"));

        // And it expires a full window after its own population.
        time::advance(day()).await;
        assert_eq!(cache.lookup(&key, MediaType::Movie), CatalogLookup::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_replaces_all_partitions() {
        let cache = CatalogCache::new(day(), 1_000);
        let key = key();

        cache.put(
            &key,
            BTreeMap::from([
                (MediaType::Movie, vec![meta("tt1", MediaType::Movie)]),
                (MediaType::Series, vec![meta("tt2", MediaType::Series)]),
            ]),
        );
        cache.put(
            &key,
            BTreeMap::from([(MediaType::Movie, vec![meta("tt3", MediaType::Movie)])]),
        );

        let CatalogLookup::Fetched(movies) = cache.lookup(&key, MediaType::Movie) else {
            panic!("expected a fetched movie partition");
        };
        assert_eq!(movies[0].id.as_deref(), Some("tt3"));

        // The old series partition did not survive the swap.
        let series = cache.lookup(&key, MediaType::Series);
        assert_eq!(series, CatalogLookup::Fetched(Arc::from(Vec::new())));
    }

    #[test]
    fn test_descriptors() {
        let cache = CatalogCache::new(day(), 1_000);
        let key = key();

        assert!(cache.descriptor(&key).is_none());

        cache.put_descriptor(&key, ListDescriptor::new("Top 250".to_owned(), key.clone()));
        let descriptor = cache.descriptor(&key).unwrap();
        assert_eq!(descriptor.display_name(), "Top 250 by List Order");
    }
}
