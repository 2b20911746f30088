//! The catalog service: composes the cache, the coalescer and the fetcher
//! into the addon's request/response model.

use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt as _;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::caching::{CatalogCache, CatalogLookup, Coalescer};
use crate::config::Config;
use crate::fetch::{FetchError, ListFetcher};
use crate::manifest::{ListDescriptor, Manifest};
use crate::translate;
use crate::types::{ListId, ListKey, MediaType, Meta};

/// An error for a request the addon cannot serve.
///
/// Never cached and never coalesced; it is returned synchronously to the
/// immediate caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unsupported catalog type: {0}")]
    UnsupportedType(String),
    #[error("unknown catalog: {0}")]
    UnknownCatalog(String),
}

/// The body of a catalog response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub metas: Arc<[Meta]>,
    /// How long, in seconds, clients may cache this response.
    pub cache_max_age: u64,
}

/// The underlying service for the HTTP request handlers.
#[derive(Clone)]
pub struct AddonService {
    inner: Arc<AddonServiceInner>,
    manifest: Arc<Manifest>,
}

struct AddonServiceInner {
    config: Config,
    key: ListKey,
    cache: CatalogCache,
    coalescer: Coalescer<ListKey, ()>,
    fetcher: Arc<dyn ListFetcher>,
}

impl AddonServiceInner {
    /// The population work for this service's key: fetch, translate, store
    /// all media-type partitions, and record the descriptor, in that order.
    fn populate(this: &Arc<Self>) -> BoxFuture<'static, Result<(), FetchError>> {
        let inner = Arc::clone(this);
        async move {
            let snapshot = inner.fetcher.fetch(&inner.key).await?;

            let by_type =
                translate::partition_titles(&snapshot.titles, inner.config.fetch.poster_width);
            inner.cache.put(&inner.key, by_type);

            if let Some(name) = snapshot.list.and_then(|list| list.name) {
                inner
                    .cache
                    .put_descriptor(&inner.key, ListDescriptor::new(name, inner.key.clone()));
            }

            Ok(())
        }
        .boxed()
    }

    /// Populates the cache, coalescing with any in-flight population for
    /// the same key.
    async fn refresh(this: &Arc<Self>) -> Result<(), FetchError> {
        this.coalescer
            .coalesce(this.key.clone(), Self::populate(this))
            .await
    }
}

impl AddonService {
    /// Creates the service and resolves its identity.
    ///
    /// Parses the configured list URL (a malformed one is fatal), performs
    /// one blind population attempt, and builds the manifest from the
    /// resulting descriptor, falling back to the generic one when the first
    /// fetch did not produce a list name.
    pub async fn create(config: Config, fetcher: Arc<dyn ListFetcher>) -> Result<Self> {
        let id = ListId::from_url(&config.list_url)?;
        let key = ListKey {
            id,
            sort: config.sort,
        };
        let cache = CatalogCache::new(config.cache.catalog_ttl, config.cache.max_capacity);

        let inner = Arc::new(AddonServiceInner {
            config,
            key,
            cache,
            coalescer: Coalescer::new(),
            fetcher,
        });

        if let Err(error) = AddonServiceInner::refresh(&inner).await {
            tracing::warn!(
                %error,
                key = %inner.key,
                "Initial list fetch failed, using the default manifest",
            );
        }

        let manifest = match inner.cache.descriptor(&inner.key) {
            Some(descriptor) => Manifest::for_descriptor(&descriptor),
            None => Manifest::generic(),
        };
        tracing::info!(key = %inner.key, manifest = %manifest.name, "Addon service created");

        Ok(AddonService {
            inner,
            manifest: Arc::new(manifest),
        })
    }

    /// Gives access to the [`Config`].
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The manifest built during startup resolution.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Answers a catalog request for `(media_type, catalog_id)`.
    ///
    /// Fresh cached items are served directly; otherwise the cache is
    /// populated first, coalescing concurrent requests into one fetch. A
    /// failed fetch degrades to the empty catalog instead of surfacing the
    /// error.
    pub async fn catalog(
        &self,
        media_type: MediaType,
        catalog_id: &str,
    ) -> Result<CatalogResponse, CatalogError> {
        if catalog_id != media_type.catalog_id() {
            return Err(CatalogError::UnknownCatalog(catalog_id.to_owned()));
        }

        let inner = &self.inner;
        if let CatalogLookup::Fetched(metas) = inner.cache.lookup(&inner.key, media_type) {
            if !metas.is_empty() {
                return Ok(self.response(metas));
            }
        }

        match AddonServiceInner::refresh(inner).await {
            Ok(()) => {
                // Possibly still empty when the list has no items of this
                // type; that is a valid answer, not an error.
                let metas = inner.cache.lookup(&inner.key, media_type).into_metas();
                Ok(self.response(metas))
            }
            Err(error) => {
                tracing::warn!(
                    %error,
                    key = %inner.key,
                    "List fetch failed, serving the empty catalog",
                );
                Ok(self.response(Arc::from(Vec::new())))
            }
        }
    }

    fn response(&self, metas: Arc<[Meta]>) -> CatalogResponse {
        CatalogResponse {
            metas,
            cache_max_age: self.inner.config.cache.catalog_ttl.as_secs(),
        }
    }
}
