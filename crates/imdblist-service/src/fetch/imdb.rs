//! The production [`ListFetcher`] for IMDb lists.
//!
//! Performs one GET against the mobile list search endpoint and parses its
//! JSON body. The endpoint returns a `titles` object keyed by an opaque
//! position tag plus an optional `list` object carrying the list name.

use futures::FutureExt as _;
use futures::future::BoxFuture;
use reqwest::{Client, Url, header};
use serde::de::{self, IgnoredAny, MapAccess};
use serde::{Deserialize, Deserializer};

use crate::config::FetchConfig;
use crate::types::ListKey;

use super::{ACCEPT_LANGUAGE, FetchError, ListFetcher, USER_AGENT, create_client};

const IMDB_BASE_URL: &str = "https://m.imdb.com/";

/// One parsed list response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListSnapshot {
    /// The raw titles in the order the endpoint returned them.
    #[serde(default, deserialize_with = "titles_in_order")]
    pub titles: Vec<RawTitle>,
    #[serde(default)]
    pub list: Option<RawListInfo>,
}

/// A raw list entry as the endpoint reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawTitle {
    #[serde(default)]
    pub id: Option<String>,
    /// The raw type tag, e.g. `featureFilm` or `series`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub primary: Option<RawPrimary>,
    #[serde(default)]
    pub poster: Option<RawPoster>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawPrimary {
    #[serde(default)]
    pub title: Option<String>,
    /// Release year, or `[start, end]` for a range.
    #[serde(default)]
    pub year: Vec<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawPoster {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawListInfo {
    #[serde(default)]
    pub name: Option<String>,
}

/// Deserializes the `titles` mapping into a `Vec`, keeping the order of the
/// response body. The keys carry no information beyond their position.
fn titles_in_order<'de, D>(deserializer: D) -> Result<Vec<RawTitle>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TitlesVisitor;

    impl<'de> de::Visitor<'de> for TitlesVisitor {
        type Value = Vec<RawTitle>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a mapping of list entries")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut titles = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((IgnoredAny, title)) = map.next_entry::<IgnoredAny, RawTitle>()? {
                titles.push(title);
            }
            Ok(titles)
        }
    }

    deserializer.deserialize_map(TitlesVisitor)
}

/// Fetcher implementation backed by the IMDb mobile list endpoint.
#[derive(Debug, Clone)]
pub struct ImdbFetcher {
    client: Client,
    base_url: Url,
}

impl ImdbFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self::with_base_url(config, Url::parse(IMDB_BASE_URL).unwrap())
    }

    /// Creates a fetcher against a different host, used to point tests at a
    /// local server.
    pub fn with_base_url(config: &FetchConfig, base_url: Url) -> Self {
        Self {
            client: create_client(config),
            base_url,
        }
    }

    async fn fetch_list(&self, key: &ListKey) -> Result<ListSnapshot, FetchError> {
        let path = format!(
            "list/{id}/search?sort={sort}&view=grid&tracking_tag=&pageId={id}&pageType=list",
            id = key.id,
            sort = key.sort.query_value(),
        );
        let url = self
            .base_url
            .join(&path)
            .map_err(|_| FetchError::Internal)?;
        let referer = self
            .base_url
            .join(&format!("list/{}/", key.id))
            .map_err(|_| FetchError::Internal)?;

        tracing::debug!("Fetching list {} from `{}`", key, url);

        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .header(header::REFERER, referer.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "list endpoint responded with {status}"
            )));
        }

        let snapshot: ListSnapshot = response.json().await.map_err(|error| {
            if error.is_decode() {
                FetchError::Parsing(error.to_string())
            } else {
                error.into()
            }
        })?;

        if snapshot.titles.is_empty() {
            return Err(FetchError::Parsing(
                "list response contained no titles".to_owned(),
            ));
        }

        Ok(snapshot)
    }
}

impl ListFetcher for ImdbFetcher {
    fn fetch(&self, key: &ListKey) -> BoxFuture<'static, Result<ListSnapshot, FetchError>> {
        let this = self.clone();
        let key = key.clone();
        async move { this.fetch_list(&key).await }.boxed()
    }
}
