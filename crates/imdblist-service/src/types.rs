//! Core types shared across the service: media types, sort orders, list
//! identities and the normalized catalog entry.

use std::fmt;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use url::Url;

/// The category of a catalog entry.
///
/// Derived from the raw type tag the upstream list carries per title;
/// entries with an unrecognized tag are dropped during translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    /// All media types the addon serves, in manifest order.
    pub fn all() -> [MediaType; 2] {
        [MediaType::Movie, MediaType::Series]
    }

    /// Parses the path segment of a catalog request.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(MediaType::Movie),
            "series" => Some(MediaType::Series),
            _ => None,
        }
    }

    /// The fixed catalog id the manifest announces for this type.
    pub fn catalog_id(&self) -> &'static str {
        match self {
            MediaType::Movie => "imdb-movie-list",
            MediaType::Series => "imdb-series-list",
        }
    }

    /// The default catalog display name for this type.
    pub fn default_catalog_name(&self) -> &'static str {
        match self {
            MediaType::Movie => "IMDB Movie List",
            MediaType::Series => "IMDB Series List",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Series => write!(f, "series"),
        }
    }
}

/// A named sort order for the upstream list.
///
/// The serialized names are the human-readable ones users configure;
/// [`query_value`](Self::query_value) yields the matching upstream query
/// parameter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "List Order")]
    ListOrder,
    Popularity,
    Alphabetical,
    Rating,
    Votes,
    Release,
    #[serde(rename = "Date Added")]
    DateAdded,
}

impl SortOrder {
    /// The pre-encoded `sort` query parameter value the list endpoint expects.
    pub fn query_value(&self) -> &'static str {
        match self {
            SortOrder::ListOrder => "list_order%2Casc",
            SortOrder::Popularity => "moviemeter%2Casc",
            SortOrder::Alphabetical => "alpha%2Casc",
            SortOrder::Rating => "user_rating%2Cdesc",
            SortOrder::Votes => "num_votes%2Cdesc",
            SortOrder::Release => "release_date%2Cdesc",
            SortOrder::DateAdded => "date_added%2Cdesc",
        }
    }

    /// A lowercase identifier-safe form, used in derived addon ids.
    pub fn slug(&self) -> &'static str {
        match self {
            SortOrder::ListOrder => "list-order",
            SortOrder::Popularity => "popularity",
            SortOrder::Alphabetical => "alphabetical",
            SortOrder::Rating => "rating",
            SortOrder::Votes => "votes",
            SortOrder::Release => "release",
            SortOrder::DateAdded => "date-added",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortOrder::ListOrder => "List Order",
            SortOrder::Popularity => "Popularity",
            SortOrder::Alphabetical => "Alphabetical",
            SortOrder::Rating => "Rating",
            SortOrder::Votes => "Votes",
            SortOrder::Release => "Release",
            SortOrder::DateAdded => "Date Added",
        };
        f.write_str(name)
    }
}

/// The opaque identity of an IMDb list (`ls…`), extracted once at startup
/// from the configured list URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListId(String);

impl ListId {
    /// Extracts the list identity from a user-supplied list URL.
    ///
    /// Accepts any `imdb.com` host with a `/list/ls<digits>/` path; anything
    /// else is a configuration error.
    pub fn from_url(list_url: &str) -> anyhow::Result<Self> {
        if list_url.trim().is_empty() {
            bail!("no list URL configured");
        }
        let url = Url::parse(list_url).context("invalid list URL")?;

        let host = url.host_str().unwrap_or_default();
        if host != "imdb.com" && !host.ends_with(".imdb.com") {
            bail!(
                "invalid IMDB list URL, it should be in the form of: \
                 https://www.imdb.com/list/ls047677021/"
            );
        }

        let mut segments = url.path_segments().context("invalid list URL")?;
        match (segments.next(), segments.next()) {
            (Some("list"), Some(id)) if is_list_id(id) => Ok(ListId(id.to_owned())),
            _ => bail!(
                "invalid IMDB list URL, it should be in the form of: \
                 https://www.imdb.com/list/ls047677021/"
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_list_id(segment: &str) -> bool {
    match segment.strip_prefix("ls") {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The composite key the cache and the coalescer share.
///
/// Two requests carrying the same key must collapse into one upstream fetch
/// and observe one cache entry; distinct sort orders on the same list are
/// fully independent keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListKey {
    pub id: ListId,
    pub sort: SortOrder,
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.sort.slug())
    }
}

/// A normalized catalog entry in the shape the addon protocol serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub id: Option<String>,
    pub name: Option<String>,
    pub poster: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}
