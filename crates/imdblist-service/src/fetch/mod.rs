//! Upstream retrieval of list contents.
//!
//! The caching core never talks to the network itself; it is handed a
//! [`ListFetcher`] and treats it as an opaque capability. The production
//! implementation lives in [`imdb`].

use std::error::Error;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::config::FetchConfig;
use crate::types::ListKey;

pub mod imdb;

pub use imdb::{ImdbFetcher, ListSnapshot};

/// The User-Agent the list endpoint is fetched with.
pub const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 8.0.0; TA-1053 Build/OPR1.170623.026) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/67.0.3368.0 Mobile Safari/537.36";

/// The Accept-Language the list endpoint is fetched with.
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.8";

/// An error that happens when fetching a list from the remote source.
///
/// This error is broadcast to every caller coalesced onto the failing
/// fetch, hence `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The list could not be fetched due to a connection problem or a
    /// non-success response.
    #[error("upstream request failed: {0}")]
    Transport(String),
    /// The response was received but lacks the expected structure.
    #[error("malformed list response: {0}")]
    Parsing(String),
    /// An unexpected error in the addon itself.
    #[error("internal error")]
    Internal,
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        let mut error: &dyn Error = &error;
        while let Some(source) = error.source() {
            error = source;
        }
        Self::Transport(error.to_string())
    }
}

/// Performs one upstream retrieval of a list.
///
/// Pure I/O; deduplication, caching and fallback are the caller's concern.
pub trait ListFetcher: Send + Sync + 'static {
    /// Fetches and parses the list identified by `key`.
    fn fetch(&self, key: &ListKey) -> BoxFuture<'static, Result<ListSnapshot, FetchError>>;
}

/// Creates the [`reqwest::Client`] used for list fetches.
pub fn create_client(config: &FetchConfig) -> reqwest::Client {
    reqwest::ClientBuilder::new()
        .gzip(true)
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}
