//! Helpers for testing the addon service and web server.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all
//!    console output is captured by the test runner.
//!
//!  - When using [`Server`], make sure that the server is held until all
//!    requests to it have been made; it stops serving when dropped. Assign
//!    it to a variable: `let server = Server::list_server(...)`.

use std::net::SocketAddr;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::routing::get;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::fmt;
use url::Url;

/// Setup the test environment.
///
///  - Initializes logs: The logger only captures logs from the `imdblist`
///    crates and mutes all other logs.
pub fn setup() {
    fmt()
        .with_env_filter(EnvFilter::new("imdblist_service=trace"))
        .with_target(false)
        .pretty()
        .with_test_writer()
        .try_init()
        .ok();
}

/// A test server that binds to a random port and serves a web app.
///
/// This server requires a `tokio` runtime and is supposed to be run in a
/// `tokio::test`. It automatically stops serving when dropped.
#[derive(Debug)]
pub struct Server {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
}

impl Server {
    /// Spawns a server for the given router on an ephemeral port.
    pub fn with_router(router: Router) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();
        let listener = tokio::net::TcpListener::from_std(listener).unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { handle, socket }
    }

    /// A server mimicking the IMDb list search endpoint, answering every
    /// list with the given body.
    ///
    /// Requests missing the fixed headers real list fetches carry are
    /// rejected, so accidental header regressions show up as test failures.
    pub fn list_server(body: String) -> Self {
        let router = Router::new().route(
            "/list/{id}/search",
            get(move |headers: axum::http::HeaderMap| {
                let body = body.clone();
                async move {
                    let user_agent = headers
                        .get(header::USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    let referer = headers
                        .get(header::REFERER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    if !user_agent.contains("Android") || !referer.contains("/list/") {
                        return Err(StatusCode::BAD_REQUEST);
                    }

                    Ok((
                        [(header::CONTENT_TYPE, "application/json")],
                        body,
                    ))
                }
            }),
        );

        Self::with_router(router)
    }

    /// A server failing every list request with the given status code.
    pub fn error_server(status: u16) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        let router = Router::new().route(
            "/list/{id}/search",
            get(move || async move { status }),
        );

        Self::with_router(router)
    }

    /// Returns the socket address that this server listens on.
    pub fn addr(&self) -> SocketAddr {
        self.socket
    }

    /// Returns the port that this server listens on.
    pub fn port(&self) -> u16 {
        self.addr().port()
    }

    /// Returns a full URL pointing to the given path.
    pub fn url(&self, path: &str) -> Url {
        let path = path.trim_start_matches('/');
        format!("http://127.0.0.1:{}/{}", self.port(), path)
            .parse()
            .unwrap()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A canned list response: two movies, one series, and one entry with an
/// unrecognized type tag, in a fixed order.
///
/// The body is kept as a literal string so that the order of the `titles`
/// keys matches what the upstream endpoint would send.
pub fn sample_list_body(list_name: Option<&str>) -> String {
    let list = match list_name {
        Some(name) => format!(r#","list": {{"name": "{name}"}}"#),
        None => String::new(),
    };

    format!(
        r#"{{
  "titles": {{
    "0": {{
      "id": "tt0110912",
      "type": "featureFilm",
      "primary": {{"title": "Pulp Fiction", "year": [1994]}},
      "poster": {{"url": "https://m.media-amazon.com/images/M/pulp._V1_.jpg"}}
    }},
    "1": {{
      "id": "tt0903747",
      "type": "series",
      "primary": {{"title": "Breaking Bad", "year": [2008, 2013]}},
      "poster": {{"url": "https://m.media-amazon.com/images/M/bb._V1_.jpg"}}
    }},
    "2": {{
      "id": "tt0068646",
      "type": "featureFilm",
      "primary": {{"title": "The Godfather", "year": [1972]}}
    }},
    "3": {{
      "id": "tt9999999",
      "type": "videoGame",
      "primary": {{"title": "Not A Film"}}
    }}
  }}{list}
}}"#
    )
}
