use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use imdblist_service::AddonService;

mod catalog;
mod error;
mod manifest;

pub use error::ResponseError;

use catalog::serve_catalog;
use manifest::serve_manifest;

pub async fn healthcheck() -> &'static str {
    "ok"
}

pub fn create_app(service: AddonService) -> Router {
    // Stremio clients load addons cross-origin, so every route answers
    // CORS preflights.
    let layer = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/manifest.json", get(serve_manifest))
        .route("/catalog/{media_type}/{id}", get(serve_catalog))
        .with_state(service)
        .layer(layer)
        // the healthcheck is last, as it will bypass all the middlewares
        .route("/healthcheck", get(healthcheck))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use imdblist_service::config::Config;
    use imdblist_service::fetch::ImdbFetcher;
    use imdblist_service::types::MediaType;
    use imdblist_service::{AddonService, CatalogResponse};
    use imdblist_test::{Server, sample_list_body, setup};

    use super::*;

    async fn addon_server(list_name: Option<&str>) -> (Server, Server) {
        let upstream = Server::list_server(sample_list_body(list_name));

        let config = Config {
            list_url: "https://www.imdb.com/list/ls047677021/".to_owned(),
            ..Default::default()
        };
        let fetcher = Arc::new(ImdbFetcher::with_base_url(&config.fetch, upstream.url("/")));
        let service = AddonService::create(config, fetcher).await.unwrap();

        (Server::with_router(create_app(service)), upstream)
    }

    #[tokio::test]
    async fn test_serve_manifest() {
        setup();

        let (server, _upstream) = addon_server(Some("Favorites")).await;

        let manifest: serde_json::Value = reqwest::get(server.url("/manifest.json"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(manifest["name"], "Favorites by List Order");
        assert_eq!(manifest["resources"], serde_json::json!(["catalog"]));
        assert_eq!(manifest["catalogs"][0]["id"], "imdb-movie-list");
        assert_eq!(manifest["catalogs"][0]["type"], "movie");
    }

    #[tokio::test]
    async fn test_serve_catalog() {
        setup();

        let (server, _upstream) = addon_server(None).await;

        let response = reqwest::get(server.url("/catalog/movie/imdb-movie-list.json"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let catalog: CatalogResponse = response.json().await.unwrap();
        assert_eq!(catalog.cache_max_age, 86400);
        assert_eq!(catalog.metas.len(), 2);
        assert_eq!(catalog.metas[0].id.as_deref(), Some("tt0110912"));
        assert_eq!(
            catalog.metas[0].name.as_deref(),
            Some("Pulp Fiction (1994)")
        );
        assert_eq!(
            catalog.metas[0].poster.as_deref(),
            Some("https://m.media-amazon.com/images/M/pulp._V1_SX250.jpg")
        );
        assert!(catalog.metas.iter().all(|m| m.media_type == MediaType::Movie));

        let series: CatalogResponse = reqwest::get(server.url("/catalog/series/imdb-series-list.json"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(series.metas.len(), 1);
        assert_eq!(
            series.metas[0].name.as_deref(),
            Some("Breaking Bad (2008-2013)")
        );
    }

    #[tokio::test]
    async fn test_unsupported_type_is_a_bad_request() {
        setup();

        let (server, _upstream) = addon_server(None).await;

        let response = reqwest::get(server.url("/catalog/channel/imdb-movie-list.json"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["detail"], "unsupported catalog type: channel");
    }

    #[tokio::test]
    async fn test_unknown_catalog_is_a_bad_request() {
        setup();

        let (server, _upstream) = addon_server(None).await;

        let response = reqwest::get(server.url("/catalog/movie/some-other-list.json"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_catalog_degrades_when_upstream_is_down() {
        setup();

        // The addon resolves against a healthy upstream, which then goes
        // away before the first catalog request.
        let upstream = Server::error_server(502);
        let config = Config {
            list_url: "https://www.imdb.com/list/ls047677021/".to_owned(),
            ..Default::default()
        };
        let fetcher = Arc::new(ImdbFetcher::with_base_url(&config.fetch, upstream.url("/")));
        let service = AddonService::create(config, fetcher).await.unwrap();
        let server = Server::with_router(create_app(service));

        let response = reqwest::get(server.url("/catalog/movie/imdb-movie-list.json"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let catalog: CatalogResponse = response.json().await.unwrap();
        assert!(catalog.metas.is_empty());

        // The manifest fell back to the generic addon identity.
        let manifest: serde_json::Value = reqwest::get(server.url("/manifest.json"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(manifest["name"], "IMDB List Add-on");
    }

    #[tokio::test]
    async fn test_healthcheck() {
        setup();

        let (server, _upstream) = addon_server(None).await;

        let body = reqwest::get(server.url("/healthcheck"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }
}
