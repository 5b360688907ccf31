/// TMDB (The Movie Database) catalog provider
///
/// Uses TMDB API v3 with the server-held `api_key` query parameter. Every list endpoint
/// goes through [`normalize_results`], which sets the media kind and drops entries without
/// a poster.
///
/// Endpoints:
/// - `/trending/{all|movie|tv}/{day|week}`
/// - `/{movie|tv}/popular`, `/discover/{movie|tv}`, `/movie/now_playing`
/// - `/search/{movie|tv}`
/// - `/{movie|tv}/{id}` (with `append_to_response=videos`), `/{movie|tv}/{id}/similar`
/// - `/{movie|tv}/{id}/credits`
use crate::{
    cache::{Cache, CacheKey},
    cached,
    error::{FetchError, FetchResult},
    models::{
        tmdb::{normalize_results, TmdbCredits, TmdbDetails},
        Credits, DiscoverFilters, MediaDetails, MediaItem, MediaKind, TimeWindow, TrendingScope,
    },
    services::providers::CatalogProvider,
};
use reqwest::{Client as HttpClient, StatusCode};

/// Value shipped in sample env files; treated the same as an absent key
const PLACEHOLDER_API_KEY: &str = "your_tmdb_api_key_here";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl TmdbProvider {
    /// Creates an uncached provider
    pub fn new(api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache: None,
            cache_ttl: 0,
        }
    }

    /// Puts a Redis read-through cache in front of list and detail calls
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    fn api_key(&self) -> FetchResult<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() && key != PLACEHOLDER_API_KEY => Ok(key),
            _ => {
                tracing::error!(provider = "tmdb", "TMDB API key is not set");
                Err(FetchError::MissingCredential)
            }
        }
    }

    /// GETs a TMDB path. A 404 is `Ok(None)`; any other non-success status is an error.
    async fn get_json(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> FetchResult<Option<serde_json::Value>> {
        let api_key = self.api_key()?;
        let url = format!("{}{}", self.api_url, path);
        tracing::debug!(url = %url, "TMDB request");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", api_key)])
            .query(params)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        Ok(Some(value))
    }

    /// Fetches and normalizes one result page; `kind = None` reads each entry's `media_type`
    async fn fetch_list(
        &self,
        path: String,
        params: Vec<(String, String)>,
        kind: Option<MediaKind>,
    ) -> FetchResult<Vec<MediaItem>> {
        self.api_key()?;

        cached!(
            &self.cache,
            CacheKey::List {
                path: path.clone(),
                query: render_query(&params),
            },
            self.cache_ttl,
            async move {
                let page = self
                    .get_json(&path, &params)
                    .await?
                    .unwrap_or(serde_json::Value::Null);
                let items = normalize_results(&page, kind);

                tracing::info!(
                    path = %path,
                    results = items.len(),
                    provider = "tmdb",
                    "Catalog page fetched"
                );

                Ok::<_, FetchError>(items)
            }
        )
    }
}

fn render_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn paged(mut params: Vec<(String, String)>, page: u32) -> Vec<(String, String)> {
    params.push(("page".to_string(), page.max(1).to_string()));
    params
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn fetch_trending(
        &self,
        scope: TrendingScope,
        window: TimeWindow,
        page: u32,
    ) -> FetchResult<Vec<MediaItem>> {
        let path = format!("/trending/{}/{}", scope.tmdb_segment(), window.as_str());
        self.fetch_list(path, paged(Vec::new(), page), scope.kind())
            .await
    }

    async fn fetch_popular_page(
        &self,
        kind: MediaKind,
        filters: &DiscoverFilters,
        page: u32,
    ) -> FetchResult<Vec<MediaItem>> {
        let path = format!("/{}/popular", kind.tmdb_segment());
        self.fetch_list(path, paged(filters.to_query(kind), page), Some(kind))
            .await
    }

    async fn fetch_discover_page(
        &self,
        kind: MediaKind,
        filters: &DiscoverFilters,
        page: u32,
    ) -> FetchResult<Vec<MediaItem>> {
        let path = format!("/discover/{}", kind.tmdb_segment());
        self.fetch_list(path, paged(filters.to_query(kind), page), Some(kind))
            .await
    }

    async fn fetch_now_playing(
        &self,
        filters: &DiscoverFilters,
        page: u32,
    ) -> FetchResult<Vec<MediaItem>> {
        let params = paged(filters.to_query(MediaKind::Film), page);
        self.fetch_list("/movie/now_playing".to_string(), params, Some(MediaKind::Film))
            .await
    }

    async fn search(
        &self,
        query: &str,
        kind: MediaKind,
        extra: &DiscoverFilters,
    ) -> FetchResult<Vec<MediaItem>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut params = vec![("query".to_string(), query.trim().to_string())];
        params.extend(extra.to_query(kind));

        let path = format!("/search/{}", kind.tmdb_segment());
        self.fetch_list(path, params, Some(kind)).await
    }

    async fn fetch_details(&self, id: u64, kind: MediaKind) -> FetchResult<Option<MediaDetails>> {
        self.api_key()?;

        cached!(
            &self.cache,
            CacheKey::Details { kind, id },
            self.cache_ttl,
            async move {
                let path = format!("/{}/{}", kind.tmdb_segment(), id);
                let params = vec![("append_to_response".to_string(), "videos".to_string())];

                let Some(body) = self.get_json(&path, &params).await? else {
                    tracing::info!(id, kind = %kind, provider = "tmdb", "Title not found");
                    return Ok(None);
                };

                let details: TmdbDetails = serde_json::from_value(body).map_err(|e| {
                    tracing::error!(error = %e, id, kind = %kind, "Failed to deserialize TMDB details");
                    FetchError::Malformed(e.to_string())
                })?;

                Ok::<_, FetchError>(Some(details.into_details(kind)))
            }
        )
    }

    async fn fetch_credits(&self, id: u64, kind: MediaKind) -> FetchResult<Option<Credits>> {
        self.api_key()?;

        cached!(
            &self.cache,
            CacheKey::Credits { kind, id },
            self.cache_ttl,
            async move {
                let path = format!("/{}/{}/credits", kind.tmdb_segment(), id);

                let Some(body) = self.get_json(&path, &[]).await? else {
                    return Ok(None);
                };

                let credits: TmdbCredits = serde_json::from_value(body)
                    .map_err(|e| FetchError::Malformed(e.to_string()))?;
                let credits = credits.into_credits();
                tracing::debug!(id, kind = %kind, cast = credits.cast.len(), "Credits fetched");

                Ok::<_, FetchError>(Some(credits))
            }
        )
    }

    async fn fetch_similar(&self, id: u64, kind: MediaKind) -> FetchResult<Vec<MediaItem>> {
        let path = format!("/{}/{}/similar", kind.tmdb_segment(), id);
        self.fetch_list(path, paged(Vec::new(), 1), Some(kind)).await
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::StatusCode as HttpStatus,
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Serves a canned TMDB on an ephemeral port and returns its base URL
    async fn spawn_fake_tmdb() -> String {
        async fn trending(
            Path((scope, window)): Path<(String, String)>,
            Query(params): Query<HashMap<String, String>>,
        ) -> Result<Json<Value>, HttpStatus> {
            if params.get("api_key").map(String::as_str) != Some("test_key") {
                return Err(HttpStatus::UNAUTHORIZED);
            }
            assert_eq!((scope.as_str(), window.as_str()), ("all", "week"));
            Ok(Json(json!({
                "page": 1,
                "results": [
                    { "id": 1, "title": "Film", "poster_path": "/f.jpg", "media_type": "movie", "popularity": 10.0 },
                    { "id": 2, "name": "Show", "poster_path": "/s.jpg", "media_type": "tv", "popularity": 20.0 },
                    { "id": 3, "title": "No Poster", "poster_path": null, "media_type": "movie" },
                    { "id": 4, "name": "Someone", "poster_path": "/p.jpg", "media_type": "person" }
                ]
            })))
        }

        async fn discover(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
            let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
            Json(json!({
                "page": page,
                "results": [
                    { "id": 100 + page, "title": format!("Page {page}"), "poster_path": "/x.jpg",
                      "genre": params.get("with_genres") }
                ]
            }))
        }

        async fn movie(Path(id): Path<u64>) -> Result<Json<Value>, HttpStatus> {
            match id {
                603 => Ok(Json(json!({
                    "id": 603, "title": "The Matrix", "poster_path": "/m.jpg",
                    "runtime": 136, "genres": [{ "id": 878, "name": "Science Fiction" }]
                }))),
                500 => Err(HttpStatus::INTERNAL_SERVER_ERROR),
                _ => Err(HttpStatus::NOT_FOUND),
            }
        }

        async fn tv_credits(Path(id): Path<u64>) -> Result<Json<Value>, HttpStatus> {
            if id != 1399 {
                return Err(HttpStatus::NOT_FOUND);
            }
            Ok(Json(json!({
                "id": 1399,
                "cast": [
                    { "id": 22970, "name": "Peter Dinklage", "character": "Tyrion Lannister",
                      "profile_path": "/pd.jpg", "order": 1 },
                    { "id": 239019, "name": "Kit Harington", "character": "Jon Snow",
                      "profile_path": "/kh.jpg", "order": 0 }
                ],
                "crew": []
            })))
        }

        let app = Router::new()
            .route("/trending/:scope/:window", get(trending))
            .route("/discover/movie", get(discover))
            .route("/movie/:id", get(movie))
            .route("/tv/:id/credits", get(tv_credits));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_missing_credential_fails_without_request() {
        let provider = TmdbProvider::new(None, "http://127.0.0.1:1".to_string());
        let result = provider
            .fetch_trending(TrendingScope::All, TimeWindow::Week, 1)
            .await;
        assert!(matches!(result, Err(FetchError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_placeholder_credential_is_treated_as_missing() {
        let provider = TmdbProvider::new(
            Some(PLACEHOLDER_API_KEY.to_string()),
            "http://127.0.0.1:1".to_string(),
        );
        let result = provider.fetch_details(603, MediaKind::Film).await;
        assert!(matches!(result, Err(FetchError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_trending_all_normalizes_and_filters() {
        let base_url = spawn_fake_tmdb().await;
        let provider = TmdbProvider::new(Some("test_key".to_string()), base_url);

        let items = provider
            .fetch_trending(TrendingScope::All, TimeWindow::Week, 1)
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, MediaKind::Film);
        assert_eq!(items[1].kind, MediaKind::Series);
        assert!(items.iter().all(|item| item.poster_path.is_some()));
    }

    #[tokio::test]
    async fn test_wrong_key_surfaces_status_error() {
        let base_url = spawn_fake_tmdb().await;
        let provider = TmdbProvider::new(Some("wrong".to_string()), base_url);

        let result = provider
            .fetch_trending(TrendingScope::All, TimeWindow::Week, 1)
            .await;
        assert!(matches!(result, Err(FetchError::Status { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_discover_passes_page_and_filters() {
        let base_url = spawn_fake_tmdb().await;
        let provider = TmdbProvider::new(Some("test_key".to_string()), base_url);
        let filters = DiscoverFilters::new().genres("16");

        let items = provider
            .fetch_discover_page(MediaKind::Film, &filters, 3)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 103);
        assert_eq!(items[0].title, "Page 3");
    }

    #[tokio::test]
    async fn test_details_found_missing_and_failing() {
        let base_url = spawn_fake_tmdb().await;
        let provider = TmdbProvider::new(Some("test_key".to_string()), base_url);

        let found = provider.fetch_details(603, MediaKind::Film).await.unwrap().unwrap();
        assert_eq!(found.item.title, "The Matrix");
        assert_eq!(found.runtime, Some(136));
        assert_eq!(found.item.genres[0].id, 878);

        let missing = provider.fetch_details(1, MediaKind::Film).await.unwrap();
        assert_eq!(missing, None);

        let failing = provider.fetch_details(500, MediaKind::Film).await;
        assert!(matches!(failing, Err(FetchError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_credits_found_and_missing() {
        let base_url = spawn_fake_tmdb().await;
        let provider = TmdbProvider::new(Some("test_key".to_string()), base_url);

        let credits = provider
            .fetch_credits(1399, MediaKind::Series)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credits.cast.len(), 2);
        assert_eq!(credits.cast[0].name, "Kit Harington");
        assert_eq!(credits.cast[1].character.as_deref(), Some("Tyrion Lannister"));

        let missing = provider.fetch_credits(1, MediaKind::Series).await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_blank_search_short_circuits() {
        let provider = TmdbProvider::new(Some("test_key".to_string()), "http://127.0.0.1:1".to_string());
        let items = provider
            .search("   ", MediaKind::Film, &DiscoverFilters::default())
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_render_query() {
        let params = vec![
            ("with_genres".to_string(), "16".to_string()),
            ("page".to_string(), "2".to_string()),
        ];
        assert_eq!(render_query(&params), "with_genres=16&page=2");
    }
}
