use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{Credits, DiscoverFilters, MediaDetails, MediaItem, MediaKind, TimeWindow, TrendingScope},
    routes::PageQuery,
    services::{
        aggregator::dedup_by_key,
        catalog::{self, or_empty},
        embed::{self, EmbedProvider, EmbedSource, PlaybackTarget},
        home::{self, HomeRow},
        registry::{CategoryPages, CategorySummary},
        pagination::PageSource,
    },
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub rows: Vec<HomeRow>,
}

/// Landing page rows
pub async fn home(State(state): State<AppState>) -> Json<HomeResponse> {
    let rows = home::build_home(state.catalog.clone()).await;
    Json(HomeResponse { rows })
}

/// All registered categories in display order
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    Json(state.registry.summaries())
}

#[derive(Debug, Serialize)]
pub struct CategoryPageResponse {
    pub slug: String,
    pub title: String,
    pub page: u32,
    pub items: Vec<MediaItem>,
}

/// One page of a category
///
/// Unknown slugs are 404; a known category with nothing on this page is an empty list.
pub async fn category_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<CategoryPageResponse>> {
    let descriptor = state.registry.resolve(&slug)?;
    let pages = CategoryPages::new(descriptor, state.catalog.clone());
    let page = params.page.max(1);

    let items = or_empty(pages.fetch_page(page).await, &slug);

    tracing::debug!(slug = %slug, page, results = items.len(), "Served category page");

    Ok(Json(CategoryPageResponse {
        slug: pages.slug().to_string(),
        title: pages.title().to_string(),
        page,
        items,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    pub window: TimeWindow,
    #[serde(default = "super::first_page")]
    pub page: u32,
}

/// Trending feed for `film`, `series` or `all`
pub async fn trending(
    State(state): State<AppState>,
    Path(scope): Path<TrendingScope>,
    Query(params): Query<TrendingQuery>,
) -> Json<Vec<MediaItem>> {
    let result = state
        .catalog
        .fetch_trending(scope, params.window, params.page.max(1))
        .await;
    Json(or_empty(result, "trending"))
}

/// Upper bound on `pages` for multi-page listings
const MAX_LISTING_PAGES: u32 = 5;

/// Query keys the provider sets itself; a caller-supplied copy would be sent twice
const RESERVED_PARAMS: &[&str] = &["page", "api_key"];

/// Splits `pages` off the query; everything except reserved keys is passed to TMDB untouched
fn listing_params(mut params: BTreeMap<String, String>) -> AppResult<(u32, DiscoverFilters)> {
    let pages = parse_number(&mut params, "pages")?
        .unwrap_or(1)
        .clamp(1, MAX_LISTING_PAGES);
    for key in RESERVED_PARAMS {
        if params.remove(*key).is_some() {
            tracing::debug!(param = %key, "Ignoring reserved listing parameter");
        }
    }
    let filters = params
        .into_iter()
        .fold(DiscoverFilters::new(), |filters, (key, value)| filters.param(key, value));
    Ok((pages, filters))
}

/// Pages `1..=pages` of a discover query, flattened and deduplicated
pub async fn discover(
    State(state): State<AppState>,
    Path(kind): Path<MediaKind>,
    Query(params): Query<BTreeMap<String, String>>,
) -> AppResult<Json<Vec<MediaItem>>> {
    let (pages, filters) = listing_params(params)?;
    let result = catalog::fetch_discovery(state.catalog.clone(), kind, filters, pages).await;
    Ok(Json(dedup_by_key(or_empty(result, "discover"))))
}

/// Pages `1..=pages` of the popular list, flattened and deduplicated
pub async fn popular(
    State(state): State<AppState>,
    Path(kind): Path<MediaKind>,
    Query(params): Query<BTreeMap<String, String>>,
) -> AppResult<Json<Vec<MediaItem>>> {
    let (pages, filters) = listing_params(params)?;
    let result = catalog::fetch_popular(state.catalog.clone(), kind, filters, pages).await;
    Ok(Json(dedup_by_key(or_empty(result, "popular"))))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default, alias = "q")]
    pub query: String,
    pub kind: Option<MediaKind>,
}

/// Title search; without `kind`, films and series are merged and ranked by popularity
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<MediaItem>> {
    let query = params.query.trim();
    if query.is_empty() {
        return Json(Vec::new());
    }

    let items = match params.kind {
        Some(kind) => or_empty(
            state
                .catalog
                .search(query, kind, &DiscoverFilters::default())
                .await,
            "search",
        ),
        None => catalog::search_all(state.catalog.clone(), query).await,
    };

    tracing::info!(query = %query, results = items.len(), "Search completed");

    Json(items)
}

/// Detail record; unknown titles and upstream failures are both 404
pub async fn details(
    State(state): State<AppState>,
    Path((kind, id)): Path<(MediaKind, u64)>,
) -> AppResult<Json<MediaDetails>> {
    match state.catalog.fetch_details(id, kind).await {
        Ok(Some(details)) => Ok(Json(details)),
        Ok(None) => Err(AppError::NotFound(format!("No {} with id {}", kind, id))),
        Err(e) => {
            tracing::warn!(error = %e, kind = %kind, id, "Detail lookup failed");
            Err(AppError::NotFound(format!("No {} with id {}", kind, id)))
        }
    }
}

/// Cast members shown for a title unless `limit` says otherwise
const TOP_CAST_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct CreditsQuery {
    pub limit: Option<usize>,
}

/// Top-billed cast; unknown titles are 404, an upstream failure is an empty cast
pub async fn credits(
    State(state): State<AppState>,
    Path((kind, id)): Path<(MediaKind, u64)>,
    Query(params): Query<CreditsQuery>,
) -> AppResult<Json<Credits>> {
    let limit = params.limit.unwrap_or(TOP_CAST_LIMIT);
    match state.catalog.fetch_credits(id, kind).await {
        Ok(Some(credits)) => Ok(Json(credits.top(limit))),
        Ok(None) => Err(AppError::NotFound(format!("No {} with id {}", kind, id))),
        Err(e) => {
            tracing::warn!(error = %e, kind = %kind, id, "Credits lookup failed");
            Ok(Json(Credits::default()))
        }
    }
}

pub async fn similar(
    State(state): State<AppState>,
    Path((kind, id)): Path<(MediaKind, u64)>,
) -> Json<Vec<MediaItem>> {
    let result = state.catalog.fetch_similar(id, kind).await;
    Json(or_empty(result, "similar"))
}

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
    pub kind: MediaKind,
    pub id: u64,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub sources: Vec<EmbedSource>,
}

fn parse_number(params: &mut BTreeMap<String, String>, name: &str) -> AppResult<Option<u32>> {
    params
        .remove(name)
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|_| AppError::InvalidInput(format!("{} must be a positive number", name)))
        })
        .transpose()
}

/// Player URLs for a title, every active provider in order
///
/// `season`, `episode` and `provider` are consumed here; any other query parameter is
/// forwarded to the players that accept parameters.
pub async fn embed(
    Path((kind, id)): Path<(MediaKind, u64)>,
    Query(mut params): Query<BTreeMap<String, String>>,
) -> AppResult<Json<EmbedResponse>> {
    let season = parse_number(&mut params, "season")?;
    let episode = parse_number(&mut params, "episode")?;
    let preferred = params
        .remove("provider")
        .map(|raw| raw.parse::<EmbedProvider>())
        .transpose()?;

    let target = PlaybackTarget::new(kind, id, season, episode);
    let extra: Vec<(String, String)> = params.into_iter().collect();
    let sources = embed::embed_sources(&target, preferred, &extra);

    let (season, episode) = match target {
        PlaybackTarget::Film { .. } => (None, None),
        PlaybackTarget::Episode { season, episode, .. } => (Some(season), Some(episode)),
    };

    Ok(Json(EmbedResponse {
        kind,
        id,
        season,
        episode,
        sources,
    }))
}
