//! Landing-page rows.

use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;

use crate::{
    models::{DiscoverFilters, MediaItem, MediaKind, SortKey, TimeWindow, TrendingScope},
    services::{
        aggregator::{self, SubQuery, MOST_VIEWED_LIMIT},
        catalog::or_empty,
        providers::CatalogProvider,
        registry::hollywood,
    },
};

#[derive(Debug, Clone, Serialize)]
pub struct HomeRow {
    pub title: &'static str,
    /// Category to open for "more"; absent when the row has no full listing
    pub slug: Option<&'static str>,
    pub items: Vec<MediaItem>,
}

impl HomeRow {
    fn new(title: &'static str, slug: Option<&'static str>, items: Vec<MediaItem>) -> Self {
        Self { title, slug, items }
    }
}

fn trending(provider: &Arc<dyn CatalogProvider>, scope: TrendingScope) -> SubQuery {
    let provider = provider.clone();
    async move { provider.fetch_trending(scope, TimeWindow::Week, 1).await }.boxed()
}

fn popular(provider: &Arc<dyn CatalogProvider>, kind: MediaKind) -> SubQuery {
    let provider = provider.clone();
    async move { provider.fetch_popular_page(kind, &hollywood(), 1).await }.boxed()
}

async fn discover_row(
    provider: &Arc<dyn CatalogProvider>,
    kind: MediaKind,
    filters: DiscoverFilters,
    context: &str,
) -> Vec<MediaItem> {
    or_empty(provider.fetch_discover_page(kind, &filters, 1).await, context)
}

/// Builds every landing-page row concurrently
///
/// "Trending Now" blends this week's trending films and series; "Most Popular" blends the
/// popular lists. Both are deduplicated, ranked by popularity and cut to
/// [`MOST_VIEWED_LIMIT`]. Any row whose upstream call fails comes back empty.
pub async fn build_home(provider: Arc<dyn CatalogProvider>) -> Vec<HomeRow> {
    let trending_now = aggregator::composite(
        vec![
            trending(&provider, TrendingScope::Film),
            trending(&provider, TrendingScope::Series),
        ],
        Some(MOST_VIEWED_LIMIT),
    );
    let most_viewed = aggregator::composite(
        vec![
            popular(&provider, MediaKind::Film),
            popular(&provider, MediaKind::Series),
        ],
        Some(MOST_VIEWED_LIMIT),
    );
    let now_playing = async {
        or_empty(provider.fetch_now_playing(&hollywood(), 1).await, "home: now playing")
    };

    let (trending_now, now_playing, most_viewed, top_films, top_series, action, comedy, scifi) = tokio::join!(
        trending_now,
        now_playing,
        most_viewed,
        discover_row(
            &provider,
            MediaKind::Film,
            hollywood().min_votes(300).sort(SortKey::VoteAverageDesc),
            "home: top rated films",
        ),
        discover_row(
            &provider,
            MediaKind::Series,
            hollywood().min_votes(200).sort(SortKey::VoteAverageDesc),
            "home: top rated series",
        ),
        discover_row(&provider, MediaKind::Film, hollywood().genres("28,12"), "home: action"),
        discover_row(&provider, MediaKind::Film, hollywood().genres("35"), "home: comedy"),
        discover_row(&provider, MediaKind::Film, hollywood().genres("878,14"), "home: sci-fi"),
    );

    vec![
        HomeRow::new("Trending Now", Some("top-weekly"), trending_now),
        HomeRow::new("Newly Released in Theaters", None, now_playing),
        HomeRow::new("Most Popular", None, most_viewed),
        HomeRow::new("Top Rated Movies", Some("top-rated-hollywood-movies"), top_films),
        HomeRow::new("Top Rated TV Shows", None, top_series),
        HomeRow::new("Action & Adventure", None, action),
        HomeRow::new("Comedy", None, comedy),
        HomeRow::new("Sci-Fi & Fantasy", None, scifi),
    ]
}
