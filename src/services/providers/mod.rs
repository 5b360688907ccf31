//! Catalog metadata provider abstraction
//!
//! A provider turns named filter parameters into HTTP calls against an external catalog
//! and normalizes the results into [`MediaItem`]s. Providers report failures as
//! [`FetchError`](crate::error::FetchError); deciding what a failure means for a page is
//! left to the call site (see [`crate::services::catalog::or_empty`]).
use crate::{
    error::FetchResult,
    models::{Credits, DiscoverFilters, MediaDetails, MediaItem, MediaKind, TimeWindow, TrendingScope},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for catalog metadata providers
///
/// Every list-returning method drops items without a poster before returning.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Trending titles for the given scope and time window
    async fn fetch_trending(
        &self,
        scope: TrendingScope,
        window: TimeWindow,
        page: u32,
    ) -> FetchResult<Vec<MediaItem>>;

    /// One page of the provider's "popular" list
    async fn fetch_popular_page(
        &self,
        kind: MediaKind,
        filters: &DiscoverFilters,
        page: u32,
    ) -> FetchResult<Vec<MediaItem>>;

    /// One page of the filtered/sorted discover query
    async fn fetch_discover_page(
        &self,
        kind: MediaKind,
        filters: &DiscoverFilters,
        page: u32,
    ) -> FetchResult<Vec<MediaItem>>;

    /// Films currently in theatres
    async fn fetch_now_playing(
        &self,
        filters: &DiscoverFilters,
        page: u32,
    ) -> FetchResult<Vec<MediaItem>>;

    /// Title search, first page only
    async fn search(
        &self,
        query: &str,
        kind: MediaKind,
        extra: &DiscoverFilters,
    ) -> FetchResult<Vec<MediaItem>>;

    /// Detail record for one title; `Ok(None)` when the catalog does not know it
    async fn fetch_details(&self, id: u64, kind: MediaKind) -> FetchResult<Option<MediaDetails>>;

    /// Cast of one title in billing order; `Ok(None)` when the catalog does not know it
    async fn fetch_credits(&self, id: u64, kind: MediaKind) -> FetchResult<Option<Credits>>;

    /// Titles the catalog considers similar to the given one
    async fn fetch_similar(&self, id: u64, kind: MediaKind) -> FetchResult<Vec<MediaItem>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
