use std::sync::Arc;

use futures::FutureExt;

use crate::{
    error::{FetchError, FetchResult},
    models::{DiscoverFilters, MediaItem, MediaKind},
    services::{
        aggregator::{self, SubQuery},
        providers::CatalogProvider,
    },
};

/// Collapses a failed catalog call into an empty list
///
/// A broken upstream degrades to "no results" instead of failing the page. The failure is
/// logged with `context` so it stays visible.
pub fn or_empty(result: FetchResult<Vec<MediaItem>>, context: &str) -> Vec<MediaItem> {
    match result {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, context = %context, "Catalog call failed, using empty list");
            Vec::new()
        }
    }
}

/// Which multi-page listing to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    Popular,
    Discover,
}

/// Fetches pages `1..=page_count` of the popular list concurrently, flattened in page order
pub async fn fetch_popular(
    provider: Arc<dyn CatalogProvider>,
    kind: MediaKind,
    filters: DiscoverFilters,
    page_count: u32,
) -> FetchResult<Vec<MediaItem>> {
    fetch_pages(provider, Listing::Popular, kind, filters, page_count).await
}

/// Fetches pages `1..=page_count` of a discover query concurrently, flattened in page order
pub async fn fetch_discovery(
    provider: Arc<dyn CatalogProvider>,
    kind: MediaKind,
    filters: DiscoverFilters,
    page_count: u32,
) -> FetchResult<Vec<MediaItem>> {
    fetch_pages(provider, Listing::Discover, kind, filters, page_count).await
}

/// Spawns one task per page, then awaits them in page order
///
/// Pages that fail are logged and skipped. The call only fails when every page failed.
async fn fetch_pages(
    provider: Arc<dyn CatalogProvider>,
    listing: Listing,
    kind: MediaKind,
    filters: DiscoverFilters,
    page_count: u32,
) -> FetchResult<Vec<MediaItem>> {
    let mut tasks = Vec::new();

    for page in 1..=page_count.max(1) {
        let provider = provider.clone();
        let filters = filters.clone();
        let task = tokio::spawn(async move {
            match listing {
                Listing::Popular => provider.fetch_popular_page(kind, &filters, page).await,
                Listing::Discover => provider.fetch_discover_page(kind, &filters, page).await,
            }
        });
        tasks.push(task);
    }

    let mut results = Vec::new();
    let mut errors = Vec::new();

    for (index, task) in tasks.into_iter().enumerate() {
        match task.await {
            Ok(Ok(items)) => results.extend(items),
            Ok(Err(e)) => {
                tracing::error!(error = %e, page = index + 1, "Catalog page fetch failed");
                errors.push(e);
            }
            Err(e) => {
                tracing::error!(error = %e, page = index + 1, "Task join error");
                errors.push(FetchError::Malformed(e.to_string()));
            }
        }
    }

    if !errors.is_empty() {
        tracing::warn!(
            success_count = results.len(),
            error_count = errors.len(),
            "Partial catalog page fetch failure"
        );
    }

    if errors.len() as u32 == page_count.max(1) {
        return Err(errors.remove(0));
    }

    Ok(results)
}

/// First search hit for `title`, trying each kind in order
///
/// A failed lookup for one kind falls through to the next, like an empty one.
pub async fn first_match(
    provider: &dyn CatalogProvider,
    title: &str,
    kinds: &[MediaKind],
) -> Option<MediaItem> {
    for kind in kinds {
        match provider.search(title, *kind, &DiscoverFilters::default()).await {
            Ok(items) => {
                if let Some(first) = items.into_iter().next() {
                    return Some(first);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, title = %title, kind = %kind, "Title lookup failed");
            }
        }
    }

    tracing::debug!(title = %title, "No catalog match for title");
    None
}

/// Film and series search merged into one list ranked by popularity
///
/// A blank query returns nothing without calling the provider.
pub async fn search_all(provider: Arc<dyn CatalogProvider>, query: &str) -> Vec<MediaItem> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let sub_queries: Vec<SubQuery> = [MediaKind::Film, MediaKind::Series]
        .into_iter()
        .map(|kind| {
            let provider = provider.clone();
            let query = query.to_string();
            let sub_query: SubQuery = async move {
                provider
                    .search(&query, kind, &DiscoverFilters::default())
                    .await
            }
            .boxed();
            sub_query
        })
        .collect();

    aggregator::composite(sub_queries, None).await
}
