use std::collections::HashSet;

use futures::future::BoxFuture;

use crate::{error::FetchResult, models::MediaItem};

/// Display count for "most viewed"-style composites
pub const MOST_VIEWED_LIMIT: usize = 12;

/// One independent catalog query taking part in an aggregation
pub type SubQuery = BoxFuture<'static, FetchResult<Vec<MediaItem>>>;

/// Runs all sub-queries concurrently and merges them into one deduplicated list
///
/// Results are concatenated in declaration order before deduplication, so when two
/// sub-queries return the same `(id, kind)` the earlier-declared one wins. A sub-query that
/// fails contributes nothing.
pub async fn aggregate(sub_queries: Vec<SubQuery>) -> Vec<MediaItem> {
    let query_count = sub_queries.len();

    // Every request is in flight before the first await
    let tasks: Vec<_> = sub_queries.into_iter().map(tokio::spawn).collect();

    let mut merged = Vec::new();
    let mut failed = 0usize;

    for (index, task) in tasks.into_iter().enumerate() {
        match task.await {
            Ok(Ok(items)) => merged.extend(items),
            Ok(Err(e)) => {
                failed += 1;
                tracing::warn!(error = %e, sub_query = index, "Sub-query failed, contributing no items");
            }
            Err(e) => {
                failed += 1;
                tracing::error!(error = %e, sub_query = index, "Sub-query task join error");
            }
        }
    }

    let items = dedup_by_key(merged);

    tracing::debug!(
        sub_queries = query_count,
        failed,
        results = items.len(),
        "Aggregation completed"
    );

    items
}

/// Aggregates, then ranks the merged list by popularity
///
/// `limit` truncates after sorting; pass `Some(MOST_VIEWED_LIMIT)` for "most viewed"
/// style rows and `None` for full listings.
pub async fn composite(sub_queries: Vec<SubQuery>, limit: Option<usize>) -> Vec<MediaItem> {
    rank_by_popularity(aggregate(sub_queries).await, limit)
}

/// Drops every item whose `(id, kind)` was already seen, keeping the first occurrence
pub fn dedup_by_key(items: Vec<MediaItem>) -> Vec<MediaItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.key()))
        .collect()
}

/// Sorts descending by popularity; ties keep their incoming order
pub fn rank_by_popularity(mut items: Vec<MediaItem>, limit: Option<usize>) -> Vec<MediaItem> {
    items.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}
