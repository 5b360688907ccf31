/// Read-through caching for TMDB calls.
///
/// With `$cache` set to `Some(cache)`, returns the cached value when present; otherwise
/// awaits `$block`, queues the value for a background write and returns it. With `None`
/// the block is awaited directly. Errors from `$block` propagate with `?` and are never
/// cached.
///
/// # Arguments
/// * `$cache`: an `&Option<Cache>`.
/// * `$key`: the [`CacheKey`](crate::cache::CacheKey) for the value.
/// * `$ttl`: time-to-live in seconds.
/// * `$block`: an `async move` block producing `Result<T, _>`.
///
/// # Example
/// ```rust,ignore
/// let items = cached!(&self.cache, key, self.cache_ttl, async move {
///     self.fetch_uncached(path, params).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache {
            Some(cache) => {
                if let Some(hit) = cache.lookup(&key).await {
                    Ok(hit)
                } else {
                    let value = $block.await?;
                    cache.set_in_background(&key, &value, $ttl);
                    Ok(value)
                }
            }
            None => $block.await,
        }
    }};
}
