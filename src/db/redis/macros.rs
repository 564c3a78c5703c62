/// Serves a value from an optional cache, computing it on a miss.
///
/// Cache failures are logged and treated as misses, so the wrapped value must
/// be computable without Redis. The block must evaluate to a future of the
/// value itself, not a `Result`. A computed value is only written back when
/// `$store` accepts it.
///
/// # Arguments
/// * `$cache`: an `Option<&Cache>`; `None` always computes.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live in seconds for the stored value.
/// * `$block`: a future producing the value on a miss.
/// * `$store`: a predicate over `&value` deciding whether to write it back.
///
/// # Example
/// ```rust,ignore
/// let set: RecommendationSet = cached_or_compute!(
///     state.cache.as_ref(),
///     key,
///     ttl,
///     engine.recommend(product_id, &options),
///     |set: &RecommendationSet| set.complete
/// );
/// ```
#[macro_export]
macro_rules! cached_or_compute {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr, $store:expr) => {{
        match $cache {
            Some(cache) => match cache.get_from_cache(&$key).await {
                Ok(Some(hit)) => {
                    tracing::debug!(key = %$key, "Cache hit");
                    hit
                }
                other => {
                    if let Err(e) = other {
                        tracing::warn!(key = %$key, error = %e, "Cache read failed, computing");
                    }
                    let value = $block.await;
                    if ($store)(&value) {
                        cache.set_in_background(&$key, &value, $ttl);
                    } else {
                        tracing::debug!(key = %$key, "Not caching incomplete value");
                    }
                    value
                }
            },
            None => $block.await,
        }
    }};
}
