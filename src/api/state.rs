use std::sync::Arc;

use crate::db::{Cache, InMemoryCatalog, InMemoryCouponStore};
use crate::services::{CouponStore, ProductCatalog, RecommendationEngine};

/// Default lifetime of cached recommendation lists, in seconds
pub const DEFAULT_RECOMMENDATION_TTL: u64 = 3600;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn ProductCatalog>,
    pub coupons: Arc<dyn CouponStore>,
    pub recommendations: RecommendationEngine,
    /// Absent when no Redis is configured
    pub cache: Option<Cache>,
    pub recommendation_ttl: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            Arc::new(InMemoryCatalog::new()),
            Arc::new(InMemoryCouponStore::new()),
        )
    }
}

impl AppState {
    /// Creates uncached state over the given backends
    pub fn new(catalog: Arc<dyn ProductCatalog>, coupons: Arc<dyn CouponStore>) -> Self {
        Self {
            recommendations: RecommendationEngine::new(catalog.clone()),
            catalog,
            coupons,
            cache: None,
            recommendation_ttl: DEFAULT_RECOMMENDATION_TTL,
        }
    }

    /// Enables result caching for recommendations
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.recommendation_ttl = ttl;
        self
    }
}
