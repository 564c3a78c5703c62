//! Read-side lookups the engines depend on.
//!
//! The engines never talk to a database directly. Each backend (in-memory,
//! PostgreSQL) implements these traits and tests swap in mocks.

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CoPurchase, Coupon, Product},
};

#[cfg(test)]
use mockall::automock;

/// Product lookups used to build candidate pools
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch a single product by id, active or not
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Fetch several products; missing ids are skipped
    async fn get_products(&self, ids: Vec<Uuid>) -> AppResult<Vec<Product>>;

    /// Every active product in a category, skipping the `exclude` ids
    async fn products_in_category(
        &self,
        category: &str,
        exclude: &[Uuid],
    ) -> AppResult<Vec<Product>>;

    /// Active products in a category priced strictly above `min_price_cents`,
    /// skipping the `exclude` ids
    async fn products_priced_above(
        &self,
        category: &str,
        min_price_cents: i64,
        exclude: &[Uuid],
    ) -> AppResult<Vec<Product>>;

    /// Active products that appeared in the same orders as `id`, most frequent
    /// first, skipping the `exclude` ids
    async fn co_purchased(&self, id: Uuid, exclude: &[Uuid]) -> AppResult<Vec<CoPurchase>>;
}

/// Coupon persistence used at checkout and by admins
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CouponStore: Send + Sync {
    /// Look up a coupon by its normalized code
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Coupon>>;

    /// Persist a new coupon, failing with `Conflict` when the code is taken
    async fn create(&self, coupon: Coupon) -> AppResult<Coupon>;

    /// Atomically increment usage while under the limit
    ///
    /// Returns the updated coupon, or `None` when the coupon is missing or
    /// already exhausted.
    async fn increment_usage(&self, code: &str) -> AppResult<Option<Coupon>>;
}
