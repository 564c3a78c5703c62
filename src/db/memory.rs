use std::collections::HashMap;

use anyhow::Context;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{normalize_code, CoPurchase, Coupon, NewCoupon, Product},
    services::{
        catalog::{CouponStore, ProductCatalog},
        coupons::check_new_coupon,
    },
};

/// In-process product catalog, used when no database is configured and in tests
#[derive(Default)]
pub struct InMemoryCatalog {
    inner: RwLock<CatalogInner>,
}

#[derive(Default)]
struct CatalogInner {
    products: HashMap<Uuid, Product>,
    /// Each entry lists the products of one order
    orders: Vec<Vec<Uuid>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product
    pub async fn insert_product(&self, product: Product) {
        let mut inner = self.inner.write().await;
        inner.products.insert(product.id, product);
    }

    /// Records an order's products for co-purchase statistics
    pub async fn record_order(&self, mut product_ids: Vec<Uuid>) {
        product_ids.sort();
        product_ids.dedup();
        let mut inner = self.inner.write().await;
        inner.orders.push(product_ids);
    }
}

/// Sorts cheapest first, then by id so equal prices stay stable
fn by_price(products: &mut [Product]) {
    products.sort_by(|a, b| a.price_cents.cmp(&b.price_cents).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait::async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: Vec<Uuid>) -> AppResult<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.products.get(id))
            .cloned()
            .collect())
    }

    async fn products_in_category(
        &self,
        category: &str,
        exclude: &[Uuid],
    ) -> AppResult<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<Product> = inner
            .products
            .values()
            .filter(|p| {
                p.is_active
                    && p.category.eq_ignore_ascii_case(category)
                    && !exclude.contains(&p.id)
            })
            .cloned()
            .collect();
        by_price(&mut products);
        Ok(products)
    }

    async fn products_priced_above(
        &self,
        category: &str,
        min_price_cents: i64,
        exclude: &[Uuid],
    ) -> AppResult<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<Product> = inner
            .products
            .values()
            .filter(|p| {
                p.is_active
                    && p.price_cents > min_price_cents
                    && p.category.eq_ignore_ascii_case(category)
                    && !exclude.contains(&p.id)
            })
            .cloned()
            .collect();
        by_price(&mut products);
        Ok(products)
    }

    async fn co_purchased(&self, id: Uuid, exclude: &[Uuid]) -> AppResult<Vec<CoPurchase>> {
        let inner = self.inner.read().await;

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for order in inner.orders.iter().filter(|order| order.contains(&id)) {
            for other in order.iter().filter(|other| **other != id) {
                *counts.entry(*other).or_default() += 1;
            }
        }

        let mut pool: Vec<CoPurchase> = counts
            .into_iter()
            .filter(|(other, _)| !exclude.contains(other))
            .filter_map(|(other, times)| {
                inner
                    .products
                    .get(&other)
                    .filter(|product| product.is_active)
                    .map(|product| CoPurchase {
                        product: product.clone(),
                        times,
                    })
            })
            .collect();
        pool.sort_by(|a, b| b.times.cmp(&a.times).then_with(|| a.product.id.cmp(&b.product.id)));
        Ok(pool)
    }
}

/// In-process coupon store keyed by normalized code
#[derive(Default)]
pub struct InMemoryCouponStore {
    coupons: RwLock<HashMap<String, Coupon>>,
}

impl InMemoryCouponStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Coupon>> {
        let coupons = self.coupons.read().await;
        Ok(coupons.get(&normalize_code(code)).cloned())
    }

    async fn create(&self, coupon: Coupon) -> AppResult<Coupon> {
        let mut coupons = self.coupons.write().await;
        if coupons.contains_key(&coupon.code) {
            return Err(AppError::Conflict(format!(
                "coupon {} already exists",
                coupon.code
            )));
        }
        coupons.insert(coupon.code.clone(), coupon.clone());
        Ok(coupon)
    }

    async fn increment_usage(&self, code: &str) -> AppResult<Option<Coupon>> {
        let mut coupons = self.coupons.write().await;
        match coupons.get_mut(&normalize_code(code)) {
            Some(coupon) if !coupon.is_exhausted() => {
                coupon.usage_count += 1;
                Ok(Some(coupon.clone()))
            }
            _ => Ok(None),
        }
    }
}

/// Initial contents for the in-memory backend, read from a JSON file
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub products: Vec<Product>,
    /// Product ids of past orders, feeding co-purchase statistics
    #[serde(default)]
    pub orders: Vec<Vec<Uuid>>,
    #[serde(default)]
    pub coupons: Vec<NewCoupon>,
}

impl Seed {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid seed file {}", path))
    }

    /// Loads the seed, checking coupons the way the admin endpoint does
    pub async fn apply(
        self,
        catalog: &InMemoryCatalog,
        coupons: &InMemoryCouponStore,
    ) -> AppResult<()> {
        let (products, orders, new_coupons) =
            (self.products.len(), self.orders.len(), self.coupons.len());

        for product in self.products {
            catalog.insert_product(product).await;
        }
        for order in self.orders {
            catalog.record_order(order).await;
        }
        for new in self.coupons {
            check_new_coupon(&new)?;
            coupons.create(Coupon::from(new)).await?;
        }

        tracing::info!(products, orders, coupons = new_coupons, "Seed loaded");
        Ok(())
    }
}
