use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog product as seen by the scoring engines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub category: String,
    pub tags: Vec<String>,
    /// Unit price in cents
    pub price_cents: i64,
    /// Inactive products are hidden from recommendations and cannot be bought
    pub is_active: bool,
}

impl Product {
    /// Creates an active product with a fresh id
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        tags: &[&str],
        price_cents: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: slug.into(),
            name: name.into(),
            category: category.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            price_cents,
            is_active: true,
        }
    }

    /// Price in currency units, the scale coupon values are expressed in
    pub fn unit_price(&self) -> f64 {
        self.price_cents as f64 / 100.0
    }
}

/// A product that shared at least one order with another product
#[derive(Debug, Clone, PartialEq)]
pub struct CoPurchase {
    pub product: Product,
    /// Number of distinct orders containing both products
    pub times: i64,
}
