use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod coupon;
pub mod product;
pub mod recommendation;

pub use coupon::{normalize_code, Coupon, CouponType, NewCoupon};
pub use product::{CoPurchase, Product};
pub use recommendation::{Recommendation, RecommendationSource, RecommendationType};

// ============================================================================
// Cart Types
// ============================================================================

/// A cart line as submitted by the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// A cart line priced from the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub category: String,
    /// Unit price in currency units
    pub unit_price: f64,
    pub quantity: u32,
}

impl PricedLine {
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            category: product.category.clone(),
            unit_price: product.unit_price(),
            quantity,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

// ============================================================================
// Coupon API Types
// ============================================================================

/// Body of the validate and redeem endpoints
#[derive(Debug, Deserialize)]
pub struct CouponRequest {
    pub code: String,
    pub items: Vec<CartLine>,
}

/// Outcome of applying a coupon to a cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CouponQuote {
    pub code: String,
    pub cart_total: f64,
    /// Part of the cart the coupon's scope covers
    pub eligible_subtotal: f64,
    pub discount: f64,
    pub final_total: f64,
}

// ============================================================================
// Recommendation API Types
// ============================================================================

/// Response for a product's recommendation lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationsResponse {
    pub product_id: Uuid,
    pub recommendations: Vec<Recommendation>,
}
