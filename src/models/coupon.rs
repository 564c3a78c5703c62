use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a coupon's `value` is interpreted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    /// `value` is a percentage of the cart total
    Percentage,
    /// `value` is an amount in currency units
    FixedAmount,
    /// Anything else found in storage; never discounts
    #[serde(other)]
    Unknown,
}

impl CouponType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponType::Percentage => "percentage",
            CouponType::FixedAmount => "fixed_amount",
            CouponType::Unknown => "unknown",
        }
    }
}

impl From<&str> for CouponType {
    fn from(raw: &str) -> Self {
        match raw {
            "percentage" => CouponType::Percentage,
            "fixed_amount" => CouponType::FixedAmount,
            _ => CouponType::Unknown,
        }
    }
}

/// A discount code and its usage constraints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    pub id: Uuid,
    /// Always upper-case
    pub code: String,
    pub coupon_type: CouponType,
    pub value: f64,
    pub maximum_discount: Option<f64>,
    pub minimum_order_amount: Option<f64>,
    /// `None` means unlimited
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Empty together with `applicable_categories` means the whole cart
    #[serde(default)]
    pub applicable_product_ids: Vec<Uuid>,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
}

impl Coupon {
    /// Creates an active, unscoped, unlimited coupon
    pub fn new(code: &str, coupon_type: CouponType, value: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: normalize_code(code),
            coupon_type,
            value,
            maximum_discount: None,
            minimum_order_amount: None,
            usage_limit: None,
            usage_count: 0,
            is_active: true,
            starts_at: None,
            expires_at: None,
            applicable_product_ids: Vec::new(),
            applicable_categories: Vec::new(),
        }
    }

    /// True when the coupon only applies to some products or categories
    pub fn is_scoped(&self) -> bool {
        !self.applicable_product_ids.is_empty() || !self.applicable_categories.is_empty()
    }

    /// True when `usage_count` has reached `usage_limit`
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
    }
}

/// Admin payload for creating a coupon
#[derive(Debug, Clone, Deserialize)]
pub struct NewCoupon {
    pub code: String,
    pub coupon_type: CouponType,
    pub value: f64,
    #[serde(default)]
    pub maximum_discount: Option<f64>,
    #[serde(default)]
    pub minimum_order_amount: Option<f64>,
    #[serde(default)]
    pub usage_limit: Option<i32>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub applicable_product_ids: Vec<Uuid>,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
}

impl From<NewCoupon> for Coupon {
    fn from(new: NewCoupon) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: normalize_code(&new.code),
            coupon_type: new.coupon_type,
            value: new.value,
            maximum_discount: new.maximum_discount,
            minimum_order_amount: new.minimum_order_amount,
            usage_limit: new.usage_limit,
            usage_count: 0,
            is_active: true,
            starts_at: new.starts_at,
            expires_at: new.expires_at,
            applicable_product_ids: new.applicable_product_ids,
            applicable_categories: new.applicable_categories,
        }
    }
}

/// Codes are matched case-insensitively and stored upper-case
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
