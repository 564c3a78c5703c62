pub mod catalog;
pub mod coupons;
pub mod recommendations;

pub use catalog::{CouponStore, ProductCatalog};
pub use recommendations::{RecommendationEngine, RecommendationOptions, RecommendationSet};
