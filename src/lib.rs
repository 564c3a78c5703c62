//! Coupon pricing and product recommendations for a digital-goods storefront.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
