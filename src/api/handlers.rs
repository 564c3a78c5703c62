use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    cached_or_compute,
    db::CacheKey,
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{
        CartLine, Coupon, CouponQuote, CouponRequest, NewCoupon, PricedLine, RecommendationType,
        RecommendationsResponse,
    },
    services::{
        coupons::{self, CouponRejection},
        RecommendationOptions, RecommendationSet,
    },
};

use super::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Query string of the recommendations endpoint
///
/// List parameters are comma separated: `?types=related,upsell&exclude=<id>,<id>`.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub types: Option<String>,
    pub limit: Option<usize>,
    pub exclude: Option<String>,
}

impl RecommendationQuery {
    pub fn into_options(self) -> AppResult<RecommendationOptions> {
        let mut options = RecommendationOptions::default();

        if let Some(types) = self.types.as_deref() {
            options.types = split_list(types)
                .map(|t| t.parse::<RecommendationType>().map_err(AppError::InvalidInput))
                .collect::<AppResult<_>>()?;
        }
        if let Some(limit) = self.limit {
            options.limit = limit;
        }
        if let Some(exclude) = self.exclude.as_deref() {
            options.exclude_product_ids = split_list(exclude)
                .map(|id| {
                    Uuid::parse_str(id)
                        .map_err(|_| AppError::InvalidInput(format!("invalid product id: {}", id)))
                })
                .collect::<AppResult<_>>()?;
        }

        Ok(options.normalized())
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Ranked recommendations for a product
///
/// Never fails on lookup problems: an unknown product simply has no
/// recommendations. Only complete results are cached.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    let options = query.into_options()?;

    tracing::info!(
        request_id = %request_id,
        product_id = %product_id,
        types = ?options.types,
        limit = options.limit,
        "Processing recommendation request"
    );

    let key = CacheKey::recommendations(product_id, &options);
    let set: RecommendationSet = cached_or_compute!(
        state.cache.as_ref(),
        key,
        state.recommendation_ttl,
        state.recommendations.recommend(product_id, &options),
        |set: &RecommendationSet| set.complete
    );

    tracing::info!(
        request_id = %request_id,
        count = set.recommendations.len(),
        complete = set.complete,
        "Recommendations served"
    );

    Ok(Json(RecommendationsResponse {
        product_id,
        recommendations: set.recommendations,
    }))
}

/// Admin endpoint creating a coupon
pub async fn create_coupon(
    State(state): State<AppState>,
    Json(request): Json<NewCoupon>,
) -> AppResult<(StatusCode, Json<Coupon>)> {
    coupons::check_new_coupon(&request)?;

    let coupon = state.coupons.create(Coupon::from(request)).await?;
    tracing::info!(code = %coupon.code, coupon_type = coupon.coupon_type.as_str(), "Coupon created");

    Ok((StatusCode::CREATED, Json(coupon)))
}

/// Prices a cart with a coupon applied, without consuming it
pub async fn validate_coupon(
    State(state): State<AppState>,
    Json(request): Json<CouponRequest>,
) -> AppResult<Json<CouponQuote>> {
    let lines = price_cart(&state, &request.items).await?;
    let coupon = find_coupon(&state, &request.code).await?;

    let quote = coupons::quote(&coupon, &lines, Utc::now()).map_err(|reason| {
        tracing::info!(code = %coupon.code, reason = %reason, "Coupon rejected");
        reason
    })?;

    Ok(Json(quote))
}

/// Validates a coupon against the cart and records one use of it
pub async fn redeem_coupon(
    State(state): State<AppState>,
    Json(request): Json<CouponRequest>,
) -> AppResult<Json<CouponQuote>> {
    let lines = price_cart(&state, &request.items).await?;
    let coupon = find_coupon(&state, &request.code).await?;

    let quote = coupons::quote(&coupon, &lines, Utc::now())?;

    // Another checkout may have used the last redemption since the lookup
    let redeemed = state
        .coupons
        .increment_usage(&coupon.code)
        .await?
        .ok_or(CouponRejection::UsageLimitReached)?;

    tracing::info!(
        code = %redeemed.code,
        usage_count = redeemed.usage_count,
        discount = quote.discount,
        "Coupon redeemed"
    );

    Ok(Json(quote))
}

async fn find_coupon(state: &AppState, code: &str) -> AppResult<Coupon> {
    state
        .coupons
        .find_by_code(code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("coupon {}", code.trim())))
}

/// Prices cart lines from the catalog, rejecting unknown or inactive products
async fn price_cart(state: &AppState, items: &[CartLine]) -> AppResult<Vec<PricedLine>> {
    if items.is_empty() {
        return Err(AppError::InvalidInput("cart is empty".to_string()));
    }
    if items.iter().any(|item| item.quantity == 0) {
        return Err(AppError::InvalidInput("quantity must be at least 1".to_string()));
    }

    let ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    let products = state.catalog.get_products(ids).await?;

    items
        .iter()
        .map(|item| {
            products
                .iter()
                .find(|p| p.id == item.product_id && p.is_active)
                .map(|p| PricedLine::from_product(p, item.quantity))
                .ok_or_else(|| {
                    AppError::InvalidInput(format!("unknown product: {}", item.product_id))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let options = RecommendationQuery::default().into_options().unwrap();
        assert_eq!(options, RecommendationOptions::default());
    }

    #[test]
    fn test_query_parses_lists() {
        let excluded = Uuid::new_v4();
        let query = RecommendationQuery {
            types: Some("upsell, related,".to_string()),
            limit: Some(2),
            exclude: Some(format!("{},", excluded)),
        };

        let options = query.into_options().unwrap();
        assert_eq!(
            options.types,
            vec![RecommendationType::Upsell, RecommendationType::Related]
        );
        assert_eq!(options.limit, 2);
        assert_eq!(options.exclude_product_ids, vec![excluded]);
    }

    #[test]
    fn test_query_rejects_bad_values() {
        let bad_type = RecommendationQuery {
            types: Some("related,bundles".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_type.into_options(), Err(AppError::InvalidInput(_))));

        let bad_id = RecommendationQuery {
            exclude: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_id.into_options(), Err(AppError::InvalidInput(_))));
    }
}
