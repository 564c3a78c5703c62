use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use storefront_engine::api::{create_router, AppState};
use storefront_engine::db::{InMemoryCatalog, InMemoryCouponStore};
use storefront_engine::models::{Product, RecommendationsResponse};

struct Shop {
    server: TestServer,
    ebook: Product,
    bundle: Product,
    sibling: Product,
    course: Product,
    retired: Product,
}

async fn create_test_shop() -> Shop {
    let catalog = Arc::new(InMemoryCatalog::new());

    let ebook = Product::new("rust-ebook", "Rust Ebook", "ebooks", &["rust", "programming"], 2000);
    let bundle = Product::new(
        "rust-bundle",
        "Rust Ebook Bundle",
        "ebooks",
        &["rust", "programming"],
        3500,
    );
    let sibling = Product::new("go-ebook", "Go Ebook", "ebooks", &["go", "programming"], 1800);
    let course = Product::new("rust-course", "Rust Video Course", "courses", &["rust"], 4900);
    let mut retired = Product::new("old-ebook", "Old Ebook", "ebooks", &["rust"], 2500);
    retired.is_active = false;

    for product in [&ebook, &bundle, &sibling, &course, &retired] {
        catalog.insert_product(product.clone()).await;
    }
    catalog.record_order(vec![ebook.id, course.id]).await;
    catalog.record_order(vec![ebook.id, course.id, sibling.id]).await;

    let state = AppState::new(catalog, Arc::new(InMemoryCouponStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();

    Shop {
        server,
        ebook,
        bundle,
        sibling,
        course,
        retired,
    }
}

async fn create_coupon(shop: &Shop, body: Value) {
    let response = shop.server.post("/api/v1/coupons").json(&body).await;
    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_check() {
    let shop = create_test_shop().await;
    let response = shop.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let shop = create_test_shop().await;
    let id = Uuid::new_v4();

    let response = shop
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_str(&id.to_string()).unwrap(),
        )
        .await;

    assert_eq!(response.header("x-request-id"), id.to_string());
}

#[tokio::test]
async fn test_recommendations_default_types() {
    let shop = create_test_shop().await;

    let response = shop
        .server
        .get(&format!("/api/v1/products/{}/recommendations", shop.ebook.id))
        .await;
    response.assert_status_ok();

    let body: RecommendationsResponse = response.json();
    assert_eq!(body.product_id, shop.ebook.id);

    let kinds: Vec<String> = body
        .recommendations
        .iter()
        .map(|r| r.kind.to_string())
        .collect();
    assert!(kinds.contains(&"related".to_string()));
    assert!(kinds.contains(&"cross-sell".to_string()));
    assert!(kinds.contains(&"upsell".to_string()));

    let ids: Vec<Uuid> = body.recommendations.iter().map(|r| r.product.id).collect();
    assert!(!ids.contains(&shop.ebook.id));
    assert!(!ids.contains(&shop.retired.id));
}

#[tokio::test]
async fn test_recommendations_json_shape() {
    let shop = create_test_shop().await;

    let response = shop
        .server
        .get(&format!(
            "/api/v1/products/{}/recommendations?types=upsell&limit=1",
            shop.ebook.id
        ))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["type"], "upsell");
    assert_eq!(recs[0]["source"], "price_tier");
    assert_eq!(recs[0]["product"]["slug"], shop.bundle.slug.as_str());
    assert!(recs[0]["score"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_recommendations_respect_exclusions() {
    let shop = create_test_shop().await;

    let response = shop
        .server
        .get(&format!(
            "/api/v1/products/{}/recommendations?types=cross-sell,related&exclude={},{}",
            shop.ebook.id, shop.course.id, shop.bundle.id
        ))
        .await;
    response.assert_status_ok();

    let body: RecommendationsResponse = response.json();
    let ids: Vec<Uuid> = body.recommendations.iter().map(|r| r.product.id).collect();
    assert!(!ids.contains(&shop.course.id));
    assert!(!ids.contains(&shop.bundle.id));
    assert!(ids.contains(&shop.sibling.id));
}

#[tokio::test]
async fn test_recommendations_are_stable_across_calls() {
    let shop = create_test_shop().await;
    let path = format!("/api/v1/products/{}/recommendations?limit=10", shop.ebook.id);

    let first: RecommendationsResponse = shop.server.get(&path).await.json();
    let second: RecommendationsResponse = shop.server.get(&path).await.json();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_recommendations_for_unknown_product_are_empty() {
    let shop = create_test_shop().await;

    let response = shop
        .server
        .get(&format!("/api/v1/products/{}/recommendations", Uuid::new_v4()))
        .await;
    response.assert_status_ok();

    let body: RecommendationsResponse = response.json();
    assert!(body.recommendations.is_empty());
}

#[tokio::test]
async fn test_recommendations_reject_unknown_type() {
    let shop = create_test_shop().await;

    let response = shop
        .server
        .get(&format!(
            "/api/v1/products/{}/recommendations?types=bundles",
            shop.ebook.id
        ))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendations_with_zero_limit_are_empty() {
    let shop = create_test_shop().await;

    let response = shop
        .server
        .get(&format!(
            "/api/v1/products/{}/recommendations?limit=0",
            shop.ebook.id
        ))
        .await;
    response.assert_status_ok();

    let body: RecommendationsResponse = response.json();
    assert!(body.recommendations.is_empty());
}

#[tokio::test]
async fn test_recommendations_limit_is_capped() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let source = Product::new("source", "Source", "templates", &["notion"], 1000);
    catalog.insert_product(source.clone()).await;
    for i in 0..30 {
        let product = Product::new(
            format!("template-{}", i),
            format!("Template {}", i),
            "templates",
            &["notion"],
            500 + i,
        );
        catalog.insert_product(product).await;
    }

    let state = AppState::new(catalog, Arc::new(InMemoryCouponStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .get(&format!(
            "/api/v1/products/{}/recommendations?types=related&limit=50",
            source.id
        ))
        .await;
    response.assert_status_ok();

    let body: RecommendationsResponse = response.json();
    assert_eq!(body.recommendations.len(), 20);
    assert!(body.recommendations.iter().all(|r| r.product.id != source.id));
}

#[tokio::test]
async fn test_half_cent_discount_rounds_up() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let planner = Product::new("planner", "Planner", "templates", &[], 2010);
    catalog.insert_product(planner.clone()).await;

    let state = AppState::new(catalog, Arc::new(InMemoryCouponStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();
    server
        .post("/api/v1/coupons")
        .json(&json!({ "code": "FIVE", "coupon_type": "percentage", "value": 5 }))
        .await
        .assert_status(StatusCode::CREATED);

    // 5% of 20.10 is exactly 1.005
    let response = server
        .post("/api/v1/coupons/validate")
        .json(&json!({
            "code": "FIVE",
            "items": [{ "product_id": planner.id }]
        }))
        .await;
    response.assert_status_ok();

    let quote: Value = response.json();
    assert_eq!(quote["discount"], 1.01);
    assert_eq!(quote["final_total"], 19.09);
}

#[tokio::test]
async fn test_validate_percentage_coupon_with_cap() {
    let shop = create_test_shop().await;
    create_coupon(
        &shop,
        json!({
            "code": "save10",
            "coupon_type": "percentage",
            "value": 10,
            "maximum_discount": 5
        }),
    )
    .await;

    // 5 x 20.00 = 100.00, 10% would be 10.00 but the cap is 5.00
    let response = shop
        .server
        .post("/api/v1/coupons/validate")
        .json(&json!({
            "code": "SAVE10",
            "items": [{ "product_id": shop.ebook.id, "quantity": 5 }]
        }))
        .await;
    response.assert_status_ok();

    let quote: Value = response.json();
    assert_eq!(quote["code"], "SAVE10");
    assert_eq!(quote["cart_total"], 100.0);
    assert_eq!(quote["discount"], 5.0);
    assert_eq!(quote["final_total"], 95.0);
}

#[tokio::test]
async fn test_validate_fixed_coupon_floors_at_zero() {
    let shop = create_test_shop().await;
    create_coupon(
        &shop,
        json!({ "code": "TWENTYOFF", "coupon_type": "fixed_amount", "value": 20 }),
    )
    .await;

    let response = shop
        .server
        .post("/api/v1/coupons/validate")
        .json(&json!({
            "code": "twentyoff",
            "items": [{ "product_id": shop.sibling.id }]
        }))
        .await;
    response.assert_status_ok();

    let quote: Value = response.json();
    assert_eq!(quote["cart_total"], 18.0);
    assert_eq!(quote["discount"], 18.0);
    assert_eq!(quote["final_total"], 0.0);
}

#[tokio::test]
async fn test_scoped_coupon_only_discounts_matching_category() {
    let shop = create_test_shop().await;
    create_coupon(
        &shop,
        json!({
            "code": "COURSES50",
            "coupon_type": "percentage",
            "value": 50,
            "applicable_categories": ["courses"]
        }),
    )
    .await;

    let response = shop
        .server
        .post("/api/v1/coupons/validate")
        .json(&json!({
            "code": "COURSES50",
            "items": [
                { "product_id": shop.ebook.id, "quantity": 1 },
                { "product_id": shop.course.id, "quantity": 1 }
            ]
        }))
        .await;
    response.assert_status_ok();

    let quote: Value = response.json();
    assert_eq!(quote["cart_total"], 69.0);
    assert_eq!(quote["eligible_subtotal"], 49.0);
    assert_eq!(quote["discount"], 24.5);
    assert_eq!(quote["final_total"], 44.5);
}

#[tokio::test]
async fn test_unknown_coupon_is_not_found() {
    let shop = create_test_shop().await;

    let response = shop
        .server
        .post("/api/v1/coupons/validate")
        .json(&json!({
            "code": "NOPE",
            "items": [{ "product_id": shop.ebook.id }]
        }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_minimum_order_rejection() {
    let shop = create_test_shop().await;
    create_coupon(
        &shop,
        json!({
            "code": "BIGSPENDER",
            "coupon_type": "fixed_amount",
            "value": 10,
            "minimum_order_amount": 50
        }),
    )
    .await;

    let response = shop
        .server
        .post("/api/v1/coupons/validate")
        .json(&json!({
            "code": "BIGSPENDER",
            "items": [{ "product_id": shop.ebook.id }]
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["error"], "order total must be at least 50.00");
}

#[tokio::test]
async fn test_cart_with_unknown_or_inactive_product_is_rejected() {
    let shop = create_test_shop().await;
    create_coupon(
        &shop,
        json!({ "code": "ANY", "coupon_type": "fixed_amount", "value": 1 }),
    )
    .await;

    for product_id in [Uuid::new_v4(), shop.retired.id] {
        let response = shop
            .server
            .post("/api/v1/coupons/validate")
            .json(&json!({
                "code": "ANY",
                "items": [{ "product_id": product_id }]
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_redeem_until_usage_limit() {
    let shop = create_test_shop().await;
    create_coupon(
        &shop,
        json!({
            "code": "ONCE",
            "coupon_type": "fixed_amount",
            "value": 5,
            "usage_limit": 1
        }),
    )
    .await;

    let body = json!({
        "code": "ONCE",
        "items": [{ "product_id": shop.ebook.id }]
    });

    let first = shop.server.post("/api/v1/coupons/redeem").json(&body).await;
    first.assert_status_ok();
    let quote: Value = first.json();
    assert_eq!(quote["discount"], 5.0);
    assert_eq!(quote["final_total"], 15.0);

    let second = shop.server.post("/api/v1/coupons/redeem").json(&body).await;
    second.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    // validation also sees the exhausted coupon
    let check = shop.server.post("/api/v1/coupons/validate").json(&body).await;
    check.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_coupon_rejects_duplicates_and_bad_values() {
    let shop = create_test_shop().await;
    create_coupon(
        &shop,
        json!({ "code": "DUP", "coupon_type": "percentage", "value": 10 }),
    )
    .await;

    let duplicate = shop
        .server
        .post("/api/v1/coupons")
        .json(&json!({ "code": "dup", "coupon_type": "percentage", "value": 15 }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);

    let too_much = shop
        .server
        .post("/api/v1/coupons")
        .json(&json!({ "code": "HUGE", "coupon_type": "percentage", "value": 150 }))
        .await;
    too_much.assert_status(StatusCode::BAD_REQUEST);
}
