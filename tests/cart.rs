mod common;

use reqwest::StatusCode;
use serde_json::json;

use common::{add_to_cart, insert_product, spawn_server};

async fn get_cart(base_url: &str, session: &str) -> serde_json::Value {
    let response = reqwest::Client::new()
        .get(format!("{}/api/cart", base_url))
        .header("x-cart-session", session)
        .send()
        .await
        .expect("Failed to send get cart request");
    assert_eq!(response.status(), StatusCode::OK);
    response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse cart JSON")
}

#[tokio::test]
async fn cart_requires_the_session_header() {
    let app = spawn_server().await;

    let response = reqwest::Client::new()
        .get(format!("{}/api/cart", app.base_url))
        .send()
        .await
        .expect("Failed to send get cart request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn new_session_endpoint_hands_out_a_key() {
    let app = spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/cart/session", app.base_url))
        .send()
        .await
        .expect("Failed to send session request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse session JSON");
    assert!(!body["session"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn identical_variants_merge_into_one_line() {
    let app = spawn_server().await;
    let product_id = insert_product(&app.db, "Urban Classic Tee", 2999.0, "M").await;

    let first = add_to_cart(&app.base_url, "s1", product_id, 2, "M").await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let body = first
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse add response");
    assert_eq!(
        body["message"].as_str(),
        Some("Added 2 Urban Classic Tee to cart")
    );

    add_to_cart(&app.base_url, "s1", product_id, 3, "M").await;

    let cart = get_cart(&app.base_url, "s1").await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    assert_eq!(cart["lines"][0]["quantity"].as_u64(), Some(5));
    assert_eq!(cart["item_count"].as_u64(), Some(5));
}

#[tokio::test]
async fn different_sizes_stay_distinct_lines() {
    let app = spawn_server().await;
    let product_id = insert_product(&app.db, "Urban Classic Tee", 2999.0, "M").await;
    // Offer a second size for the same product.
    add_variant(&app.db, product_id, "L").await;

    add_to_cart(&app.base_url, "s1", product_id, 1, "M").await;
    add_to_cart(&app.base_url, "s1", product_id, 1, "L").await;

    let cart = get_cart(&app.base_url, "s1").await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 2);
    assert_eq!(cart["item_count"].as_u64(), Some(2));
}

#[tokio::test]
async fn totals_follow_updates_and_removes() {
    let app = spawn_server().await;
    let a = insert_product(&app.db, "Tee A", 3000.0, "M").await;
    let b = insert_product(&app.db, "Tee B", 2000.0, "M").await;

    add_to_cart(&app.base_url, "s1", a, 2, "M").await;
    add_to_cart(&app.base_url, "s1", b, 1, "M").await;

    let cart = get_cart(&app.base_url, "s1").await;
    assert_eq!(cart["total"].as_f64(), Some(8000.0));

    let client = reqwest::Client::new();
    let patch = client
        .patch(format!("{}/api/cart/product/{}", app.base_url, a))
        .header("x-cart-session", "s1")
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .expect("Failed to send patch request");
    assert_eq!(patch.status(), StatusCode::OK);

    let cart = get_cart(&app.base_url, "s1").await;
    assert_eq!(cart["total"].as_f64(), Some(5000.0));

    let remove = client
        .delete(format!("{}/api/cart/product/{}", app.base_url, b))
        .header("x-cart-session", "s1")
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(remove.status(), StatusCode::OK);

    let cart = get_cart(&app.base_url, "s1").await;
    assert_eq!(cart["total"].as_f64(), Some(3000.0));
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn updating_to_zero_keeps_the_line() {
    let app = spawn_server().await;
    let product_id = insert_product(&app.db, "Tee A", 3000.0, "M").await;

    add_to_cart(&app.base_url, "s1", product_id, 2, "M").await;

    let patch = reqwest::Client::new()
        .patch(format!("{}/api/cart/product/{}", app.base_url, product_id))
        .header("x-cart-session", "s1")
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .expect("Failed to send patch request");
    assert_eq!(patch.status(), StatusCode::OK);

    let cart = get_cart(&app.base_url, "s1").await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
    assert_eq!(cart["lines"][0]["quantity"].as_u64(), Some(0));
    assert_eq!(cart["item_count"].as_u64(), Some(0));
}

#[tokio::test]
async fn sessions_do_not_share_carts() {
    let app = spawn_server().await;
    let product_id = insert_product(&app.db, "Tee A", 3000.0, "M").await;

    add_to_cart(&app.base_url, "s1", product_id, 1, "M").await;

    let other = get_cart(&app.base_url, "s2").await;
    assert_eq!(other["lines"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = spawn_server().await;

    let response = add_to_cart(&app.base_url, "s1", 9999, 1, "M").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unoffered_size_is_rejected() {
    let app = spawn_server().await;
    let product_id = insert_product(&app.db, "Tee A", 3000.0, "M").await;

    let response = add_to_cart(&app.base_url, "s1", product_id, 1, "XXL").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clearing_empties_the_cart() {
    let app = spawn_server().await;
    let product_id = insert_product(&app.db, "Tee A", 3000.0, "M").await;

    add_to_cart(&app.base_url, "s1", product_id, 2, "M").await;

    let clear = reqwest::Client::new()
        .delete(format!("{}/api/cart", app.base_url))
        .header("x-cart-session", "s1")
        .send()
        .await
        .expect("Failed to send clear request");
    assert_eq!(clear.status(), StatusCode::OK);

    let cart = get_cart(&app.base_url, "s1").await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 0);
    assert_eq!(cart["total"].as_f64(), Some(0.0));
}

async fn add_variant(db: &sea_orm::DatabaseConnection, product_id: i32, size: &str) {
    use sea_orm::{EntityTrait, Set};
    use threadly::entities::product_variant;

    let variant = product_variant::ActiveModel {
        product_id: Set(product_id),
        color_name: Set("Black".to_owned()),
        color_hex: Set("#000000".to_owned()),
        size: Set(size.to_owned()),
        stock: Set(10),
        ..Default::default()
    };
    product_variant::Entity::insert(variant)
        .exec(db)
        .await
        .expect("Failed to insert variant");
}
