mod common;

use reqwest::StatusCode;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};
use serde_json::json;

use common::{add_to_cart, checkout_payload, insert_product, memory_db, register_and_login, spawn_server};
use threadly::cart::{Cart, ProductSnapshot};
use threadly::checkout::{submit_order, CheckoutError, CheckoutPayload};
use threadly::entities::{order, order_item};

#[tokio::test]
async fn end_to_end_order_placement() {
    let app = spawn_server().await;
    let client = reqwest::Client::new();

    let a = insert_product(&app.db, "Tee A", 3000.0, "M").await;
    let b = insert_product(&app.db, "Tee B", 2000.0, "M").await;

    add_to_cart(&app.base_url, "s1", a, 2, "M").await;
    add_to_cart(&app.base_url, "s1", b, 1, "M").await;

    // Subtotal 8000: below the free-shipping threshold, so the flat fee and
    // 8% tax apply -> 8000 + 500 + 640.
    let response = client
        .post(format!("{}/api/checkout", app.base_url))
        .header("x-cart-session", "s1")
        .json(&checkout_payload())
        .send()
        .await
        .expect("Failed to send checkout request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse checkout JSON");
    let order_id = body["order"]["order_id"].as_i64().expect("order id") as i32;
    assert_eq!(body["order"]["total"].as_f64(), Some(9140.0));
    assert_eq!(
        body["order"]["order_number"].as_str(),
        Some(format!("ORD-{:06}", order_id).as_str())
    );
    assert_eq!(body["order"]["email"].as_str(), Some("amaya@example.com"));

    // Confirmation view: header plus both items at their captured prices.
    let confirmation = client
        .get(format!("{}/api/order/{}", app.base_url, order_id))
        .send()
        .await
        .expect("Failed to send order request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse order JSON");
    assert_eq!(confirmation["order"]["status"].as_str(), Some("pending"));
    let items = confirmation["items"].as_array().expect("items array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["quantity"].as_i64(), Some(2));
    assert_eq!(items[0]["price"].as_f64(), Some(3000.0));
    assert_eq!(items[1]["quantity"].as_i64(), Some(1));
    assert_eq!(items[1]["price"].as_f64(), Some(2000.0));

    // The cart empties only after the order persisted.
    let cart = client
        .get(format!("{}/api/cart", app.base_url))
        .header("x-cart-session", "s1")
        .send()
        .await
        .expect("Failed to send cart request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse cart JSON");
    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn validation_failure_blocks_submission_and_keeps_the_cart() {
    let app = spawn_server().await;
    let client = reqwest::Client::new();

    let a = insert_product(&app.db, "Tee A", 3000.0, "M").await;
    add_to_cart(&app.base_url, "s1", a, 1, "M").await;

    let mut payload = checkout_payload();
    payload["city"] = json!("");

    let response = client
        .post(format!("{}/api/checkout", app.base_url))
        .header("x-cart-session", "s1")
        .json(&payload)
        .send()
        .await
        .expect("Failed to send checkout request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let cart = client
        .get(format!("{}/api/cart", app.base_url))
        .header("x-cart-session", "s1")
        .send()
        .await
        .expect("Failed to send cart request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse cart JSON");
    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn credit_card_payments_require_card_fields() {
    let app = spawn_server().await;
    let client = reqwest::Client::new();

    let a = insert_product(&app.db, "Tee A", 3000.0, "M").await;
    add_to_cart(&app.base_url, "s1", a, 1, "M").await;

    let mut payload = checkout_payload();
    payload["payment_method"] = json!("credit_card");

    let response = client
        .post(format!("{}/api/checkout", app.base_url))
        .header("x-cart-session", "s1")
        .json(&payload)
        .send()
        .await
        .expect("Failed to send checkout request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    payload["card_number"] = json!("4242424242424242");
    payload["card_expiry"] = json!("12/27");
    payload["card_cvc"] = json!("123");

    let response = client
        .post(format!("{}/api/checkout", app.base_url))
        .header("x-cart-session", "s1")
        .json(&payload)
        .send()
        .await
        .expect("Failed to send checkout request");
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn empty_cart_cannot_be_checked_out() {
    let app = spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/checkout", app.base_url))
        .header("x-cart-session", "s1")
        .json(&checkout_payload())
        .send()
        .await
        .expect("Failed to send checkout request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn authenticated_checkout_attributes_the_order_and_upserts_the_profile() {
    let app = spawn_server().await;
    let client = reqwest::Client::new();

    let token = register_and_login(&app.base_url, "amaya@example.com", "Muzion15").await;
    let a = insert_product(&app.db, "Tee A", 3000.0, "M").await;
    add_to_cart(&app.base_url, "s1", a, 1, "M").await;

    let response = client
        .post(format!("{}/api/checkout", app.base_url))
        .header("x-cart-session", "s1")
        .bearer_auth(&token)
        .json(&checkout_payload())
        .send()
        .await
        .expect("Failed to send checkout request");
    assert_eq!(response.status(), StatusCode::CREATED);

    // The order shows up in the customer's account area.
    let own_orders = client
        .get(format!("{}/api/profile/orders", app.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send orders request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse orders JSON");
    assert_eq!(own_orders.as_array().map(Vec::len), Some(1));

    // And the submitted address was copied onto the profile.
    let profile = client
        .get(format!("{}/api/profile", app.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send profile request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse profile JSON");
    assert_eq!(profile["address_line1"].as_str(), Some("123 Galle Road"));
    assert_eq!(profile["city"].as_str(), Some("Colombo"));
}

#[tokio::test]
async fn guest_checkout_leaves_customer_unset() {
    let app = spawn_server().await;

    let a = insert_product(&app.db, "Tee A", 3000.0, "M").await;
    add_to_cart(&app.base_url, "s1", a, 1, "M").await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/checkout", app.base_url))
        .header("x-cart-session", "s1")
        .json(&checkout_payload())
        .send()
        .await
        .expect("Failed to send checkout request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let orders = order::Entity::find()
        .all(&*app.db)
        .await
        .expect("Failed to load orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].customer_id, None);
}

#[tokio::test]
async fn failed_item_insert_leaves_no_order_header_behind() {
    let db = memory_db().await;

    // Force the item insert to fail after the header insert succeeded; the
    // transaction must take the header down with it.
    db.execute_unprepared("DROP TABLE order_items")
        .await
        .expect("Failed to drop order_items");

    let mut cart = Cart::default();
    cart.add_item(
        &ProductSnapshot {
            product_id: 1,
            name: "Tee A".to_owned(),
            price: 3000.0,
        },
        1,
        "M",
        "Black",
        "#000000",
    );

    let payload: CheckoutPayload =
        serde_json::from_value(checkout_payload()).expect("Failed to build payload");
    let result = submit_order(&db, &payload, cart.lines(), None).await;
    assert!(matches!(result, Err(CheckoutError::Db(_))));

    let headers = order::Entity::find()
        .count(&db)
        .await
        .expect("Failed to count orders");
    assert_eq!(headers, 0);
}

#[tokio::test]
async fn order_items_capture_the_price_at_add_time() {
    let app = spawn_server().await;
    let client = reqwest::Client::new();

    let a = insert_product(&app.db, "Tee A", 3000.0, "M").await;
    add_to_cart(&app.base_url, "s1", a, 1, "M").await;

    // A price change between add-to-cart and checkout must not reach the
    // order item.
    use sea_orm::{ActiveModelTrait, Set};
    use threadly::entities::product;
    let mut live: product::ActiveModel = product::Entity::find_by_id(a)
        .one(&*app.db)
        .await
        .expect("Failed to load product")
        .expect("Product missing")
        .into();
    live.price = Set(9999.0);
    live.update(&*app.db).await.expect("Failed to update price");

    let response = client
        .post(format!("{}/api/checkout", app.base_url))
        .header("x-cart-session", "s1")
        .json(&checkout_payload())
        .send()
        .await
        .expect("Failed to send checkout request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let items = order_item::Entity::find()
        .all(&*app.db)
        .await
        .expect("Failed to load items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price, 3000.0);
}
