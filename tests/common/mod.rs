#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use serde_json::json;
use std::sync::Arc;

use threadly::create_app;
use threadly::entities::{self, product, product_variant};

pub struct TestApp {
    pub base_url: String,
    pub db: Arc<DatabaseConnection>,
}

/// Boots the whole service against a private in-memory database on an
/// ephemeral port and returns its base URL.
pub async fn spawn_server() -> TestApp {
    let db = Arc::new(memory_db().await);
    let app = create_app(db.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });

    TestApp {
        base_url: format!("http://{}", addr),
        db,
    }
}

/// A fresh in-memory SQLite database with the schema applied. A single pooled
/// connection keeps every query on the same in-memory instance.
pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    entities::setup_schema(&db)
        .await
        .expect("Failed to create schema");
    db
}

pub async fn register_and_login(base_url: &str, email: &str, password: &str) -> String {
    let client = reqwest::Client::new();

    let register_response = client
        .post(format!("{}/api/register", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(register_response.status(), reqwest::StatusCode::CREATED);

    login(base_url, email, password).await
}

pub async fn login(base_url: &str, email: &str, password: &str) -> String {
    let client = reqwest::Client::new();

    let login_response = client
        .post(format!("{}/api/login", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(login_response.status(), reqwest::StatusCode::OK);

    let body = login_response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login response JSON");
    body["token"]
        .as_str()
        .expect("Token not found in login response")
        .to_owned()
}

/// Seeds the back-office account and returns a bearer token for it.
pub async fn admin_token(app: &TestApp) -> String {
    entities::seed_admin(&app.db, "admin@store.test", "Secret15")
        .await
        .expect("Failed to seed admin");
    login(&app.base_url, "admin@store.test", "Secret15").await
}

/// Inserts a product with a single Black variant in the given size, so it can
/// be added to a cart straight away.
pub async fn insert_product(db: &DatabaseConnection, name: &str, price: f32, size: &str) -> i32 {
    let new_product = product::ActiveModel {
        name: Set(name.to_owned()),
        description: Set(format!("{} description", name)),
        price: Set(price),
        stock: Set(25),
        category: Set(Some("T-Shirts".to_owned())),
        is_featured: Set(false),
        tags: Set(String::new()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let product_id = product::Entity::insert(new_product)
        .exec(db)
        .await
        .expect("Failed to insert product")
        .last_insert_id;

    let variant = product_variant::ActiveModel {
        product_id: Set(product_id),
        color_name: Set("Black".to_owned()),
        color_hex: Set("#000000".to_owned()),
        size: Set(size.to_owned()),
        stock: Set(25),
        ..Default::default()
    };
    product_variant::Entity::insert(variant)
        .exec(db)
        .await
        .expect("Failed to insert variant");

    product_id
}

/// A complete, valid cash-on-delivery checkout payload.
pub fn checkout_payload() -> serde_json::Value {
    json!({
        "first_name": "Amaya",
        "last_name": "Perera",
        "email": "amaya@example.com",
        "phone": "0771234567",
        "address_line1": "123 Galle Road",
        "city": "Colombo",
        "state": "Western",
        "postal_code": "10300",
        "country": "Sri Lanka",
        "payment_method": "cod"
    })
}

pub async fn add_to_cart(
    base_url: &str,
    session: &str,
    product_id: i32,
    quantity: u32,
    size: &str,
) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/api/cart", base_url))
        .header("x-cart-session", session)
        .json(&json!({
            "product_id": product_id,
            "quantity": quantity,
            "size": size,
            "color": "Black"
        }))
        .send()
        .await
        .expect("Failed to send add-to-cart request")
}
