use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::cart::{Cart, CartRegistry, ProductSnapshot};
use crate::catalog::CatalogCache;

/// Carts are keyed by this opaque header; a client keeps the same value for
/// the lifetime of its browsing session.
pub const SESSION_HEADER: &str = "x-cart-session";

pub fn cart_router(db: Arc<DatabaseConnection>, carts: CartRegistry, catalog: CatalogCache) -> Router {
    Router::new()
        .route("/cart/session", post(new_session))
        .route("/cart", get(get_cart).post(add_item).delete(clear_cart))
        .route(
            "/cart/product/:id",
            delete(remove_item).patch(update_quantity),
        )
        .layer(Extension(db))
        .layer(Extension(carts))
        .layer(Extension(catalog))
}

async fn new_session() -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({ "session": Uuid::new_v4().to_string() })),
    )
}

async fn get_cart(
    headers: HeaderMap,
    Extension(carts): Extension<CartRegistry>,
) -> impl IntoResponse {
    let session = match session_key(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let cart = carts.snapshot(&session);
    (StatusCode::OK, Json(cart_body(&cart))).into_response()
}

async fn add_item(
    headers: HeaderMap,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(carts): Extension<CartRegistry>,
    Extension(catalog): Extension<CatalogCache>,
    Json(payload): Json<AddItemPayload>,
) -> impl IntoResponse {
    let session = match session_key(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let full_catalog = match catalog.get_or_load(&db).await {
        Ok(catalog) => catalog,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    let Some(product) = full_catalog.iter().find(|p| p.id == payload.product_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No product with {} id was found", payload.product_id)
            })),
        )
            .into_response();
    };

    if !product.sizes.iter().any(|s| s == &payload.size) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("Size {} is not offered for this product", payload.size)
            })),
        )
            .into_response();
    }

    let Some(color) = product.colors.iter().find(|c| c.name == payload.color) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("Color {} is not offered for this product", payload.color)
            })),
        )
            .into_response();
    };

    let snapshot = ProductSnapshot {
        product_id: product.id,
        name: product.name.clone(),
        price: product.price,
    };
    let color_hex = color.hex.clone();

    let (message, cart) = carts.with_cart(&session, |cart| {
        let message = cart.add_item(
            &snapshot,
            payload.quantity,
            &payload.size,
            &payload.color,
            &color_hex,
        );
        (message, cart.clone())
    });

    let mut body = cart_body(&cart);
    body["message"] = json!(message);
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_quantity(
    Path(product_id): Path<i32>,
    headers: HeaderMap,
    Extension(carts): Extension<CartRegistry>,
    Json(payload): Json<UpdateQuantityPayload>,
) -> impl IntoResponse {
    let session = match session_key(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let (touched, cart) = carts.with_cart(&session, |cart| {
        (cart.update_quantity(product_id, payload.quantity), cart.clone())
    });

    if touched == 0 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No cart line for product {} was found", product_id)
            })),
        )
            .into_response();
    }

    (StatusCode::OK, Json(cart_body(&cart))).into_response()
}

async fn remove_item(
    Path(product_id): Path<i32>,
    headers: HeaderMap,
    Extension(carts): Extension<CartRegistry>,
) -> impl IntoResponse {
    let session = match session_key(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let (removed, cart) = carts.with_cart(&session, |cart| {
        (cart.remove_item(product_id), cart.clone())
    });

    if removed == 0 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No cart line for product {} was found", product_id)
            })),
        )
            .into_response();
    }

    (StatusCode::OK, Json(cart_body(&cart))).into_response()
}

async fn clear_cart(
    headers: HeaderMap,
    Extension(carts): Extension<CartRegistry>,
) -> impl IntoResponse {
    let session = match session_key(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let cart = carts.with_cart(&session, |cart| {
        cart.clear();
        cart.clone()
    });

    (StatusCode::OK, Json(cart_body(&cart))).into_response()
}

pub fn session_key(headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": format!("Missing {} header", SESSION_HEADER)
                })),
            )
                .into_response()
        })
}

fn cart_body(cart: &Cart) -> serde_json::Value {
    json!({
        "lines": cart.lines(),
        "total": cart.total(),
        "item_count": cart.item_count(),
    })
}

#[derive(Deserialize, Debug)]
struct AddItemPayload {
    product_id: i32,
    #[serde(default = "default_quantity")]
    quantity: u32,
    size: String,
    color: String,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
struct UpdateQuantityPayload {
    quantity: u32,
}
