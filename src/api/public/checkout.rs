use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::api::public::cart::session_key;
use crate::cart::CartRegistry;
use crate::checkout::{submit_order, upsert_customer_profile, CheckoutError, CheckoutPayload};
use crate::entities::{order::Entity as OrderEntity, order_item, order_item::Entity as OrderItemEntity};
use crate::middleware::auth::claims_from_headers;

pub fn checkout_router(db: Arc<DatabaseConnection>, carts: CartRegistry) -> Router {
    Router::new()
        .route("/checkout", post(place_order))
        .route("/order/:id", get(get_order))
        .layer(Extension(db))
        .layer(Extension(carts))
}

async fn place_order(
    headers: HeaderMap,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(carts): Extension<CartRegistry>,
    Json(payload): Json<CheckoutPayload>,
) -> impl IntoResponse {
    let session = match session_key(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    // One submission per session at a time; the client keeps its submit
    // control disabled until this request resolves.
    if !carts.begin_submission(&session) {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "A submission is already in progress for this session" })),
        )
            .into_response();
    }

    let lines = carts.snapshot(&session).lines().to_vec();
    let customer_id = claims_from_headers(&db, &headers)
        .await
        .map(|claims| claims.customer_id);

    let result = submit_order(&db, &payload, &lines, customer_id).await;

    match result {
        Ok(receipt) => {
            // The cart empties only after the order is safely persisted, and
            // in the same step that lifts the in-flight flag: a concurrent
            // duplicate submit never sees the purchased lines.
            carts.complete_submission(&session);

            // Secondary profile upsert; a failure here never blocks the
            // confirmation.
            if let Some(customer_id) = customer_id {
                if let Err(err) = upsert_customer_profile(&db, customer_id, &payload).await {
                    warn!(customer_id, error = %err, "Failed to upsert customer profile after checkout");
                }
            }

            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Your order has been placed successfully!",
                    "order": receipt,
                })),
            )
                .into_response()
        }
        Err(err) => {
            carts.end_submission(&session);
            match err {
                CheckoutError::Validation(fields) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "error": "Validation failed",
                        "fields": fields,
                    })),
                )
                    .into_response(),
                CheckoutError::EmptyCart => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Cart is empty" })),
                )
                    .into_response(),
                CheckoutError::Db(_) => (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({
                        "error": "Your order could not be placed. Your cart has been kept so you can retry."
                    })),
                )
                    .into_response(),
            }
        }
    }
}

async fn get_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    let order = match OrderEntity::find_by_id(id).one(&*db).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No order with {} id was found", id)
                })),
            )
                .into_response();
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    let items = match OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .order_by_asc(order_item::Column::Id)
        .all(&*db)
        .await
    {
        Ok(items) => items,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "order": order,
            "order_number": format!("ORD-{:06}", order.id),
            "items": items,
        })),
    )
        .into_response()
}
