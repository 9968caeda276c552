use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{
    order, order::Entity as OrderEntity, order::Status, order_item,
    order_item::Entity as OrderItemEntity,
};

pub fn admin_order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/order", get(list_orders))
        .route("/order/:id", get(get_order).patch(patch_status))
        .layer(Extension(db))
}

async fn list_orders(Extension(db): Extension<Arc<DatabaseConnection>>) -> impl IntoResponse {
    let orders = match OrderEntity::find()
        .order_by_desc(order::Column::CreatedAt)
        .all(&*db)
        .await
    {
        Ok(orders) => orders,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let items = match OrderItemEntity::find()
        .filter(order_item::Column::OrderId.is_in(order_ids))
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

    let mut items_by_order: HashMap<i32, Vec<order_item::Model>> = HashMap::new();
    for item in items {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    let body: Vec<serde_json::Value> = orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            json!({ "order": order, "items": items })
        })
        .collect();

    (StatusCode::OK, Json(body)).into_response()
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

    (StatusCode::OK, Json(json!({ "order": order, "items": items }))).into_response()
}

async fn patch_status(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchStatusPayload>,
) -> impl IntoResponse {
    let next: Status = match payload.status.parse() {
        Ok(status) => status,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
        }
    };

    let existing = match OrderEntity::find_by_id(id).one(&*db).await {
        Ok(Some(existing)) => existing,
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

    if !existing.status.can_transition_to(next) {
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "error": format!("Cannot transition from {} to {}", existing.status, next)
            })),
        )
            .into_response();
    }

    let mut existing: order::ActiveModel = existing.into();
    existing.status = Set(next);
    existing.updated_at = Set(Utc::now());

    match existing.update(&*db).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Failed to patch this resource" })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct PatchStatusPayload {
    status: String,
}
