use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{
    customer, customer::Entity as CustomerEntity, order, order::Entity as OrderEntity, order_item,
    order_item::Entity as OrderItemEntity,
};
use crate::middleware::auth::Claims;

pub fn profile_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/profile", get(get_profile).patch(patch_profile))
        .route("/profile/orders", get(get_own_orders))
        .layer(Extension(db))
}

async fn get_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match CustomerEntity::find_by_id(claims.customer_id).one(&*db).await {
        Ok(Some(account)) => {
            (StatusCode::OK, Json(ProfileResponse::from(account))).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Profile not found" })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response(),
    }
}

async fn patch_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatchProfilePayload>,
) -> impl IntoResponse {
    let account = match CustomerEntity::find_by_id(claims.customer_id).one(&*db).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Profile not found" })),
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

    let mut account: customer::ActiveModel = account.into();
    if let Some(first_name) = payload.first_name {
        account.first_name = Set(Some(first_name));
    }
    if let Some(last_name) = payload.last_name {
        account.last_name = Set(Some(last_name));
    }
    if let Some(phone) = payload.phone {
        account.phone = Set(Some(phone));
    }
    if let Some(address_line1) = payload.address_line1 {
        account.address_line1 = Set(Some(address_line1));
    }
    if let Some(address_line2) = payload.address_line2 {
        account.address_line2 = Set(Some(address_line2));
    }
    if let Some(city) = payload.city {
        account.city = Set(Some(city));
    }
    if let Some(state) = payload.state {
        account.state = Set(Some(state));
    }
    if let Some(postal_code) = payload.postal_code {
        account.postal_code = Set(Some(postal_code));
    }
    if let Some(country) = payload.country {
        account.country = Set(Some(country));
    }

    match account.update(&*db).await {
        Ok(updated) => (StatusCode::OK, Json(ProfileResponse::from(updated))).into_response(),
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Failed to update profile" })),
        )
            .into_response(),
    }
}

async fn get_own_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let orders = match OrderEntity::find()
        .filter(order::Column::CustomerId.eq(claims.customer_id))
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

#[derive(Serialize)]
struct ProfileResponse {
    id: i32,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    is_admin: bool,
}

impl From<customer::Model> for ProfileResponse {
    fn from(value: customer::Model) -> ProfileResponse {
        ProfileResponse {
            id: value.id,
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            phone: value.phone,
            address_line1: value.address_line1,
            address_line2: value.address_line2,
            city: value.city,
            state: value.state,
            postal_code: value.postal_code,
            country: value.country,
            is_admin: value.is_admin,
        }
    }
}

#[derive(Deserialize)]
struct PatchProfilePayload {
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
}
