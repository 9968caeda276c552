use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::entities::{customer, customer::Entity as CustomerEntity};

pub fn admin_user_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/user", get(list_users))
        .route("/user/:id", get(get_user).patch(patch_user))
        .layer(Extension(db))
}

async fn list_users(Extension(db): Extension<Arc<DatabaseConnection>>) -> impl IntoResponse {
    match CustomerEntity::find()
        .order_by_asc(customer::Column::Id)
        .all(&*db)
        .await
    {
        Ok(accounts) => {
            let body: Vec<UserRow> = accounts.into_iter().map(UserRow::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response(),
    }
}

async fn get_user(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    match CustomerEntity::find_by_id(id).one(&*db).await {
        Ok(Some(account)) => (StatusCode::OK, Json(UserRow::from(account))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No user with {} id was found", id)
            })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response(),
    }
}

/// Toggles the back-office capability flag.
async fn patch_user(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchUserPayload>,
) -> impl IntoResponse {
    let existing = match CustomerEntity::find_by_id(id).one(&*db).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No user with {} id was found", id)
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

    let mut existing: customer::ActiveModel = existing.into();
    existing.is_admin = Set(payload.is_admin);

    match existing.update(&*db).await {
        Ok(updated) => (StatusCode::OK, Json(UserRow::from(updated))).into_response(),
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Failed to patch this resource" })),
        )
            .into_response(),
    }
}

#[derive(Serialize)]
struct UserRow {
    id: i32,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    is_admin: bool,
}

impl From<customer::Model> for UserRow {
    fn from(value: customer::Model) -> UserRow {
        UserRow {
            id: value.id,
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            phone: value.phone,
            is_admin: value.is_admin,
        }
    }
}

#[derive(Deserialize)]
struct PatchUserPayload {
    is_admin: bool,
}
