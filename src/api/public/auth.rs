use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::{customer, customer::Entity as CustomerEntity, hash_password};
use crate::middleware::auth::generate_token;

pub fn auth_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .layer(Extension(db))
}

async fn register(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<RegisterPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Validation failed",
                "fields": errors.field_errors().keys().copied().collect::<Vec<_>>()
            })),
        );
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            );
        }
    };

    let new_customer = customer::ActiveModel {
        email: Set(payload.email),
        password_hash: Set(password_hash),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        is_admin: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match CustomerEntity::insert(new_customer).exec(&*db).await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(json!({ "message": "Account registered successfully" })),
        ),
        Err(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "An account with this email already exists" })),
        ),
    }
}

async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<LoginPayload>,
) -> impl IntoResponse {
    let result = CustomerEntity::find()
        .filter(customer::Column::Email.eq(&*payload.email))
        .one(&*db)
        .await;

    match result {
        Ok(Some(account)) if account.verify_password(&payload.password) => {
            match generate_token(account.id, account.is_admin) {
                Ok(token) => (StatusCode::OK, Json(json!({ "token": token }))),
                Err(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                ),
            }
        }
        Ok(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid email or password" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct RegisterPayload {
    #[validate(email)]
    email: String,
    #[validate(length(min = 8))]
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}
