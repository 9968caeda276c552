use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::entities::customer::Entity as CustomerEntity;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub customer_id: i32,
    pub is_admin: bool,
    pub exp: usize,
}

#[derive(Clone)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
    pub require_admin: bool,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Unknown customer")]
    UnknownCustomer,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Internal server error")]
    InternalServerError,
}

/// Decodes the bearer token, re-checks the customer row, and injects `Claims`
/// into request extensions. Admin-gated routers set `require_admin`; a valid
/// token without the admin flag answers 403 rather than 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Missing bearer token" })),
        )
    })?;

    let claims = match validate_token(&state.db, &token).await {
        Ok(claims) => claims,
        Err(AuthError::InternalServerError) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            ));
        }
        Err(err) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": err.to_string() })),
            ));
        }
    };

    if state.require_admin && !claims.is_admin {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Admin access required" })),
        ));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Optional authentication for routes that also serve guests (checkout):
/// any missing/invalid token simply yields None.
pub async fn claims_from_headers(db: &DatabaseConnection, headers: &HeaderMap) -> Option<Claims> {
    let token = bearer_token(headers)?;
    validate_token(db, &token).await.ok()
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned)
}

pub fn generate_token(customer_id: i32, is_admin: bool) -> Result<String, AuthError> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or(AuthError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims {
        customer_id,
        is_admin,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret_key().as_bytes()),
    )
    .map_err(|_| AuthError::GenerationFail)
}

/// Token claims are only trusted after the customer row is re-read, so a
/// deleted account or a flipped admin flag takes effect immediately.
pub async fn validate_token(db: &DatabaseConnection, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret_key().as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::InvalidToken)?;

    let claims = token_data.claims;

    match CustomerEntity::find_by_id(claims.customer_id).one(db).await {
        Ok(Some(account)) => Ok(Claims {
            customer_id: account.id,
            is_admin: account.is_admin,
            exp: claims.exp,
        }),
        Ok(None) => Err(AuthError::UnknownCustomer),
        Err(_) => Err(AuthError::InternalServerError),
    }
}

fn secret_key() -> String {
    std::env::var("SECRET").unwrap_or_else(|_| "threadly-dev-secret".to_owned())
}
