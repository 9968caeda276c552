pub mod profile;

use axum::{middleware::from_fn_with_state, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::middleware::auth::{auth_middleware, AuthState};
use profile::profile_router;

pub fn user_api_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .nest("/", profile_router(db.clone()))
        .layer(from_fn_with_state(
            AuthState {
                db,
                require_admin: false,
            },
            auth_middleware,
        ))
}
