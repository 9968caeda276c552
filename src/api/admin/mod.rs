pub mod order;
pub mod product;
pub mod user;

use axum::{middleware::from_fn_with_state, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::catalog::CatalogCache;
use crate::middleware::auth::{auth_middleware, AuthState};

use order::admin_order_router;
use product::admin_product_router;
use user::admin_user_router;

pub fn admin_api_router(db: Arc<DatabaseConnection>, catalog: CatalogCache) -> Router {
    Router::new()
        .nest("/", admin_product_router(db.clone(), catalog))
        .nest("/", admin_order_router(db.clone()))
        .nest("/", admin_user_router(db.clone()))
        .layer(from_fn_with_state(
            AuthState {
                db,
                require_admin: true,
            },
            auth_middleware,
        ))
}
