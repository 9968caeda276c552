pub mod admin;
pub mod public;
pub mod user;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::cart::CartRegistry;
use crate::catalog::CatalogCache;

use admin::admin_api_router;
use public::public_api_router;
use user::user_api_router;

pub fn create_api_router(
    db: Arc<DatabaseConnection>,
    carts: CartRegistry,
    catalog: CatalogCache,
) -> Router {
    Router::new()
        .nest(
            "/api",
            public_api_router(db.clone(), carts.clone(), catalog.clone()),
        )
        .nest("/api", user_api_router(db.clone()))
        .nest("/api/admin", admin_api_router(db, catalog))
}
