pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod entities;
pub mod middleware;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use cart::CartRegistry;
use catalog::CatalogCache;

/// Builds the full application router with fresh per-process state (cart
/// registry, catalog cache). Integration tests call this against an
/// in-memory database.
pub fn create_app(db: Arc<DatabaseConnection>) -> Router {
    let carts = CartRegistry::default();
    let catalog = CatalogCache::default();

    api::create_api_router(db, carts, catalog)
        .layer(axum::middleware::from_fn(
            middleware::logging::logging_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
