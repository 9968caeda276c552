pub mod auth;
pub mod cart;
pub mod checkout;
pub mod product;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::cart::CartRegistry;
use crate::catalog::CatalogCache;

use auth::auth_router;
use cart::cart_router;
use checkout::checkout_router;
use product::product_router;

pub fn public_api_router(
    db: Arc<DatabaseConnection>,
    carts: CartRegistry,
    catalog: CatalogCache,
) -> Router {
    Router::new()
        .nest("/", auth_router(db.clone()))
        .nest("/", product_router(db.clone(), catalog.clone()))
        .nest("/", cart_router(db.clone(), carts.clone(), catalog))
        .nest("/", checkout_router(db, carts))
}
