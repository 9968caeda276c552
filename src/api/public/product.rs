use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::catalog::{filter_products, CatalogCache, FilterCriteria, SortKey};

pub fn product_router(db: Arc<DatabaseConnection>, catalog: CatalogCache) -> Router {
    Router::new()
        .route("/product", get(get_products))
        .route("/product/:id", get(get_product))
        .layer(Extension(db))
        .layer(Extension(catalog))
}

async fn get_products(
    Query(params): Query<GetProductsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(catalog): Extension<CatalogCache>,
) -> impl IntoResponse {
    let sort = match params.sort.as_deref() {
        Some(raw) => match raw.parse::<SortKey>() {
            Ok(sort) => sort,
            Err(message) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
                    .into_response();
            }
        },
        None => SortKey::default(),
    };

    let full_catalog = match catalog.get_or_load(&db).await {
        Ok(catalog) => catalog,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    let criteria = FilterCriteria {
        search: params.search,
        price_range_pct: (
            params.price_min_pct.unwrap_or(0),
            params.price_max_pct.unwrap_or(100),
        ),
        sizes: split_csv(params.sizes.as_deref()),
        colors: split_csv(params.colors.as_deref()),
        sort,
    };

    let mut result = filter_products(&full_catalog, &criteria);
    if params.featured == Some(true) {
        result.retain(|prod| prod.featured);
    }

    (StatusCode::OK, Json(result)).into_response()
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(catalog): Extension<CatalogCache>,
) -> impl IntoResponse {
    let full_catalog = match catalog.get_or_load(&db).await {
        Ok(catalog) => catalog,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    match full_catalog.iter().find(|prod| prod.id == id) {
        Some(prod) => (StatusCode::OK, Json(prod.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No product with {} id was found", id)
            })),
        )
            .into_response(),
    }
}

fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Deserialize)]
struct GetProductsQuery {
    search: Option<String>,
    price_min_pct: Option<u8>,
    price_max_pct: Option<u8>,
    sizes: Option<String>,
    colors: Option<String>,
    sort: Option<String>,
    featured: Option<bool>,
}
