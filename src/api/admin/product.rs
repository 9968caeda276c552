use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::catalog::CatalogCache;
use crate::entities::{
    product, product::Entity as ProductEntity, product_image,
    product_image::Entity as ProductImageEntity, product_variant,
    product_variant::Entity as ProductVariantEntity,
};

pub fn admin_product_router(db: Arc<DatabaseConnection>, catalog: CatalogCache) -> Router {
    Router::new()
        .route("/product", get(list_products).post(create_product))
        .route(
            "/product/:id",
            get(get_product).patch(patch_product).delete(delete_product),
        )
        .layer(Extension(db))
        .layer(Extension(catalog))
}

async fn list_products(Extension(db): Extension<Arc<DatabaseConnection>>) -> impl IntoResponse {
    match ProductEntity::find()
        .order_by_asc(product::Column::Id)
        .all(&*db)
        .await
    {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response(),
    }
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> impl IntoResponse {
    match ProductEntity::find_by_id(id).one(&*db).await {
        Ok(Some(prod)) => (StatusCode::OK, Json(prod)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No product with {} id was found", id)
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

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(catalog): Extension<CatalogCache>,
    Json(payload): Json<CreateProductPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Validation failed",
                "fields": errors.field_errors().keys().copied().collect::<Vec<_>>()
            })),
        )
            .into_response();
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    let new_product = product::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        category: Set(payload.category),
        is_featured: Set(payload.featured.unwrap_or_default()),
        tags: Set(payload.tags.unwrap_or_default().join(",")),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let product_id = match ProductEntity::insert(new_product).exec(&txn).await {
        Ok(result) => result.last_insert_id,
        Err(_) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "Product already exists" })),
            )
                .into_response();
        }
    };

    if let Err(response) = insert_images_and_variants(
        &txn,
        product_id,
        payload.images.unwrap_or_default(),
        payload.variants.unwrap_or_default(),
    )
    .await
    {
        return response;
    }

    match txn.commit().await {
        Ok(_) => {
            catalog.invalidate();
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Product created successfully",
                    "id": product_id,
                })),
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response(),
    }
}

async fn patch_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(catalog): Extension<CatalogCache>,
    Json(payload): Json<PatchProductPayload>,
) -> impl IntoResponse {
    if payload.price.is_some_and(|price| price < 0.0) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "Price must be non-negative" })),
        )
            .into_response();
    }
    if payload.stock.is_some_and(|stock| stock < 0) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "Stock must be non-negative" })),
        )
            .into_response();
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    let existing = match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No product with {} id was found", id)
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

    let mut existing: product::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        existing.name = Set(name);
    }
    if let Some(description) = payload.description {
        existing.description = Set(description);
    }
    if let Some(price) = payload.price {
        existing.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        existing.stock = Set(stock);
    }
    if let Some(category) = payload.category {
        existing.category = Set(Some(category));
    }
    if let Some(featured) = payload.featured {
        existing.is_featured = Set(featured);
    }
    if let Some(tags) = payload.tags {
        existing.tags = Set(tags.join(","));
    }

    if let Err(_) = existing.update(&txn).await {
        let _ = txn.rollback().await;
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Failed to patch this resource" })),
        )
            .into_response();
    }

    // Replacing images or variants is wholesale: drop the old rows, insert
    // the submitted set.
    if payload.images.is_some() || payload.variants.is_some() {
        if payload.images.is_some() {
            if let Err(_) = ProductImageEntity::delete_many()
                .filter(product_image::Column::ProductId.eq(id))
                .exec(&txn)
                .await
            {
                let _ = txn.rollback().await;
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response();
            }
        }
        if payload.variants.is_some() {
            if let Err(_) = ProductVariantEntity::delete_many()
                .filter(product_variant::Column::ProductId.eq(id))
                .exec(&txn)
                .await
            {
                let _ = txn.rollback().await;
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response();
            }
        }
        if let Err(response) = insert_images_and_variants(
            &txn,
            id,
            payload.images.unwrap_or_default(),
            payload.variants.unwrap_or_default(),
        )
        .await
        {
            return response;
        }
    }

    match txn.commit().await {
        Ok(_) => {
            catalog.invalidate();
            (
                StatusCode::OK,
                Json(json!({ "message": "Resource patched successfully" })),
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response(),
    }
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(catalog): Extension<CatalogCache>,
) -> impl IntoResponse {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    let existing = match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No product with {} id was found", id)
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

    // Child rows go first; SQLite only cascades with the pragma enabled.
    let image_delete = ProductImageEntity::delete_many()
        .filter(product_image::Column::ProductId.eq(id))
        .exec(&txn)
        .await;
    let variant_delete = ProductVariantEntity::delete_many()
        .filter(product_variant::Column::ProductId.eq(id))
        .exec(&txn)
        .await;

    let existing: product::ActiveModel = existing.into();
    if image_delete.is_err() || variant_delete.is_err() || existing.delete(&txn).await.is_err() {
        let _ = txn.rollback().await;
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Failed to delete this resource" })),
        )
            .into_response();
    }

    match txn.commit().await {
        Ok(_) => {
            catalog.invalidate();
            (
                StatusCode::OK,
                Json(json!({ "message": "Resource deleted successfully" })),
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response(),
    }
}

async fn insert_images_and_variants(
    txn: &sea_orm::DatabaseTransaction,
    product_id: i32,
    images: Vec<String>,
    variants: Vec<VariantPayload>,
) -> Result<(), axum::response::Response> {
    for (position, url) in images.into_iter().enumerate() {
        let image = product_image::ActiveModel {
            product_id: Set(product_id),
            url: Set(url),
            position: Set(position as i32),
            ..Default::default()
        };
        if ProductImageEntity::insert(image).exec(txn).await.is_err() {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response());
        }
    }

    for variant in variants {
        let row = product_variant::ActiveModel {
            product_id: Set(product_id),
            color_name: Set(variant.color_name),
            color_hex: Set(variant.color_hex),
            size: Set(variant.size),
            stock: Set(variant.stock.unwrap_or_default()),
            ..Default::default()
        };
        if ProductVariantEntity::insert(row).exec(txn).await.is_err() {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response());
        }
    }

    Ok(())
}

#[derive(Deserialize, Validate)]
struct CreateProductPayload {
    #[validate(length(min = 1))]
    name: String,
    description: String,
    #[validate(range(min = 0.0))]
    price: f32,
    #[validate(range(min = 0))]
    stock: i32,
    category: Option<String>,
    featured: Option<bool>,
    tags: Option<Vec<String>>,
    images: Option<Vec<String>>,
    variants: Option<Vec<VariantPayload>>,
}

#[derive(Deserialize)]
struct PatchProductPayload {
    name: Option<String>,
    description: Option<String>,
    price: Option<f32>,
    stock: Option<i32>,
    category: Option<String>,
    featured: Option<bool>,
    tags: Option<Vec<String>>,
    images: Option<Vec<String>>,
    variants: Option<Vec<VariantPayload>>,
}

#[derive(Deserialize)]
struct VariantPayload {
    color_name: String,
    color_hex: String,
    size: String,
    stock: Option<i32>,
}
