//! Shopper-facing catalog: projects product/variant/image rows into display
//! records and filters/sorts them in memory.
//!
//! Unique colors and sizes are derived from variant rows on every projection,
//! never stored denormalized; the projected catalog is cached per process and
//! invalidated whenever the admin surface writes to products.

use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::entities::{
    product, product::Entity as ProductEntity, product_image,
    product_image::Entity as ProductImageEntity, product_variant,
    product_variant::Entity as ProductVariantEntity,
};

/// Shown when a product has no image rows; the projection guarantees at least
/// one image URL per product.
pub const PLACEHOLDER_IMAGE: &str = "https://images.example.com/placeholder.jpg";

#[derive(Clone, Debug, Serialize)]
pub struct ColorOption {
    pub name: String,
    pub hex: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CatalogProduct {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f32,
    pub stock: i32,
    pub category: Option<String>,
    pub featured: bool,
    pub images: Vec<String>,
    pub colors: Vec<ColorOption>,
    pub sizes: Vec<String>,
    pub tags: Vec<String>,
}

/// Deterministic projection: variants grouped by product id in one pass,
/// colors unique by name and sizes unique by label, both in first-seen order.
pub fn project_catalog(
    products: Vec<product::Model>,
    variants: Vec<product_variant::Model>,
    images: Vec<product_image::Model>,
) -> Vec<CatalogProduct> {
    let mut variants_by_product: HashMap<i32, Vec<product_variant::Model>> = HashMap::new();
    for variant in variants {
        variants_by_product
            .entry(variant.product_id)
            .or_default()
            .push(variant);
    }

    let mut images_by_product: HashMap<i32, Vec<product_image::Model>> = HashMap::new();
    for image in images {
        images_by_product
            .entry(image.product_id)
            .or_default()
            .push(image);
    }

    products
        .into_iter()
        .map(|prod| {
            let mut colors: Vec<ColorOption> = Vec::new();
            let mut sizes: Vec<String> = Vec::new();
            for variant in variants_by_product.get(&prod.id).into_iter().flatten() {
                if !colors.iter().any(|c| c.name == variant.color_name) {
                    colors.push(ColorOption {
                        name: variant.color_name.clone(),
                        hex: variant.color_hex.clone(),
                    });
                }
                if !sizes.iter().any(|s| s == &variant.size) {
                    sizes.push(variant.size.clone());
                }
            }

            let mut images: Vec<String> = images_by_product
                .remove(&prod.id)
                .unwrap_or_default()
                .into_iter()
                .map(|img| img.url)
                .collect();
            if images.is_empty() {
                images.push(PLACEHOLDER_IMAGE.to_owned());
            }

            let tags = prod
                .tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect();

            CatalogProduct {
                id: prod.id,
                name: prod.name,
                description: prod.description,
                price: prod.price,
                stock: prod.stock,
                category: prod.category,
                featured: prod.is_featured,
                images,
                colors,
                sizes,
                tags,
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Insertion/creation order, the storefront default.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            "name-asc" => Ok(Self::NameAsc),
            _ => Err(format!("Invalid sort key: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FilterCriteria {
    pub search: Option<String>,
    /// Bounds as percentages (0..=100) of the full catalog's price span.
    pub price_range_pct: (u8, u8),
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub sort: SortKey,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        FilterCriteria {
            search: None,
            price_range_pct: (0, 100),
            sizes: Vec::new(),
            colors: Vec::new(),
            sort: SortKey::Newest,
        }
    }
}

/// Applies every active predicate (ANDed together) and the sort, returning a
/// fresh collection. The price slider is anchored to the full catalog's
/// min/max price, not recomputed from the filtered set.
pub fn filter_products(catalog: &[CatalogProduct], criteria: &FilterCriteria) -> Vec<CatalogProduct> {
    if catalog.is_empty() {
        return Vec::new();
    }

    let min_price = catalog
        .iter()
        .map(|p| p.price)
        .fold(f32::INFINITY, f32::min);
    let max_price = catalog
        .iter()
        .map(|p| p.price)
        .fold(f32::NEG_INFINITY, f32::max);
    let span = max_price - min_price;

    let (lo_pct, hi_pct) = criteria.price_range_pct;
    let price_lo = min_price + f32::from(lo_pct.min(100)) / 100.0 * span;
    let price_hi = min_price + f32::from(hi_pct.min(100)) / 100.0 * span;

    let search = criteria
        .search
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut result: Vec<CatalogProduct> = catalog
        .iter()
        .filter(|prod| {
            if let Some(query) = &search {
                let hit = prod.name.to_lowercase().contains(query)
                    || prod.description.to_lowercase().contains(query)
                    || prod.tags.iter().any(|t| t.to_lowercase().contains(query));
                if !hit {
                    return false;
                }
            }

            // Small tolerance so boundary products survive float conversion.
            if prod.price < price_lo - 1e-3 || prod.price > price_hi + 1e-3 {
                return false;
            }

            if !criteria.sizes.is_empty()
                && !prod.sizes.iter().any(|s| criteria.sizes.contains(s))
            {
                return false;
            }

            if !criteria.colors.is_empty()
                && !prod.colors.iter().any(|c| criteria.colors.contains(&c.name))
            {
                return false;
            }

            true
        })
        .cloned()
        .collect();

    match criteria.sort {
        SortKey::Newest => {}
        SortKey::PriceAsc => result.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::PriceDesc => result.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortKey::NameAsc => result.sort_by(|a, b| a.name.cmp(&b.name)),
    }

    result
}

/// Memoized catalog projection. Loaded lazily, dropped whenever the admin
/// surface writes to products, variants or images.
#[derive(Clone, Default)]
pub struct CatalogCache {
    inner: Arc<Mutex<Option<Arc<Vec<CatalogProduct>>>>>,
}

impl CatalogCache {
    pub async fn get_or_load(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Arc<Vec<CatalogProduct>>, DbErr> {
        if let Some(cached) = self
            .inner
            .lock()
            .expect("catalog cache lock poisoned")
            .clone()
        {
            return Ok(cached);
        }

        let products = ProductEntity::find()
            .order_by_asc(product::Column::Id)
            .all(db)
            .await?;
        let variants = ProductVariantEntity::find()
            .order_by_asc(product_variant::Column::Id)
            .all(db)
            .await?;
        let images = ProductImageEntity::find()
            .order_by_asc(product_image::Column::Position)
            .all(db)
            .await?;

        let catalog = Arc::new(project_catalog(products, variants, images));
        *self.inner.lock().expect("catalog cache lock poisoned") = Some(catalog.clone());
        Ok(catalog)
    }

    pub fn invalidate(&self) {
        *self.inner.lock().expect("catalog cache lock poisoned") = None;
    }
}
