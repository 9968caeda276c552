pub mod customer;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_image;
pub mod product_variant;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Schema, Set, TransactionTrait,
};

use crate::entities::{
    customer::Entity as Customer, order::Entity as Order, order_item::Entity as OrderItem,
    product::Entity as Product, product_image::Entity as ProductImage,
    product_variant::Entity as ProductVariant,
};

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    let mut statements = vec![
        schema.create_table_from_entity(Customer),
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(ProductImage),
        schema.create_table_from_entity(ProductVariant),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderItem),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(db.get_database_backend().build(&*statement))
            .await?;
    }

    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

/// Creates the back-office account when it does not exist yet, returning its id.
pub async fn seed_admin(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<i32, DbErr> {
    if let Some(existing) = Customer::find()
        .filter(customer::Column::Email.eq(email))
        .one(db)
        .await?
    {
        return Ok(existing.id);
    }

    let password_hash = hash_password(password)
        .map_err(|err| DbErr::Custom(format!("Failed to hash admin password: {err}")))?;

    let admin = customer::ActiveModel {
        email: Set(email.to_owned()),
        password_hash: Set(password_hash),
        first_name: Set(Some("Store".to_owned())),
        last_name: Set(Some("Admin".to_owned())),
        is_admin: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let inserted = Customer::insert(admin).exec(db).await?;
    Ok(inserted.last_insert_id)
}

/// Seeds a small apparel catalog so a fresh database is browsable.
/// Does nothing when any product already exists.
pub async fn seed_catalog(db: &DatabaseConnection) -> Result<(), DbErr> {
    if Product::find().count(db).await? > 0 {
        return Ok(());
    }

    let starters: [(&str, &str, f32, i32, bool, &str, &[(&str, &str)], &[&str], &[&str]); 4] = [
        (
            "Urban Classic Tee",
            "A timeless classic tee with a modern fit. Made from 100% organic cotton.",
            2999.0,
            100,
            true,
            "classic,essential,organic",
            &[("Black", "#000000"), ("White", "#FFFFFF")],
            &["S", "M", "L", "XL"],
            &["https://images.example.com/urban-classic-front.jpg"],
        ),
        (
            "Graphic Print Tee",
            "Eye-catching graphic print tee with original artwork on premium cotton blend.",
            3499.0,
            75,
            true,
            "graphic,artwork,statement",
            &[("White", "#FFFFFF"), ("Light Gray", "#D3D3D3")],
            &["S", "M", "L"],
            &["https://images.example.com/graphic-print-front.jpg"],
        ),
        (
            "Vintage Wash Tee",
            "A vintage wash process gives this tee a broken-in look and ultra-soft feel.",
            3299.0,
            50,
            false,
            "vintage,soft,faded",
            &[("Washed Blue", "#A0B8D0"), ("Washed Pink", "#D0A0B8")],
            &["XS", "S", "M", "L", "XL"],
            &["https://images.example.com/vintage-wash-front.jpg"],
        ),
        (
            "Minimal Logo Tee",
            "Clean and understated with a minimal logo design. Perfect for everyday wear.",
            2499.0,
            120,
            false,
            "minimal,logo,everyday",
            &[("Black", "#000000"), ("Gray", "#808080")],
            &["M", "L", "XL"],
            &["https://images.example.com/minimal-logo-front.jpg"],
        ),
    ];

    let txn = db.begin().await?;

    for (name, description, price, stock, featured, tags, colors, sizes, images) in starters {
        let product = product::ActiveModel {
            name: Set(name.to_owned()),
            description: Set(description.to_owned()),
            price: Set(price),
            stock: Set(stock),
            category: Set(Some("T-Shirts".to_owned())),
            is_featured: Set(featured),
            tags: Set(tags.to_owned()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let product_id = Product::insert(product).exec(&txn).await?.last_insert_id;

        for (position, url) in images.iter().enumerate() {
            let image = product_image::ActiveModel {
                product_id: Set(product_id),
                url: Set((*url).to_owned()),
                position: Set(position as i32),
                ..Default::default()
            };
            ProductImage::insert(image).exec(&txn).await?;
        }

        for (color_name, color_hex) in colors {
            for size in sizes {
                let variant = product_variant::ActiveModel {
                    product_id: Set(product_id),
                    color_name: Set((*color_name).to_owned()),
                    color_hex: Set((*color_hex).to_owned()),
                    size: Set((*size).to_owned()),
                    stock: Set(stock / (colors.len() * sizes.len()) as i32),
                    ..Default::default()
                };
                ProductVariant::insert(variant).exec(&txn).await?;
            }
        }
    }

    txn.commit().await
}
