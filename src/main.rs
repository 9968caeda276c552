use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

use threadly::{create_app, entities};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db: DatabaseConnection = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    entities::setup_schema(&db)
        .await
        .expect("Failed to create schema");

    let admin_email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@store.test".to_owned());
    let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "Secret15".to_owned());
    entities::seed_admin(&db, &admin_email, &admin_password)
        .await
        .expect("Failed to seed admin account");
    entities::seed_catalog(&db)
        .await
        .expect("Failed to seed catalog");

    let shared_db = Arc::new(db);
    let app = create_app(shared_db);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await.expect("Server error");
}
