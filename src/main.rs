//! IntelHub - Competitor and sourcing intelligence backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intelhub::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxCompetitorRepository, SqlxMasterProductRepository, SqlxTagIndexRepository,
            SqlxTagRepository, SqlxVendorRepository, SqlxWishlistRepository,
        },
    },
    services::{
        CompetitorService, EntityStores, MasterProductService, TagService, VendorService,
        WishlistService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intelhub=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting IntelHub...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let tag_repo = SqlxTagRepository::boxed(pool.clone());
    let index_repo = SqlxTagIndexRepository::boxed(pool.clone());
    let competitor_repo = SqlxCompetitorRepository::boxed(pool.clone());
    let vendor_repo = SqlxVendorRepository::boxed(pool.clone());
    let wishlist_repo = SqlxWishlistRepository::boxed(pool.clone());
    let product_repo = SqlxMasterProductRepository::boxed(pool.clone());

    // The tag service backs every entity service; the entity stores let
    // merges rewrite denormalized tag lists
    let tag_service = Arc::new(TagService::new(tag_repo, index_repo).with_entity_stores(
        EntityStores {
            competitors: competitor_repo.clone(),
            vendors: vendor_repo.clone(),
            wishlist: wishlist_repo.clone(),
        },
    ));

    let competitor_service = Arc::new(CompetitorService::new(
        competitor_repo.clone(),
        tag_service.clone(),
    ));
    let vendor_service = Arc::new(VendorService::new(
        vendor_repo.clone(),
        wishlist_repo.clone(),
        tag_service.clone(),
    ));
    let wishlist_service = Arc::new(WishlistService::new(
        wishlist_repo.clone(),
        vendor_repo,
        product_repo.clone(),
        competitor_repo,
        tag_service.clone(),
    ));
    let master_product_service = Arc::new(MasterProductService::new(product_repo, wishlist_repo));

    // Build application state
    let state = AppState {
        pool,
        tag_service,
        competitor_service,
        vendor_service,
        wishlist_service,
        master_product_service,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin)?;

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
