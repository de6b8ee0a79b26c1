//! Library catalog server
//!
//! A REST JSON API over a library catalog: books, authors, genres,
//! languages and physical copies, with loan listings and renewals.

use std::{sync::Arc, time::Duration};

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use config::{SessionBackend, StorageBackend};
use repository::{MemoryRepository, PgRepository, Repository};
use services::{
    session::{MemorySessionStore, RedisSessionStore, SessionStore},
    Services,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Connect the configured storage backends and build the services
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let repository: Arc<dyn Repository> = match config.storage.backend {
            StorageBackend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .min_connections(config.database.min_connections)
                    .connect(&config.database.url)
                    .await?;
                tracing::info!("Connected to database");

                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Database migrations completed");

                Arc::new(PgRepository::new(pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory catalog storage; data is lost on exit");
                Arc::new(MemoryRepository::new())
            }
        };

        let sessions: Arc<dyn SessionStore> = match config.session.store {
            SessionBackend::Redis => {
                let store =
                    RedisSessionStore::new(&config.redis.url, config.session.ttl_seconds).await?;
                tracing::info!("Connected to Redis");
                Arc::new(store)
            }
            SessionBackend::Memory => Arc::new(MemorySessionStore::new(Duration::from_secs(
                config.session.ttl_seconds,
            ))),
        };

        Ok(Self::with_backends(config, repository, sessions))
    }

    /// State over already constructed backends
    pub fn with_backends(
        config: AppConfig,
        repository: Arc<dyn Repository>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let services = Services::new(repository, sessions, config.pagination.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Home
        .route("/home", get(api::home::home))
        // Authors
        .route(
            "/authors",
            get(api::authors::list_authors).post(api::authors::create_author),
        )
        .route(
            "/authors/:id",
            get(api::authors::get_author)
                .put(api::authors::update_author)
                .delete(api::authors::delete_author),
        )
        // Books
        .route(
            "/books",
            get(api::books::list_books).post(api::books::create_book),
        )
        .route(
            "/books/:id",
            get(api::books::get_book)
                .put(api::books::update_book)
                .delete(api::books::delete_book),
        )
        // Genres and languages
        .route(
            "/genres",
            get(api::taxonomy::list_genres).post(api::taxonomy::create_genre),
        )
        .route(
            "/languages",
            get(api::taxonomy::list_languages).post(api::taxonomy::create_language),
        )
        // Instances
        .route("/instances", post(api::instances::create_instance))
        .route(
            "/instances/:id",
            get(api::instances::get_instance)
                .put(api::instances::update_instance)
                .delete(api::instances::delete_instance),
        )
        .route(
            "/instances/:id/renew",
            get(api::loans::renewal_form).post(api::loans::renew_loan),
        )
        // Loans
        .route("/loans", get(api::loans::all_loans))
        .route("/loans/mine", get(api::loans::my_loans))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
