//! # Bodega API
//!
//! HTTP server for the Bodega inventory and sales backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            API Routes                                   │
//! │                                                                         │
//! │  GET /health                                                            │
//! │                                                                         │
//! │  /api  (authenticate middleware → ActingUser)                           │
//! │  ┌────────────────────┐  ┌────────────────────┐  ┌───────────────────┐  │
//! │  │  Master data       │  │  Purchasing        │  │  Sales            │  │
//! │  │                    │  │                    │  │                   │  │
//! │  │ • companies        │  │ • purchase-invoices│  │ • sales-documents │  │
//! │  │ • users            │  │ • inventory-inflows│  │ • inventory-      │  │
//! │  │ • suppliers        │  │                    │  │   outflows        │  │
//! │  │ • categories       │  │                    │  │ • cash-           │  │
//! │  │ • products         │  │                    │  │   reconciliations │  │
//! │  └────────────────────┘  └────────────────────┘  └───────────────────┘  │
//! │                                                                         │
//! │  collection: GET list, POST create (201)                                │
//! │  item:       GET, PUT partial update, DELETE                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. The most used variables:
//! - `BODEGA_PORT` - HTTP port (default: 8080)
//! - `BODEGA_DATABASE_PATH` - SQLite file (default: bodega.db)
//! - `BODEGA_VAT_RATE_BPS` - VAT in basis points (default: 1900)
//! - `BODEGA_AUTH__REQUIRED` / `BODEGA_AUTH__JWT_SECRET` - bearer tokens

use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Router};
use bodega_core::TaxRate;
use bodega_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

// Re-exports
pub use auth::JwtManager;
pub use config::ApiConfig;
pub use error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(
            config.auth.jwt_secret.clone(),
            config.auth.access_lifetime_secs,
        );
        AppState {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
        }
    }

    /// VAT included in sale prices.
    pub fn vat_rate(&self) -> TaxRate {
        self.config.vat_rate()
    }
}

/// Builds the full router: `/health` plus every `/api` resource.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(handlers::companies::routes())
        .merge(handlers::users::routes())
        .merge(handlers::suppliers::routes())
        .merge(handlers::categories::routes())
        .merge(handlers::products::routes())
        .merge(handlers::purchase_invoices::routes())
        .merge(handlers::inventory_inflows::routes())
        .merge(handlers::sales_documents::routes())
        .merge(handlers::inventory_outflows::routes())
        .merge(handlers::cash_reconciliations::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
