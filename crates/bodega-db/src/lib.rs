//! # bodega-db: Database Layer for Bodega
//!
//! SQLite storage for the Bodega backend, accessed asynchronously through
//! sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Bodega Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales-documents)                               │
//! │       │  validated input, resolved lines                                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    bodega-db (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐   │    │
//! │  │   │   Database    │    │    Repositories    │  │ Migrations │   │    │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │   │    │
//! │  │   │               │    │ Company  User      │  │            │   │    │
//! │  │   │ SqlitePool    │◄───│ Supplier Category  │  │ 001_init   │   │    │
//! │  │   │ WAL, FKs on   │    │ Product  Invoice   │  │            │   │    │
//! │  │   │               │    │ Inflow   Document  │  │            │   │    │
//! │  │   │               │    │ Outflow  CashRec   │  │            │   │    │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     SQLite database file                        │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per entity
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bodega_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./bodega.db")).await?;
//!
//! let products = db.products().list().await?;
//! let (invoice, inflows) = db.purchase_invoices().insert(&new_invoice, &lines).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::cash_reconciliation::CashReconciliationRepository;
pub use repository::category::CategoryRepository;
pub use repository::company::CompanyRepository;
pub use repository::inflow::InflowRepository;
pub use repository::outflow::OutflowRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase_invoice::PurchaseInvoiceRepository;
pub use repository::sales_document::SalesDocumentRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
