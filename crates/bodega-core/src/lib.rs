//! # bodega-core: Pure Domain Model for Bodega
//!
//! Entities, derived values and validation rules for the inventory and sales
//! backend. Nothing in here touches a database or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bodega Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                HTTP handlers (apps/api)                         │   │
//! │  │   parse JSON ──► validate ──► uniqueness pre-check ──► respond  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bodega-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  totals   │  │ validation│  │   │
//! │  │   │  Company  │  │   Money   │  │ line cost │  │  required │  │   │
//! │  │   │  Product  │  │  TaxRate  │  │ VAT split │  │  positive │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bodega-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - The entity records and their write-side inputs
//! - [`money`] - Integer money and tax rates
//! - [`totals`] - Derived values (movement cost, document totals, cash difference)
//! - [`validation`] - Required-field, length and numeric rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bodega_core::money::Money;
//! use bodega_core::totals::line_total;
//!
//! let total = line_total("total_cost", 3.0, Money::from_minor(1000));
//! assert_eq!(total, Ok(Money::from_minor(3000)));
//! ```

pub mod error;
pub mod money;
pub mod totals;
pub mod types;
pub mod validation;

pub use error::{CoreError, ValidationError};
pub use money::{Money, TaxRate};
pub use types::*;

/// Default VAT rate in basis points (19%).
///
/// Unit sale prices are VAT-inclusive; the net/VAT split of a sales
/// document is derived with this rate unless the deployment overrides it.
pub const DEFAULT_VAT_RATE_BPS: u32 = 1900;

/// Offset added to a user's id to produce the user's code.
pub const USER_CODE_BASE: i64 = 1000;

/// Maximum length of a tax id (RUT-style `12345678-9`).
pub const MAX_TAX_ID_LEN: usize = 13;

/// Maximum length of free-text fields.
pub const MAX_TEXT_LEN: usize = 100;
