//! # Domain Types
//!
//! The records stored by Bodega and the inputs used to create them.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Company 1──* User 1──* InventoryInflow *──1 PurchaseInvoice *──1 Supplier
//! │                 │  1──* InventoryOutflow *──1 SalesDocument            │
//! │                 │                │                                      │
//! │                 │                └──*──1 Product *──1 Category          │
//! │                 │                                                       │
//! │                 ├── operator      ──* CashReconciliation               │
//! │                 └── administrator ──* CashReconciliation               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record has an integer `id` assigned by the database on insert. The
//! `New*` / `*Line` types carry only the writable fields; derived fields
//! (`total_cost`, `total_amount`, `cash_difference`, user `code`) are never
//! part of an input and are computed by [`crate::totals`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::totals;
use crate::validation::ValidationResult;

// =============================================================================
// Company
// =============================================================================

/// A business that owns users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Company {
    pub id: i64,
    pub name: String,
    /// Tax identifier, unique across companies.
    pub tax_id: String,
    /// Registered legal name, unique across companies.
    pub legal_name: String,
    pub industry: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCompany {
    pub name: String,
    pub tax_id: String,
    pub legal_name: String,
    pub industry: String,
}

// =============================================================================
// User
// =============================================================================

/// A person who operates the system on behalf of a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub surname: String,
    /// Generated from `id` right after the first insert, so briefly `None`
    /// inside the creating transaction.
    pub code: Option<i64>,
    pub tax_id: String,
    /// Free-text role, e.g. "Admin" or "Cashier".
    pub role: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub active: bool,
    #[ts(as = "String")]
    pub registered_at: DateTime<Utc>,
    /// Reference to a stored profile photo.
    pub photo: Option<String>,
    pub company_id: i64,
}

impl User {
    /// The code this user gets once its id is known.
    pub fn expected_code(&self) -> i64 {
        totals::user_code(self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub tax_id: String,
    pub role: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub photo: Option<String>,
    pub company_id: i64,
}

// =============================================================================
// Supplier
// =============================================================================

/// A vendor that issues purchase invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub tax_id: String,
    pub legal_name: String,
    pub industry: String,
    pub address: String,
    pub bank_account: Option<String>,
    pub bank_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSupplier {
    pub name: String,
    pub tax_id: String,
    pub legal_name: String,
    pub industry: String,
    pub address: String,
    pub bank_account: Option<String>,
    pub bank_name: Option<String>,
}

// =============================================================================
// Category & Product
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A stocked item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,
    /// Stock Keeping Unit, unique.
    pub sku: String,
    pub description: String,
    /// Barcode (EAN-13, UPC-A, ...), unique.
    pub barcode: String,
    /// Unit the product is delivered and counted in ("unit", "kg", "box").
    pub delivery_unit: String,
    /// VAT-inclusive sale price.
    pub unit_sale_price: Option<Money>,
    /// Contribution margin in percent.
    pub contribution_margin: Option<f64>,
    pub category_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub sku: String,
    pub description: String,
    pub barcode: String,
    pub delivery_unit: String,
    pub unit_sale_price: Option<Money>,
    pub contribution_margin: Option<f64>,
    pub category_id: i64,
}

// =============================================================================
// Purchase Invoice & Inventory Inflow
// =============================================================================

/// An invoice received from a supplier.
///
/// Net, VAT and other taxes are stated by the supplier; `total_amount` is
/// always their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseInvoice {
    pub id: i64,
    /// Supplier-assigned invoice number.
    pub folio: i64,
    #[ts(as = "String")]
    pub issued_at: NaiveDateTime,
    #[ts(as = "String")]
    pub received_at: NaiveDateTime,
    pub net_amount: Money,
    pub vat_amount: Money,
    pub other_taxes_amount: Money,
    pub total_amount: Money,
    pub supplier_id: i64,
}

impl PurchaseInvoice {
    pub fn recompute_total(&mut self) -> ValidationResult<()> {
        self.total_amount =
            totals::invoice_total(self.net_amount, self.vat_amount, self.other_taxes_amount)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchaseInvoice {
    pub folio: i64,
    pub issued_at: NaiveDateTime,
    pub received_at: NaiveDateTime,
    pub net_amount: Money,
    pub vat_amount: Money,
    pub other_taxes_amount: Money,
    pub supplier_id: i64,
}

impl NewPurchaseInvoice {
    pub fn total_amount(&self) -> ValidationResult<Money> {
        totals::invoice_total(self.net_amount, self.vat_amount, self.other_taxes_amount)
    }
}

/// Stock received against a purchase invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryInflow {
    pub id: i64,
    pub quantity: f64,
    pub unit_cost: Money,
    /// Always `quantity × unit_cost`.
    pub total_cost: Money,
    #[ts(as = "String")]
    pub registered_at: DateTime<Utc>,
    /// User who recorded the movement.
    pub user_id: i64,
    pub purchase_invoice_id: i64,
    pub product_id: i64,
}

impl InventoryInflow {
    pub fn recompute_total_cost(&mut self) -> ValidationResult<()> {
        self.total_cost = totals::line_total("total_cost", self.quantity, self.unit_cost)?;
        Ok(())
    }
}

/// One inflow row of a purchase invoice submission.
#[derive(Debug, Clone, PartialEq)]
pub struct InflowLine {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: f64,
    pub unit_cost: Money,
}

impl InflowLine {
    pub fn total_cost(&self) -> ValidationResult<Money> {
        totals::line_total("total_cost", self.quantity, self.unit_cost)
    }
}

// =============================================================================
// Sales Document & Inventory Outflow
// =============================================================================

/// How a sale was paid. Mirrors the channels counted at cash reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] =
        [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Transfer];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }

    /// Parses a method name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A receipt or invoice issued to a customer.
///
/// Amounts are derived from the document's outflows: see
/// [`totals::SaleTotals`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesDocument {
    pub id: i64,
    /// e.g. "receipt" or "invoice".
    pub document_type: String,
    pub document_number: i64,
    #[ts(as = "String")]
    pub issued_at: NaiveDateTime,
    pub net_amount: Money,
    pub vat_amount: Money,
    pub other_taxes_amount: Money,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
}

impl SalesDocument {
    pub fn apply_totals(&mut self, totals: &totals::SaleTotals) {
        self.net_amount = totals.net;
        self.vat_amount = totals.vat;
        self.other_taxes_amount = totals.other_taxes;
        self.total_amount = totals.total;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSalesDocument {
    pub document_type: String,
    pub document_number: i64,
    pub issued_at: NaiveDateTime,
    pub other_taxes_amount: Money,
    pub payment_method: PaymentMethod,
}

/// Stock leaving inventory through a sales document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryOutflow {
    pub id: i64,
    pub quantity: f64,
    pub unit_cost: Money,
    /// Always `quantity × unit_cost`.
    pub total_cost: Money,
    /// VAT-inclusive sale price per unit.
    pub unit_sale_price: Option<Money>,
    /// Always `quantity × unit_sale_price` when a sale price is set.
    pub total_sale_value: Option<Money>,
    #[ts(as = "String")]
    pub registered_at: DateTime<Utc>,
    pub user_id: i64,
    pub product_id: i64,
    pub sales_document_id: i64,
}

impl InventoryOutflow {
    pub fn recompute_totals(&mut self) -> ValidationResult<()> {
        self.total_cost = totals::line_total("total_cost", self.quantity, self.unit_cost)?;
        self.total_sale_value = self
            .unit_sale_price
            .map(|price| totals::line_total("total_sale_value", self.quantity, price))
            .transpose()?;
        Ok(())
    }
}

/// One outflow row of a sales document submission.
#[derive(Debug, Clone, PartialEq)]
pub struct OutflowLine {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: f64,
    pub unit_cost: Money,
    pub unit_sale_price: Option<Money>,
}

impl OutflowLine {
    pub fn total_cost(&self) -> ValidationResult<Money> {
        totals::line_total("total_cost", self.quantity, self.unit_cost)
    }

    pub fn total_sale_value(&self) -> ValidationResult<Option<Money>> {
        self.unit_sale_price
            .map(|price| totals::line_total("total_sale_value", self.quantity, price))
            .transpose()
    }
}

// =============================================================================
// Cash Reconciliation
// =============================================================================

/// End-of-shift register count.
///
/// Two separate relations to [`User`]: the `operator` who ran the register
/// and the `administrator` who signed off the count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashReconciliation {
    pub id: i64,
    pub operator_id: i64,
    pub administrator_id: i64,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
    pub opening_amount: Money,
    pub transfer_amount: Money,
    pub cash_amount: Money,
    pub card_amount: Money,
    pub closing_amount: Money,
    /// Counted drawer minus expected drawer.
    pub cash_difference: Money,
}

impl CashReconciliation {
    pub fn recompute_difference(&mut self) -> ValidationResult<()> {
        self.cash_difference =
            totals::cash_difference(self.opening_amount, self.cash_amount, self.closing_amount)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCashReconciliation {
    pub operator_id: i64,
    pub administrator_id: i64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub opening_amount: Money,
    pub transfer_amount: Money,
    pub cash_amount: Money,
    pub card_amount: Money,
    pub closing_amount: Money,
}

impl NewCashReconciliation {
    pub fn cash_difference(&self) -> ValidationResult<Money> {
        totals::cash_difference(self.opening_amount, self.cash_amount, self.closing_amount)
    }
}
