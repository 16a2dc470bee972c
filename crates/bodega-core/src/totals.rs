//! # Derived Values
//!
//! Every value in Bodega that is computed rather than entered lives here.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Movement line        total_cost       = quantity × unit_cost           │
//! │                       total_sale_value = quantity × unit_sale_price     │
//! │                                                                         │
//! │  Purchase invoice     total = net + VAT + other taxes                   │
//! │                                                                         │
//! │  Sales document       gross = Σ line sale values (VAT included)         │
//! │                       net   = gross / (1 + VAT)                         │
//! │                       VAT   = gross − net                               │
//! │                       total = gross + other taxes                       │
//! │                                                                         │
//! │  Cash reconciliation  difference = closing − (opening + cash sales)     │
//! │                                                                         │
//! │  User                 code = 1000 + id                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These are recomputed on every write; none of them is accepted as input.
//! A result that does not fit in the money range is refused with
//! [`ValidationError::OutOfRange`] naming the derived field.

use serde::Serialize;

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};
use crate::types::OutflowLine;
use crate::validation::ValidationResult;
use crate::USER_CODE_BASE;

fn out_of_range(field: &str, min: i64) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min,
        max: i64::MAX,
    }
}

/// `quantity × unit`, rounded to the nearest minor unit.
///
/// `field` names the derived value (`total_cost`, `total_sale_value`).
pub fn line_total(field: &str, quantity: f64, unit: Money) -> ValidationResult<Money> {
    unit.checked_times_quantity(quantity)
        .ok_or_else(|| out_of_range(field, 0))
}

/// Total of a purchase invoice from its stated components.
pub fn invoice_total(net: Money, vat: Money, other_taxes: Money) -> ValidationResult<Money> {
    net.checked_add(vat)
        .and_then(|sum| sum.checked_add(other_taxes))
        .ok_or_else(|| out_of_range("total_amount", 0))
}

/// Counted closing amount minus what the drawer should hold.
pub fn cash_difference(
    opening: Money,
    cash_sales: Money,
    closing: Money,
) -> ValidationResult<Money> {
    opening
        .checked_add(cash_sales)
        .and_then(|expected| closing.checked_sub(expected))
        .ok_or_else(|| out_of_range("cash_difference", i64::MIN))
}

/// A user's code, derived from the id the database assigned.
#[inline]
pub const fn user_code(user_id: i64) -> i64 {
    USER_CODE_BASE + user_id
}

/// Amounts of a sales document derived from its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaleTotals {
    pub net: Money,
    pub vat: Money,
    pub other_taxes: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Splits a VAT-inclusive gross amount and adds other taxes on top.
    pub fn from_gross(
        gross: Money,
        other_taxes: Money,
        vat_rate: TaxRate,
    ) -> ValidationResult<Self> {
        let (net, vat) = gross.split_included_tax(vat_rate);
        let total = gross
            .checked_add(other_taxes)
            .ok_or_else(|| out_of_range("total_amount", 0))?;
        Ok(SaleTotals {
            net,
            vat,
            other_taxes,
            total,
        })
    }

    /// Totals for a set of outflow lines. Lines without a sale price
    /// contribute nothing to the document amounts.
    pub fn from_lines(
        lines: &[OutflowLine],
        other_taxes: Money,
        vat_rate: TaxRate,
    ) -> ValidationResult<Self> {
        let mut gross = Money::zero();
        for line in lines {
            if let Some(value) = line.total_sale_value()? {
                gross = gross
                    .checked_add(value)
                    .ok_or_else(|| out_of_range("total_amount", 0))?;
            }
        }
        SaleTotals::from_gross(gross, other_taxes, vat_rate)
    }
}
