//! # Cart Totals
//!
//! The cart/sale total computation with multi-rate VAT breakdown.
//!
//! ## Computation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    compute_cart_totals                                  │
//! │                                                                         │
//! │  LineItem { gross unit price, qty, rate }                               │
//! │       │                                                                 │
//! │       ▼ per unit                                                        │
//! │  net  = gross / (1 + rate/100)   (half-up, see Money::net_of_vat)       │
//! │  vat  = gross - net              (exact remainder)                      │
//! │       │                                                                 │
//! │       ▼ per line (× quantity)                                           │
//! │  subtotal        += net  × qty                                          │
//! │  breakdown[rate] += vat  × qty                                          │
//! │  grand_total     += gross × qty   ← accumulated from INPUT, not         │
//! │                                      from net+vat, so the charged       │
//! │                                      total never drifts with rounding   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The net/VAT breakdown is informational (receipt footer, tax report);
//! the charged total is always the exact sum of gross line amounts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_quantity, validate_unit_price, validate_vat_rate};

// =============================================================================
// Line Item
// =============================================================================

/// One line of a cart: a gross unit price, a quantity and a VAT rate.
///
/// ## Invariants
/// - `quantity >= 1`
/// - `unit_price_minor >= 0`
/// - `vat_rate_percent` is a member of the configured rate set
///
/// Violations are rejected by [`compute_cart_totals`] before any
/// accumulation; malformed input is never silently coerced.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Gross (tax-inclusive) unit price in minor units.
    pub unit_price_minor: i64,
    pub quantity: i64,
    pub vat_rate_percent: u8,
}

// =============================================================================
// Cart Totals
// =============================================================================

/// The computed totals for a cart.
///
/// ## Invariants
/// - `grand_total_minor == Σ unit_price_minor × quantity` exactly
/// - `subtotal_minor + total_vat_minor == grand_total_minor`
/// - `Σ vat_breakdown values == total_vat_minor`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    /// Net (pre-VAT) total in minor units.
    pub subtotal_minor: i64,

    /// Accumulated VAT per rate percent, in minor units.
    /// BTreeMap keeps the receipt breakdown ordered by rate.
    pub vat_breakdown: BTreeMap<u8, i64>,

    /// Sum of all breakdown values.
    pub total_vat_minor: i64,

    /// The amount to charge: exact gross sum of the input lines.
    pub grand_total_minor: i64,
}

/// Computes subtotal, per-rate VAT breakdown and grand total for a cart.
///
/// Never fails on well-formed input; an empty slice yields all-zero totals.
/// Each line is validated against `allowed_rates` (the configured VAT set)
/// before anything is accumulated.
///
/// ## Example
/// ```rust
/// use kasa_core::cart::{compute_cart_totals, LineItem};
///
/// let items = [
///     LineItem { unit_price_minor: 10000, quantity: 2, vat_rate_percent: 20 },
///     LineItem { unit_price_minor: 5000, quantity: 1, vat_rate_percent: 0 },
/// ];
/// let totals = compute_cart_totals(&items, &[0, 1, 10, 20]).unwrap();
///
/// assert_eq!(totals.grand_total_minor, 25000);
/// assert_eq!(totals.vat_breakdown[&20], 3334); // 1667 per unit × 2
/// assert_eq!(totals.vat_breakdown[&0], 0);
/// ```
pub fn compute_cart_totals(
    items: &[LineItem],
    allowed_rates: &[u8],
) -> Result<CartTotals, ValidationError> {
    // Validate everything up front so a bad line leaves no partial totals.
    for item in items {
        validate_unit_price(item.unit_price_minor)?;
        validate_quantity(item.quantity)?;
        validate_vat_rate(item.vat_rate_percent, allowed_rates)?;
    }

    let mut totals = CartTotals::default();

    for item in items {
        let gross_unit = Money::from_minor(item.unit_price_minor);
        let net_unit = gross_unit.net_of_vat(item.vat_rate_percent);
        let vat_unit = gross_unit - net_unit;

        totals.subtotal_minor += net_unit.multiply_quantity(item.quantity).minor();
        *totals.vat_breakdown.entry(item.vat_rate_percent).or_insert(0) +=
            vat_unit.multiply_quantity(item.quantity).minor();
        // Gross accumulates straight from the input.
        totals.grand_total_minor += gross_unit.multiply_quantity(item.quantity).minor();
    }

    totals.total_vat_minor = totals.vat_breakdown.values().sum();

    Ok(totals)
}

// =============================================================================
// Unit Tests
// =============================================================================
