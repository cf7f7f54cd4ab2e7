//! # Payment Reconciliation
//!
//! Cash change calculation for completed sales.
//!
//! ## User Workflow
//! ```text
//! Cart total: 108.30 ₺
//!      │
//!      ▼
//! Cashier keys in received amount: 150.00 ₺
//!      │
//!      ▼
//! reconcile_cash_payment(10830, 15000) ← THIS MODULE
//!      │
//!      ├── received < total → InsufficientFunds (cashier corrects, no retry)
//!      │
//!      └── OK → change = 41.70 ₺, shown on screen and receipt
//! ```
//!
//! Card and other payment methods bypass this step entirely: the full
//! grand total is charged and no change is computed.

use crate::error::{CoreError, CoreResult};

/// Computes the change due for a cash payment.
///
/// Fails with [`CoreError::InsufficientFunds`] when `received_minor` is
/// less than `grand_total_minor` - there are no partial or split payments.
/// On success, `change = received - total >= 0` exactly.
///
/// ## Example
/// ```rust
/// use kasa_core::payment::reconcile_cash_payment;
///
/// assert_eq!(reconcile_cash_payment(10830, 15000).unwrap(), 4170);
/// assert!(reconcile_cash_payment(10830, 10000).is_err());
/// ```
pub fn reconcile_cash_payment(grand_total_minor: i64, received_minor: i64) -> CoreResult<i64> {
    if received_minor < grand_total_minor {
        return Err(CoreError::InsufficientFunds {
            received_minor,
            total_minor: grand_total_minor,
        });
    }

    Ok(received_minor - grand_total_minor)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_payment_zero_change() {
        assert_eq!(reconcile_cash_payment(2500, 2500).unwrap(), 0);
    }

    #[test]
    fn test_overpayment_exact_change() {
        assert_eq!(reconcile_cash_payment(2500, 5000).unwrap(), 2500);
        assert_eq!(reconcile_cash_payment(1, 10000).unwrap(), 9999);
    }

    #[test]
    fn test_underpayment_rejected() {
        let err = reconcile_cash_payment(2500, 2499).unwrap_err();
        match err {
            CoreError::InsufficientFunds {
                received_minor,
                total_minor,
            } => {
                assert_eq!(received_minor, 2499);
                assert_eq!(total_minor, 2500);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_total_accepts_zero_received() {
        assert_eq!(reconcile_cash_payment(0, 0).unwrap(), 0);
    }
}
