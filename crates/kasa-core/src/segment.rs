//! # Segmentation Engine
//!
//! Classifies customers into segments from purchase-history aggregates.
//!
//! ## Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 classify(aggregate, threshold, now)                     │
//! │                                                                         │
//! │  1. never purchased              → New                                  │
//! │  2. last purchase > 30 days ago  → Risk     ← recency beats everything  │
//! │  3. spent ≥ VIP threshold        → Vip                                  │
//! │  4. purchases ≥ 3                → Regular                              │
//! │  5. otherwise                    → New                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Recency of inactivity overrides spend and frequency: a big past spender
//! who has gone quiet is flagged `Risk`, not `Vip`, because the automation
//! system's purpose is re-engagement.
//!
//! The classification is a pure function of the aggregate, the threshold
//! and the explicit `now` - it is recomputed on every read and never
//! persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::RISK_INACTIVITY_DAYS;

// =============================================================================
// Purchase Aggregate
// =============================================================================

/// Purchase-history aggregates for one customer.
///
/// Derived by scanning all sale records whose customer reference matches;
/// never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseAggregate {
    pub total_purchases: u32,
    pub total_spent_minor: i64,
    #[ts(as = "Option<String>")]
    pub last_purchase_at: Option<DateTime<Utc>>,
    /// total spent / total purchases; zero when there are no purchases.
    pub average_basket_minor: i64,
}

impl PurchaseAggregate {
    /// Builds an aggregate from (grand total, completed at) pairs.
    pub fn from_sales<I>(sales: I) -> Self
    where
        I: IntoIterator<Item = (i64, DateTime<Utc>)>,
    {
        let mut total_purchases = 0u32;
        let mut total_spent_minor = 0i64;
        let mut last_purchase_at: Option<DateTime<Utc>> = None;

        for (total, at) in sales {
            total_purchases += 1;
            total_spent_minor += total;
            if last_purchase_at.map_or(true, |prev| at > prev) {
                last_purchase_at = Some(at);
            }
        }

        let average_basket_minor = if total_purchases > 0 {
            total_spent_minor / total_purchases as i64
        } else {
            0
        };

        PurchaseAggregate {
            total_purchases,
            total_spent_minor,
            last_purchase_at,
            average_basket_minor,
        }
    }
}

// =============================================================================
// Segment
// =============================================================================

/// Customer classification used to target messaging campaigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    New,
    Regular,
    Vip,
    Risk,
}

/// Classifies a customer from their purchase aggregate.
///
/// Deterministic and total: re-running with identical inputs always yields
/// the identical segment; the only time dependency is the explicit `now`.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use kasa_core::segment::{classify, PurchaseAggregate, Segment};
///
/// let now = Utc::now();
/// let agg = PurchaseAggregate {
///     total_purchases: 4,
///     total_spent_minor: 1_200_000,
///     last_purchase_at: Some(now - Duration::days(5)),
///     average_basket_minor: 300_000,
/// };
/// // Spend threshold beats the frequency rule.
/// assert_eq!(classify(&agg, 1_000_000, now), Segment::Vip);
/// ```
pub fn classify(
    aggregate: &PurchaseAggregate,
    vip_threshold_minor: i64,
    now: DateTime<Utc>,
) -> Segment {
    let last = match aggregate.last_purchase_at {
        Some(last) => last,
        None => return Segment::New,
    };

    if (now - last).num_days() > RISK_INACTIVITY_DAYS {
        return Segment::Risk;
    }

    if aggregate.total_spent_minor >= vip_threshold_minor {
        return Segment::Vip;
    }

    if aggregate.total_purchases >= 3 {
        return Segment::Regular;
    }

    Segment::New
}

// =============================================================================
// Unit Tests
// =============================================================================
