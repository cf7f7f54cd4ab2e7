//! # Automation Rule Evaluator
//!
//! Decides whether a templated message should be dispatched for a customer
//! and a trigger event, applying per-trigger de-duplication/delay policy.
//!
//! ## Trigger Matrix
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Trigger    Fires when                         De-duplication           │
//! │  ────────   ─────────────────────────────────  ──────────────────────── │
//! │  Birthday   now's month/day == birth_date      once per calendar day    │
//! │                                                (caller invokes daily)   │
//! │  Inactive   customer segment == Risk           30-day cooldown against  │
//! │                                                the message history      │
//! │  Welcome    customer created (event)           once per event; optional │
//! │                                                delay defers the SEND    │
//! │  Thankyou   sale completed (event)             once per event; optional │
//! │                                                delay defers the SEND    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The evaluator never raises: an inactive rule, a rule without a template,
//! or a non-matching customer all produce `should_send = false`. Template
//! lookup misses are handled downstream (the dispatch is dropped and
//! logged), since messaging is non-critical convenience functionality.
//!
//! Evaluation is read-only: calling it twice with the same inputs yields
//! the same decision both times.

use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};

use crate::segment::Segment;
use crate::types::{AutomationRule, Customer, MessageHistoryEntry, Trigger};
use crate::INACTIVE_COOLDOWN_DAYS;

// =============================================================================
// Send Decision
// =============================================================================

/// The outcome of evaluating one trigger for one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendDecision {
    pub should_send: bool,

    /// Template to dispatch when `should_send` is true.
    pub template_id: Option<String>,

    /// Configured deferral for the send action (welcome/thankyou).
    /// The decision itself is made immediately.
    pub delay: Option<Duration>,
}

impl SendDecision {
    /// The "do nothing" decision.
    pub const fn skip() -> Self {
        SendDecision {
            should_send: false,
            template_id: None,
            delay: None,
        }
    }

    fn send(template_id: &str, delay: Option<Duration>) -> Self {
        SendDecision {
            should_send: true,
            template_id: Some(template_id.to_string()),
            delay,
        }
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Evaluates one trigger for one customer.
///
/// `segment` is the segmentation engine's output for this customer (see
/// [`crate::segment::classify`]); only the inactive trigger consults it.
/// `history` is the customer's outbound message log, used for the
/// inactive-trigger cooldown.
pub fn evaluate_trigger(
    trigger: Trigger,
    rule: &AutomationRule,
    customer: &Customer,
    segment: Segment,
    history: &[MessageHistoryEntry],
    now: DateTime<Utc>,
) -> SendDecision {
    // A rule for a different trigger, an inactive rule, or a rule without
    // a template never sends. Not an error.
    if rule.trigger != trigger || !rule.active {
        return SendDecision::skip();
    }
    let template_id = match rule.template_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => return SendDecision::skip(),
    };

    match trigger {
        Trigger::Birthday => {
            let birth = match customer.birth_date {
                Some(d) => d,
                None => return SendDecision::skip(),
            };
            if birth.month() == now.month() && birth.day() == now.day() {
                SendDecision::send(template_id, None)
            } else {
                SendDecision::skip()
            }
        }

        Trigger::Inactive => {
            if segment != Segment::Risk {
                return SendDecision::skip();
            }
            // Cooldown: latest send of this template to this customer
            // within the window suppresses the reminder.
            let last_sent = history
                .iter()
                .filter(|m| m.customer_id == customer.id && m.template_id == template_id)
                .map(|m| m.sent_at)
                .max();
            if let Some(sent_at) = last_sent {
                if (now - sent_at).num_days() < INACTIVE_COOLDOWN_DAYS {
                    return SendDecision::skip();
                }
            }
            SendDecision::send(template_id, None)
        }

        Trigger::Welcome | Trigger::Thankyou => {
            // Fires once per qualifying event (customer creation / sale
            // completion); the caller invokes this once per event.
            let delay = rule
                .settings
                .delay_minutes
                .filter(|&m| m > 0)
                .map(|m| Duration::from_secs(m as u64 * 60));
            SendDecision::send(template_id, delay)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
