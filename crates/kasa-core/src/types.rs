//! # Domain Types
//!
//! Core domain types used throughout Kasa POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │      Sale       │   │    Customer     │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │        │
//! │  │  barcode        │   │  customer_id?   │   │  name, phone?   │        │
//! │  │  price_minor    │   │  totals + VAT   │   │  birth_date?    │        │
//! │  │  vat_rate %     │   │  payment        │   │  debt, points   │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │ MessageTemplate │   │ AutomationRule  │   │ MessageHistory  │        │
//! │  │  content + vars │   │  trigger → tpl  │   │  append-only log│        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All monetary fields are integer minor units (see [`crate::money`]);
//! product prices are gross (tax-inclusive).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Barcode (EAN-13, UPC-A, etc.) - business identifier, unique.
    pub barcode: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Gross price in minor units (tax-inclusive).
    pub price_minor: i64,

    /// Current stock level. Never goes below zero.
    pub stock: i64,

    /// Optional category label.
    pub category: Option<String>,

    /// VAT rate in whole percent; must be one of the configured rates.
    pub vat_rate_percent: u8,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the gross price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price_minor)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record.
///
/// Purchase aggregates (total spent, last purchase, ...) are NOT stored
/// here; they are recomputed on demand from the sales log. Sales reference
/// customers by id and are not cascaded on delete - an orphaned reference
/// is simply a lookup miss.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,

    /// Used by the birthday automation trigger (month/day match).
    #[ts(as = "Option<String>")]
    pub birth_date: Option<NaiveDate>,

    /// Outstanding store credit ("veresiye") in minor units.
    /// Pure storage - no interest or due-date rules exist.
    pub debt_minor: i64,

    /// Loyalty points balance. Pure storage.
    pub loyalty_points: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// Only `Cash` goes through change reconciliation; card and other methods
/// charge the full total and skip it entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment (change is computed).
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Anything else (meal voucher, store credit, ...).
    Other,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale transaction.
///
/// Totals are frozen at commit time: `grand_total_minor` is the exact sum
/// of the gross line amounts, never re-derived from the net/VAT breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,

    /// Customer reference; `None` for anonymous walk-in sales.
    pub customer_id: Option<String>,

    /// Net (pre-VAT) total in minor units.
    pub subtotal_minor: i64,

    /// Total VAT across all rates in minor units.
    pub total_vat_minor: i64,

    /// The amount actually charged, in minor units.
    pub grand_total_minor: i64,

    pub payment_method: PaymentMethod,

    /// For cash: amount the customer handed over.
    pub tendered_minor: Option<i64>,

    /// For cash: change returned to the customer.
    pub change_minor: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Gross unit price in minor units at time of sale (frozen).
    pub unit_price_minor: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// VAT rate at time of sale (frozen).
    pub vat_rate_percent: u8,
}

impl SaleItem {
    /// Gross line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.unit_price_minor).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Messaging
// =============================================================================

/// Outbound channel for a single dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Whatsapp,
    Email,
}

/// Channel preference configured on a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TemplateChannel {
    Whatsapp,
    Email,
    /// Send via WhatsApp AND email, each when the customer has the contact.
    Both,
}

impl TemplateChannel {
    /// Whether this preference includes the given concrete channel.
    pub fn includes(&self, channel: Channel) -> bool {
        matches!(
            (self, channel),
            (TemplateChannel::Whatsapp, Channel::Whatsapp)
                | (TemplateChannel::Email, Channel::Email)
                | (TemplateChannel::Both, _)
        )
    }
}

/// Delivery outcome recorded in the message history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    Failed,
}

/// A reusable message template with `{placeholder}` variables.
///
/// See [`crate::template`] for the variable set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MessageTemplate {
    pub id: String,
    pub name: String,
    /// Free-form grouping label shown in the template picker.
    pub category: String,
    pub channel: TemplateChannel,
    pub content: String,
    pub active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One entry in the append-only outbound message log.
///
/// The automation evaluator reads this log to enforce de-duplication
/// windows (e.g. "don't nag the same at-risk customer twice a month").
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MessageHistoryEntry {
    pub id: String,
    pub customer_id: String,
    pub template_id: String,
    pub channel: Channel,
    pub content: String,
    pub status: MessageStatus,
    #[ts(as = "String")]
    pub sent_at: DateTime<Utc>,
}

// =============================================================================
// Automation
// =============================================================================

/// Automation trigger kinds. One logical rule exists per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Fires on the customer's birthday (month/day match).
    Birthday,
    /// Fires for customers classified `Risk` (re-engagement).
    Inactive,
    /// Fires once when a customer is created.
    Welcome,
    /// Fires once when a sale completes.
    Thankyou,
}

/// Per-rule timing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TriggerSettings {
    /// Minutes to defer the actual send (welcome/thankyou only).
    /// Defers only the send action, never the decision.
    pub delay_minutes: Option<u32>,

    /// Preferred dispatch time, "HH:MM" (birthday only; honored by the
    /// external scheduler, not by the evaluator).
    pub time_of_day: Option<String>,
}

/// A configured trigger → message-template binding.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AutomationRule {
    pub id: String,
    pub trigger: Trigger,
    /// Template to dispatch; a rule without one never sends.
    pub template_id: Option<String>,
    pub active: bool,
    pub settings: TriggerSettings,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CRM Side Tables
// =============================================================================

/// Free-form note attached to a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerNote {
    pub id: String,
    pub customer_id: String,
    pub note: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A dated to-do attached to a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerReminder {
    pub id: String,
    pub customer_id: String,
    pub title: String,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub completed: bool,
}

// =============================================================================
// Settings
// =============================================================================

/// Oversell handling when a sale requests more than available stock.
///
/// The original system clamped silently; whether that is a feature
/// (backorders) or a bug is a policy question, so it is configurable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OversellPolicy {
    /// Commit the sale; stock floors at zero.
    ClampToZero,
    /// Reject the sale before any mutation.
    Reject,
}

impl Default for OversellPolicy {
    fn default() -> Self {
        OversellPolicy::ClampToZero
    }
}

/// One named VAT band (label + percent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatBand {
    pub label: String,
    pub percent: u8,
}

/// Store-wide configuration, persisted as a single record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct Settings {
    pub store_name: String,
    pub receipt_footer: String,
    pub low_stock_threshold: i64,
    pub currency: String,
    pub currency_symbol: String,

    /// The four configurable VAT bands. Line items must carry one of
    /// these percents.
    pub vat_bands: Vec<VatBand>,

    /// Percent applied to new products when none is chosen.
    pub default_vat_rate: u8,

    /// Spend threshold for the VIP segment, in minor units.
    pub vip_threshold_minor: i64,

    pub oversell_policy: OversellPolicy,

    /// Discount code substituted into birthday messages.
    pub birthday_discount_code: String,

    /// Discount code substituted into win-back (inactive) messages.
    pub winback_discount_code: String,
}

impl Settings {
    /// The set of VAT percents line items are allowed to carry.
    pub fn allowed_vat_rates(&self) -> Vec<u8> {
        self.vat_bands.iter().map(|b| b.percent).collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            store_name: "Kasa POS".to_string(),
            receipt_footer: "Bizi tercih ettiğiniz için teşekkürler!".to_string(),
            low_stock_threshold: 10,
            currency: "TRY".to_string(),
            currency_symbol: "₺".to_string(),
            vat_bands: vec![
                VatBand { label: "İstisna".to_string(), percent: 0 },
                VatBand { label: "Temel Gıda".to_string(), percent: 1 },
                VatBand { label: "İndirimli".to_string(), percent: 10 },
                VatBand { label: "Genel".to_string(), percent: 20 },
            ],
            default_vat_rate: 20,
            // 10,000 display units.
            vip_threshold_minor: crate::DEFAULT_VIP_THRESHOLD_MINOR,
            oversell_policy: OversellPolicy::default(),
            birthday_discount_code: "DOGUMGUNU20".to_string(),
            winback_discount_code: "GELDINIZ15".to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_vat_bands() {
        let settings = Settings::default();
        assert_eq!(settings.allowed_vat_rates(), vec![0, 1, 10, 20]);
        assert_eq!(settings.default_vat_rate, 20);
        assert_eq!(settings.vip_threshold_minor, 1_000_000);
    }

    #[test]
    fn test_oversell_policy_defaults_to_clamp() {
        assert_eq!(OversellPolicy::default(), OversellPolicy::ClampToZero);
    }

    #[test]
    fn test_template_channel_includes() {
        assert!(TemplateChannel::Both.includes(Channel::Whatsapp));
        assert!(TemplateChannel::Both.includes(Channel::Email));
        assert!(TemplateChannel::Whatsapp.includes(Channel::Whatsapp));
        assert!(!TemplateChannel::Whatsapp.includes(Channel::Email));
        assert!(!TemplateChannel::Email.includes(Channel::Whatsapp));
    }

    #[test]
    fn test_sale_item_line_total() {
        let item = SaleItem {
            id: "i1".to_string(),
            sale_id: "s1".to_string(),
            product_id: "p1".to_string(),
            name_snapshot: "Çay 500g".to_string(),
            unit_price_minor: 2500,
            quantity: 3,
            vat_rate_percent: 1,
        };
        assert_eq!(item.line_total().minor(), 7500);
    }

    #[test]
    fn test_settings_survive_partial_json() {
        // Older database files may miss newer fields; serde(default) fills
        // them in, mirroring the original's merge-on-load.
        let settings: Settings = serde_json::from_str(r#"{"store_name":"Market"}"#).unwrap();
        assert_eq!(settings.store_name, "Market");
        assert_eq!(settings.vat_bands.len(), 4);
        assert_eq!(settings.oversell_policy, OversellPolicy::ClampToZero);
    }
}
