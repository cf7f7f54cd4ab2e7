//! # Message Template Rendering
//!
//! Substitutes `{placeholder}` variables in message templates with customer
//! and store data.
//!
//! ## Supported Variables
//! ```text
//! {customer_name}   customer's display name
//! {phone}           customer's phone (empty when missing)
//! {email}           customer's email (empty when missing)
//! {total_spent}     lifetime spend in display units, e.g. "1250.50"
//! {last_purchase}   last purchase date (YYYY-MM-DD) or "-"
//! {points}          loyalty points balance
//! {discount_code}   campaign code injected by the caller
//! {store_name}      configured store name
//! {date}            today's date (YYYY-MM-DD)
//! ```
//!
//! Unknown tokens pass through untouched so a typo in a template is visible
//! in the delivered message rather than silently eaten.

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::segment::PurchaseAggregate;
use crate::types::Customer;

/// Everything a template render can draw from.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub customer_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub total_spent_minor: i64,
    pub last_purchase_at: Option<DateTime<Utc>>,
    pub loyalty_points: i64,
    pub discount_code: Option<String>,
    pub store_name: String,
    pub today: Option<DateTime<Utc>>,
}

impl TemplateContext {
    /// Builds a context from a customer and their purchase aggregate.
    pub fn for_customer(customer: &Customer, aggregate: &PurchaseAggregate) -> Self {
        TemplateContext {
            customer_name: customer.name.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone(),
            total_spent_minor: aggregate.total_spent_minor,
            last_purchase_at: aggregate.last_purchase_at,
            loyalty_points: customer.loyalty_points,
            ..Default::default()
        }
    }

    pub fn with_discount_code(mut self, code: impl Into<String>) -> Self {
        self.discount_code = Some(code.into());
        self
    }

    pub fn with_store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = name.into();
        self
    }

    pub fn with_today(mut self, now: DateTime<Utc>) -> Self {
        self.today = Some(now);
        self
    }
}

/// Renders a template's content against the given context.
pub fn render_template(content: &str, ctx: &TemplateContext) -> String {
    let last_purchase = ctx
        .last_purchase_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    let date = ctx
        .today
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    content
        .replace("{customer_name}", &ctx.customer_name)
        .replace("{phone}", ctx.phone.as_deref().unwrap_or(""))
        .replace("{email}", ctx.email.as_deref().unwrap_or(""))
        .replace(
            "{total_spent}",
            &Money::from_minor(ctx.total_spent_minor).to_string(),
        )
        .replace("{last_purchase}", &last_purchase)
        .replace("{points}", &ctx.loyalty_points.to_string())
        .replace("{discount_code}", ctx.discount_code.as_deref().unwrap_or(""))
        .replace("{store_name}", &ctx.store_name)
        .replace("{date}", &date)
}

// =============================================================================
// Unit Tests
// =============================================================================
