//! # kasa-core: Pure Business Logic for Kasa POS
//!
//! This crate is the **heart** of Kasa POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasa POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    Frontend (desktop UI)                        │    │
//! │  │    Barcode scan ──► Cart ──► Payment ──► Receipt / CRM views    │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │ IPC                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    kasa-engine (services)                       │    │
//! │  │    checkout, CRM aggregates, automation runner, bulk messaging  │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ kasa-core (THIS CRATE) ★                        │    │
//! │  │                                                                 │    │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐   │    │
//! │  │   │  money   │ │   cart   │ │ segment  │ │   automation     │   │    │
//! │  │   │  Money   │ │ VAT calc │ │ classify │ │ evaluate_trigger │   │    │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘   │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    kasa-store (persistence)                     │    │
//! │  │              JSON database file, repositories, backups          │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, templates, rules)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart totals with multi-rate VAT breakdown
//! - [`payment`] - Cash payment reconciliation
//! - [`segment`] - Customer segmentation engine
//! - [`automation`] - Automation trigger evaluation
//! - [`template`] - Message template rendering
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input,
//!    same output; time enters only through explicit `now` parameters
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are minor units (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod automation;
pub mod cart;
pub mod error;
pub mod money;
pub mod payment;
pub mod segment;
pub mod template;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use automation::{evaluate_trigger, SendDecision};
pub use cart::{compute_cart_totals, CartTotals, LineItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use payment::reconcile_cash_payment;
pub use segment::{classify, PurchaseAggregate, Segment};
pub use template::{render_template, TemplateContext};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Days without a purchase before a customer is classified `Risk`.
pub const RISK_INACTIVITY_DAYS: i64 = 30;

/// Minimum days between two inactive-trigger reminders to the same
/// customer (the de-duplication window).
pub const INACTIVE_COOLDOWN_DAYS: i64 = 30;

/// Default VIP spend threshold in minor units (10,000 display units).
pub const DEFAULT_VIP_THRESHOLD_MINOR: i64 = 1_000_000;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
