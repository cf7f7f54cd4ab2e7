//! # Kasa Engine
//!
//! Application services for Kasa POS: the layer between the UI/API and
//! the pure logic in `kasa-core` plus the repositories in `kasa-store`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            kasa-engine                                  │
//! │                                                                         │
//! │   CheckoutService    totals + payment + atomic commit + thank-you       │
//! │   CrmService         aggregates, segments, customer profiles            │
//! │   AutomationService  birthday/inactive passes, welcome/thank-you        │
//! │                      events, manual & bulk sends                        │
//! │                                                                         │
//! │   Messenger trait    delivery backend seam (WhatsApp/SMTP/log/mock)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod automation;
pub mod checkout;
pub mod crm;
pub mod error;
pub mod messaging;

pub use automation::{AutomationRunReport, AutomationService, DispatchOutcome};
pub use checkout::{CheckoutLine, CheckoutOutcome, CheckoutRequest, CheckoutService};
pub use crm::{CrmService, CustomerProfile};
pub use error::{EngineError, EngineResult};
pub use messaging::{
    BulkReport, DeliveryError, LogMessenger, Messenger, OutboundMessage, BULK_PACING,
};
