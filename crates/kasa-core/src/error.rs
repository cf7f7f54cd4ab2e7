//! # Error Types
//!
//! Domain-specific error types for kasa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasa-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  kasa-store errors (separate crate)                                     │
//! │  └── StoreError       - Persistence failures                            │
//! │                                                                         │
//! │  kasa-engine errors (separate crate)                                    │
//! │  └── EngineError      - Wraps both for the presentation layer           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Frontend             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (barcode, amounts, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They should be caught
/// and translated to user-friendly messages by the presentation layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cash tendered is less than the amount due.
    ///
    /// ## When This Occurs
    /// - Cashier keys in an amount below the sale total
    ///
    /// Surfaced to the caller for correction; there is no retry and no
    /// partial/split payment path.
    #[error("insufficient funds: received {received_minor}, total due {total_minor}")]
    InsufficientFunds {
        received_minor: i64,
        total_minor: i64,
    },

    /// Requested quantity cannot be satisfied from stock.
    ///
    /// Only produced when the oversell policy is `Reject`; under
    /// `ClampToZero` the sale goes through and stock floors at zero.
    #[error("insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when input doesn't meet requirements and are raised before
/// any business logic runs. Malformed input is rejected, never coerced.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a barcode with letters in a numeric symbology).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// VAT rate is not in the configured rate set.
    #[error("VAT rate {rate}% is not one of the configured rates")]
    UnknownVatRate { rate: u8 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
