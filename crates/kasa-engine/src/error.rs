//! Error type for the service layer.

use thiserror::Error;

/// Anything a service call can fail with.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Core(#[from] kasa_core::CoreError),

    /// The persistence layer failed.
    #[error(transparent)]
    Store(#[from] kasa_store::StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;
