//! Repository layer - typed access to each collection of the database.
//!
//! Each repository is a thin, cloneable wrapper around [`crate::Store`]
//! exposing the operations the engine needs. Construction is free; make
//! one wherever convenient.

pub mod crm;
pub mod customer;
pub mod product;
pub mod sale;
pub mod settings;

pub use crm::{CrmRepository, TemplateInput};
pub use customer::{CustomerInput, CustomerRepository};
pub use product::{ProductInput, ProductRepository};
pub use sale::{SaleRepository, SaleSummary};
pub use settings::SettingsRepository;
