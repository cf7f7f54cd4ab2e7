//! # Kasa Store
//!
//! Persistence layer for Kasa POS: a single JSON file loaded into memory,
//! rewritten atomically on every mutation, fronted by typed repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            kasa-store                                   │
//! │                                                                         │
//! │   ProductRepository ─┐                                                  │
//! │   CustomerRepository ┤                                                  │
//! │   SaleRepository     ├──▶ Store ──▶ RwLock<Database> ──▶ kasa.json      │
//! │   CrmRepository      │              (whole document)    (temp+rename)   │
//! │   SettingsRepository ┘                                                  │
//! │                                                                         │
//! │   backups: backup-YYYYMMDD-HHMMSS.json, retention 10                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod backup;
pub mod error;
pub mod repository;
pub mod store;

pub use backup::{BackupInfo, BACKUP_RETENTION};
pub use error::{StoreError, StoreResult};
pub use repository::{
    CrmRepository, CustomerInput, CustomerRepository, ProductInput, ProductRepository,
    SaleRepository, SaleSummary, SettingsRepository, TemplateInput,
};
pub use store::{Database, Store};
