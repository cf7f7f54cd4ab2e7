//! Settings repository.
//!
//! One record for the whole store. Reads return a clone; updates replace
//! the record wholesale (the HTTP/UI layer sends the full form back).

use tracing::info;

use kasa_core::validation::{validate_name, validate_vat_rate};
use kasa_core::{CoreError, Settings};

use crate::error::StoreResult;
use crate::store::Store;

#[derive(Clone)]
pub struct SettingsRepository {
    store: Store,
}

impl SettingsRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn get(&self) -> Settings {
        self.store.read(|db| db.settings.clone()).await
    }

    /// Replaces the settings record. The default VAT rate must be one of
    /// the configured bands and the VIP threshold non-negative.
    pub async fn update(&self, settings: Settings) -> StoreResult<Settings> {
        validate_name(&settings.store_name).map_err(CoreError::from)?;
        validate_vat_rate(settings.default_vat_rate, &settings.allowed_vat_rates())
            .map_err(CoreError::from)?;
        if settings.vip_threshold_minor < 0 {
            return Err(CoreError::from(kasa_core::ValidationError::MustBePositive {
                field: "vip_threshold_minor".to_string(),
            })
            .into());
        }

        let saved = self
            .store
            .mutate(move |db| {
                db.settings = settings;
                Ok(db.settings.clone())
            })
            .await?;

        info!(store_name = %saved.store_name, "settings updated");
        Ok(saved)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    async fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("kasa.json")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn fresh_store_serves_defaults() {
        let (_dir, store) = test_store().await;
        let repo = SettingsRepository::new(store);

        let settings = repo.get().await;
        assert_eq!(settings.allowed_vat_rates(), vec![0, 1, 10, 20]);
        assert_eq!(settings.vip_threshold_minor, 1_000_000);
    }

    #[tokio::test]
    async fn update_round_trips() {
        let (_dir, store) = test_store().await;
        let repo = SettingsRepository::new(store);

        let mut settings = repo.get().await;
        settings.store_name = "Demir Bakkal".to_string();
        settings.low_stock_threshold = 5;
        repo.update(settings).await.unwrap();

        let reloaded = repo.get().await;
        assert_eq!(reloaded.store_name, "Demir Bakkal");
        assert_eq!(reloaded.low_stock_threshold, 5);
    }

    #[tokio::test]
    async fn default_rate_outside_bands_rejected() {
        let (_dir, store) = test_store().await;
        let repo = SettingsRepository::new(store);

        let mut settings = repo.get().await;
        settings.default_vat_rate = 18;
        let err = repo.update(settings).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(_)));
    }
}
