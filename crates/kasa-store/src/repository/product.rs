//! Product repository.
//!
//! Barcodes are the business key: inserts and updates refuse a barcode
//! already carried by a different product.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use kasa_core::validation::{validate_barcode, validate_name, validate_unit_price, validate_vat_rate};
use kasa_core::{CoreError, Product};

use crate::error::{StoreError, StoreResult};
use crate::store::{new_id, not_found, Store};

/// Fields accepted when creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub barcode: String,
    pub name: String,
    pub price_minor: i64,
    pub stock: i64,
    pub category: Option<String>,
    /// Omitted means "use the configured default rate".
    pub vat_rate_percent: Option<u8>,
}

#[derive(Clone)]
pub struct ProductRepository {
    store: Store,
}

impl ProductRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// All products, sorted by display name.
    pub async fn list(&self) -> Vec<Product> {
        self.store
            .read(|db| {
                let mut products = db.products.clone();
                products.sort_by(|a, b| a.name.cmp(&b.name));
                products
            })
            .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Product> {
        self.store
            .read(|db| db.products.iter().find(|p| p.id == id).cloned())
            .await
            .ok_or_else(|| not_found("product", id))
    }

    /// Barcode lookup used by the checkout scanner; a miss is not an error.
    pub async fn find_by_barcode(&self, barcode: &str) -> Option<Product> {
        self.store
            .read(|db| db.products.iter().find(|p| p.barcode == barcode).cloned())
            .await
    }

    pub async fn insert(&self, input: ProductInput) -> StoreResult<Product> {
        validate_input(&input)?;

        let product = self
            .store
            .mutate(|db| {
                let vat_rate = input
                    .vat_rate_percent
                    .unwrap_or(db.settings.default_vat_rate);
                validate_vat_rate(vat_rate, &db.settings.allowed_vat_rates())
                    .map_err(CoreError::from)?;

                if db.products.iter().any(|p| p.barcode == input.barcode) {
                    return Err(StoreError::duplicate("barcode", &input.barcode));
                }

                let product = Product {
                    id: new_id(),
                    barcode: input.barcode.clone(),
                    name: input.name.clone(),
                    price_minor: input.price_minor,
                    stock: input.stock.max(0),
                    category: input.category.clone(),
                    vat_rate_percent: vat_rate,
                    created_at: Utc::now(),
                };
                db.products.push(product.clone());
                Ok(product)
            })
            .await?;

        info!(id = %product.id, barcode = %product.barcode, "product created");
        Ok(product)
    }

    /// Replaces every editable field of an existing product.
    pub async fn update(&self, id: &str, input: ProductInput) -> StoreResult<Product> {
        validate_input(&input)?;

        self.store
            .mutate(|db| {
                let vat_rate = input
                    .vat_rate_percent
                    .unwrap_or(db.settings.default_vat_rate);
                validate_vat_rate(vat_rate, &db.settings.allowed_vat_rates())
                    .map_err(CoreError::from)?;

                if db
                    .products
                    .iter()
                    .any(|p| p.barcode == input.barcode && p.id != id)
                {
                    return Err(StoreError::duplicate("barcode", &input.barcode));
                }

                let product = db
                    .products
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| not_found("product", id))?;

                product.barcode = input.barcode.clone();
                product.name = input.name.clone();
                product.price_minor = input.price_minor;
                product.stock = input.stock.max(0);
                product.category = input.category.clone();
                product.vat_rate_percent = vat_rate;
                Ok(product.clone())
            })
            .await
    }

    /// Deletes a product. Past sale items keep their snapshots, so history
    /// is unaffected.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store
            .mutate(|db| {
                let before = db.products.len();
                db.products.retain(|p| p.id != id);
                if db.products.len() == before {
                    return Err(not_found("product", id));
                }
                Ok(())
            })
            .await?;
        info!(id, "product deleted");
        Ok(())
    }

    /// Adds `delta` (may be negative) to the stock level, flooring at zero.
    /// Returns the new level.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> StoreResult<i64> {
        self.store
            .mutate(|db| {
                let product = db
                    .products
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| not_found("product", id))?;
                product.stock = (product.stock + delta).max(0);
                Ok(product.stock)
            })
            .await
    }

    /// Products at or below the configured low-stock threshold.
    pub async fn low_stock(&self) -> Vec<Product> {
        self.store
            .read(|db| {
                let threshold = db.settings.low_stock_threshold;
                let mut products: Vec<Product> = db
                    .products
                    .iter()
                    .filter(|p| p.stock <= threshold)
                    .cloned()
                    .collect();
                products.sort_by_key(|p| p.stock);
                products
            })
            .await
    }
}

fn validate_input(input: &ProductInput) -> StoreResult<()> {
    validate_barcode(&input.barcode).map_err(CoreError::from)?;
    validate_name(&input.name).map_err(CoreError::from)?;
    validate_unit_price(input.price_minor).map_err(CoreError::from)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("kasa.json")).await.unwrap();
        (dir, store)
    }

    fn cay() -> ProductInput {
        ProductInput {
            barcode: "8690000000001".to_string(),
            name: "Çay 500g".to_string(),
            price_minor: 4500,
            stock: 20,
            category: Some("İçecek".to_string()),
            vat_rate_percent: Some(1),
        }
    }

    #[tokio::test]
    async fn insert_and_barcode_lookup() {
        let (_dir, store) = test_store().await;
        let repo = ProductRepository::new(store);

        let created = repo.insert(cay()).await.unwrap();
        assert_eq!(created.vat_rate_percent, 1);

        let found = repo.find_by_barcode("8690000000001").await.unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_barcode("0000000000000").await.is_none());
    }

    #[tokio::test]
    async fn duplicate_barcode_rejected() {
        let (_dir, store) = test_store().await;
        let repo = ProductRepository::new(store);

        repo.insert(cay()).await.unwrap();
        let err = repo.insert(cay()).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "barcode", .. }));
    }

    #[tokio::test]
    async fn missing_vat_rate_uses_default() {
        let (_dir, store) = test_store().await;
        let repo = ProductRepository::new(store);

        let mut input = cay();
        input.vat_rate_percent = None;
        let created = repo.insert(input).await.unwrap();
        assert_eq!(created.vat_rate_percent, 20);
    }

    #[tokio::test]
    async fn unknown_vat_rate_rejected() {
        let (_dir, store) = test_store().await;
        let repo = ProductRepository::new(store);

        let mut input = cay();
        input.vat_rate_percent = Some(18);
        let err = repo.insert(input).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(_)));
    }

    #[tokio::test]
    async fn adjust_stock_floors_at_zero() {
        let (_dir, store) = test_store().await;
        let repo = ProductRepository::new(store);

        let created = repo.insert(cay()).await.unwrap();
        assert_eq!(repo.adjust_stock(&created.id, -5).await.unwrap(), 15);
        assert_eq!(repo.adjust_stock(&created.id, -100).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn low_stock_respects_threshold() {
        let (_dir, store) = test_store().await;
        let repo = ProductRepository::new(store);

        let mut low = cay();
        low.stock = 3;
        repo.insert(low).await.unwrap();

        let mut high = cay();
        high.barcode = "8690000000002".to_string();
        high.stock = 50;
        repo.insert(high).await.unwrap();

        let low_stock = repo.low_stock().await;
        assert_eq!(low_stock.len(), 1);
        assert_eq!(low_stock[0].stock, 3);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_keeps_barcode_unique() {
        let (_dir, store) = test_store().await;
        let repo = ProductRepository::new(store);

        let first = repo.insert(cay()).await.unwrap();
        let mut second = cay();
        second.barcode = "8690000000002".to_string();
        let second = repo.insert(second).await.unwrap();

        // Renaming is fine.
        let mut edit = cay();
        edit.name = "Çay 1kg".to_string();
        edit.price_minor = 8000;
        let updated = repo.update(&first.id, edit).await.unwrap();
        assert_eq!(updated.name, "Çay 1kg");
        assert_eq!(updated.price_minor, 8000);

        // Stealing another product's barcode is not.
        let mut steal = cay();
        steal.barcode = second.barcode.clone();
        let err = repo.update(&first.id, steal).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }
}
