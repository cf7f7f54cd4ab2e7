//! Sale repository.
//!
//! `commit_sale` is the one multi-collection write in the system: it
//! decrements stock, appends the sale and its items, and flushes once.
//! Everything lands in the same write-lock window, so readers never see
//! a sale without its items or stock that does not match the log.

use serde::Serialize;
use tracing::{info, warn};

use kasa_core::{CoreError, OversellPolicy, Sale, SaleItem};

use crate::error::StoreResult;
use crate::store::{not_found, Store};

/// A sale plus its line count, for history listings.
#[derive(Debug, Clone, Serialize)]
pub struct SaleSummary {
    #[serde(flatten)]
    pub sale: Sale,
    pub item_count: usize,
}

#[derive(Clone)]
pub struct SaleRepository {
    store: Store,
}

impl SaleRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Atomically records a completed sale.
    ///
    /// Under [`OversellPolicy::Reject`], every line is checked against
    /// current stock before anything mutates; the first shortage aborts
    /// the whole sale. Under [`OversellPolicy::ClampToZero`] the sale
    /// always commits and stock floors at zero.
    pub async fn commit_sale(&self, sale: Sale, items: Vec<SaleItem>) -> StoreResult<Sale> {
        let item_count = items.len();
        let committed = self
            .store
            .mutate(|db| {
                if db.settings.oversell_policy == OversellPolicy::Reject {
                    for item in &items {
                        let product = db
                            .products
                            .iter()
                            .find(|p| p.id == item.product_id)
                            .ok_or_else(|| not_found("product", &item.product_id))?;
                        if product.stock < item.quantity {
                            return Err(CoreError::InsufficientStock {
                                name: product.name.clone(),
                                available: product.stock,
                                requested: item.quantity,
                            }
                            .into());
                        }
                    }
                }

                for item in &items {
                    match db.products.iter_mut().find(|p| p.id == item.product_id) {
                        Some(product) => {
                            product.stock = (product.stock - item.quantity).max(0);
                        }
                        // Product deleted between cart build and commit;
                        // the snapshot on the item keeps the sale intact.
                        None => warn!(
                            product_id = %item.product_id,
                            "sold product no longer exists, skipping stock decrement"
                        ),
                    }
                }

                db.sales.push(sale.clone());
                db.sale_items.extend(items.iter().cloned());
                Ok(sale)
            })
            .await?;

        info!(
            id = %committed.id,
            grand_total_minor = committed.grand_total_minor,
            items = item_count,
            "sale committed"
        );
        Ok(committed)
    }

    /// Most recent sales first, with line counts.
    pub async fn recent(&self, limit: usize) -> Vec<SaleSummary> {
        self.store
            .read(|db| {
                let mut sales = db.sales.clone();
                sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                sales
                    .into_iter()
                    .take(limit)
                    .map(|sale| SaleSummary {
                        item_count: db.sale_items.iter().filter(|i| i.sale_id == sale.id).count(),
                        sale,
                    })
                    .collect()
            })
            .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Sale> {
        self.store
            .read(|db| db.sales.iter().find(|s| s.id == id).cloned())
            .await
            .ok_or_else(|| not_found("sale", id))
    }

    /// Line items of one sale.
    pub async fn items_for(&self, sale_id: &str) -> Vec<SaleItem> {
        self.store
            .read(|db| {
                db.sale_items
                    .iter()
                    .filter(|i| i.sale_id == sale_id)
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Every sale of one customer, oldest first (the order the segment
    /// aggregation consumes).
    pub async fn for_customer(&self, customer_id: &str) -> Vec<Sale> {
        self.store
            .read(|db| {
                let mut sales: Vec<Sale> = db
                    .sales
                    .iter()
                    .filter(|s| s.customer_id.as_deref() == Some(customer_id))
                    .cloned()
                    .collect();
                sales.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                sales
            })
            .await
    }

    /// Wipes the sales log and its items. Products and customers survive.
    pub async fn clear_history(&self) -> StoreResult<()> {
        let (sales, items) = self
            .store
            .mutate(|db| {
                let counts = (db.sales.len(), db.sale_items.len());
                db.sales.clear();
                db.sale_items.clear();
                Ok(counts)
            })
            .await?;
        warn!(sales, items, "sales history cleared");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
