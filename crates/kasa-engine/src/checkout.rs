//! Checkout: from a scanned cart to a committed sale.
//!
//! ## Flow
//! ```text
//!   CheckoutRequest ──▶ product lookups ──▶ compute_cart_totals (pure)
//!                                            │
//!                               cash only ──▶ reconcile_cash_payment
//!                                            │
//!                                            ▼
//!                    snapshot SaleItems ──▶ SaleRepository::commit_sale
//!                                            │
//!                       registered customer ─┴─▶ thank-you automation
//! ```
//!
//! Totals are computed once here and frozen onto the sale; nothing ever
//! recomputes them from stored line items.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use kasa_core::{
    compute_cart_totals, reconcile_cash_payment, CartTotals, CoreError, LineItem, PaymentMethod,
    Sale, SaleItem,
};
use kasa_store::{ProductRepository, SaleRepository, SettingsRepository, Store};

use crate::automation::AutomationService;
use crate::error::EngineResult;

/// One cart line as the UI submits it: which product, how many.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i64,
}

/// A sale ready to be finalized.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    /// Registered customer, or `None` for a walk-in.
    pub customer_id: Option<String>,
    pub lines: Vec<CheckoutLine>,
    pub payment_method: PaymentMethod,
    /// Cash handed over; required for cash, ignored otherwise.
    pub tendered_minor: Option<i64>,
}

/// Everything the receipt needs.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub totals: CartTotals,
    /// Change due, cash sales only.
    pub change_minor: Option<i64>,
}

#[derive(Clone)]
pub struct CheckoutService {
    products: ProductRepository,
    sales: SaleRepository,
    settings: SettingsRepository,
    automation: Option<AutomationService>,
}

impl CheckoutService {
    pub fn new(store: Store) -> Self {
        Self {
            products: ProductRepository::new(store.clone()),
            sales: SaleRepository::new(store.clone()),
            settings: SettingsRepository::new(store),
            automation: None,
        }
    }

    /// Wires the thank-you automation into sale completion.
    pub fn with_automation(mut self, automation: AutomationService) -> Self {
        self.automation = Some(automation);
        self
    }

    /// Finalizes a sale: totals, payment reconciliation, atomic commit,
    /// post-sale automation. Any failure before the commit leaves the
    /// store untouched.
    pub async fn complete_sale(&self, request: CheckoutRequest) -> EngineResult<CheckoutOutcome> {
        let settings = self.settings.get().await;

        // Snapshot the products first; prices and names freeze here.
        let mut line_items = Vec::with_capacity(request.lines.len());
        let mut snapshots = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = self.products.get(&line.product_id).await?;
            line_items.push(LineItem {
                unit_price_minor: product.price_minor,
                quantity: line.quantity,
                vat_rate_percent: product.vat_rate_percent,
            });
            snapshots.push((product, line.quantity));
        }

        let totals = compute_cart_totals(&line_items, &settings.allowed_vat_rates())
            .map_err(CoreError::from)?;

        let (tendered_minor, change_minor) = match request.payment_method {
            PaymentMethod::Cash => {
                let tendered = request.tendered_minor.unwrap_or(0);
                let change = reconcile_cash_payment(totals.grand_total_minor, tendered)?;
                (Some(tendered), Some(change))
            }
            // Card and other methods charge the exact total.
            PaymentMethod::Card | PaymentMethod::Other => (None, None),
        };

        let sale_id = uuid::Uuid::new_v4().to_string();
        let sale = Sale {
            id: sale_id.clone(),
            customer_id: request.customer_id.clone(),
            subtotal_minor: totals.subtotal_minor,
            total_vat_minor: totals.total_vat_minor,
            grand_total_minor: totals.grand_total_minor,
            payment_method: request.payment_method,
            tendered_minor,
            change_minor,
            created_at: Utc::now(),
        };
        let items: Vec<SaleItem> = snapshots
            .into_iter()
            .map(|(product, quantity)| SaleItem {
                id: uuid::Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product.id,
                name_snapshot: product.name,
                unit_price_minor: product.price_minor,
                quantity,
                vat_rate_percent: product.vat_rate_percent,
            })
            .collect();

        let sale = self.sales.commit_sale(sale, items.clone()).await?;

        info!(
            sale_id = %sale.id,
            grand_total_minor = sale.grand_total_minor,
            payment = ?sale.payment_method,
            "sale completed"
        );

        // The sale is committed; a messaging hiccup (stale customer id,
        // dispatch failure) must not turn the receipt into an error.
        if let (Some(automation), Some(customer_id)) = (&self.automation, &request.customer_id) {
            if let Err(e) = automation.on_sale_completed(customer_id).await {
                warn!(sale_id = %sale.id, customer_id = %customer_id, error = %e, "post-sale automation failed");
            }
        }

        Ok(CheckoutOutcome {
            sale,
            items,
            totals,
            change_minor,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use kasa_core::{OversellPolicy, TemplateChannel, Trigger, TriggerSettings};
    use kasa_store::{
        CrmRepository, CustomerInput, CustomerRepository, ProductInput, StoreError, TemplateInput,
    };

    use crate::messaging::LogMessenger;

    async fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("kasa.json")).await.unwrap();
        (dir, store)
    }

    async fn seed_product(store: &Store, price: i64, vat: u8, stock: i64) -> kasa_core::Product {
        ProductRepository::new(store.clone())
            .insert(ProductInput {
                barcode: format!("869{:010}", price),
                name: format!("Ürün {price}"),
                price_minor: price,
                stock,
                category: None,
                vat_rate_percent: Some(vat),
            })
            .await
            .unwrap()
    }

    fn cash_request(lines: Vec<CheckoutLine>, tendered: i64) -> CheckoutRequest {
        CheckoutRequest {
            customer_id: None,
            lines,
            payment_method: PaymentMethod::Cash,
            tendered_minor: Some(tendered),
        }
    }

    #[tokio::test]
    async fn cash_sale_totals_and_change() {
        let (_dir, store) = test_store().await;
        let p1 = seed_product(&store, 10000, 20, 10).await;
        let p2 = seed_product(&store, 5000, 0, 10).await;
        let service = CheckoutService::new(store.clone());

        let outcome = service
            .complete_sale(cash_request(
                vec![
                    CheckoutLine { product_id: p1.id.clone(), quantity: 2 },
                    CheckoutLine { product_id: p2.id, quantity: 1 },
                ],
                30000,
            ))
            .await
            .unwrap();

        assert_eq!(outcome.totals.grand_total_minor, 25000);
        assert_eq!(outcome.totals.vat_breakdown[&20], 3334);
        assert_eq!(
            outcome.totals.subtotal_minor + outcome.totals.total_vat_minor,
            outcome.totals.grand_total_minor
        );
        assert_eq!(outcome.change_minor, Some(5000));
        assert_eq!(outcome.sale.tendered_minor, Some(30000));

        // Stock moved.
        let stock = ProductRepository::new(store).get(&p1.id).await.unwrap().stock;
        assert_eq!(stock, 8);
    }

    #[tokio::test]
    async fn underpayment_rejected_before_commit() {
        let (_dir, store) = test_store().await;
        let product = seed_product(&store, 10000, 20, 10).await;
        let service = CheckoutService::new(store.clone());

        let err = service
            .complete_sale(cash_request(
                vec![CheckoutLine { product_id: product.id.clone(), quantity: 1 }],
                9999,
            ))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("insufficient funds"));

        // Nothing committed, stock untouched.
        let repo = SaleRepository::new(store.clone());
        assert!(repo.recent(10).await.is_empty());
        let stock = ProductRepository::new(store).get(&product.id).await.unwrap().stock;
        assert_eq!(stock, 10);
    }

    #[tokio::test]
    async fn card_sale_skips_reconciliation() {
        let (_dir, store) = test_store().await;
        let product = seed_product(&store, 7500, 10, 5).await;
        let service = CheckoutService::new(store);

        let outcome = service
            .complete_sale(CheckoutRequest {
                customer_id: None,
                lines: vec![CheckoutLine { product_id: product.id, quantity: 1 }],
                payment_method: PaymentMethod::Card,
                tendered_minor: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.change_minor, None);
        assert_eq!(outcome.sale.tendered_minor, None);
    }

    #[tokio::test]
    async fn unknown_product_fails_cleanly() {
        let (_dir, store) = test_store().await;
        let service = CheckoutService::new(store);

        let err = service
            .complete_sale(cash_request(
                vec![CheckoutLine { product_id: "ghost".to_string(), quantity: 1 }],
                1000,
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::EngineError::Store(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn reject_policy_blocks_oversell_at_checkout() {
        let (_dir, store) = test_store().await;
        let settings_repo = SettingsRepository::new(store.clone());
        let mut settings = settings_repo.get().await;
        settings.oversell_policy = OversellPolicy::Reject;
        settings_repo.update(settings).await.unwrap();
        let product = seed_product(&store, 2000, 1, 2).await;
        let service = CheckoutService::new(store);

        let err = service
            .complete_sale(cash_request(
                vec![CheckoutLine { product_id: product.id, quantity: 3 }],
                10000,
            ))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("insufficient stock"));
    }

    #[tokio::test]
    async fn registered_sale_fires_thankyou() {
        let (_dir, store) = test_store().await;
        let product = seed_product(&store, 3000, 1, 10).await;
        let customer = CustomerRepository::new(store.clone())
            .insert(CustomerInput {
                name: "Mehmet Demir".to_string(),
                phone: Some("+905554445566".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let crm = CrmRepository::new(store.clone());
        let template = crm
            .add_template(TemplateInput {
                name: "Teşekkürler".to_string(),
                category: "Satış Sonrası".to_string(),
                channel: TemplateChannel::Whatsapp,
                content: "Teşekkürler {customer_name}!".to_string(),
                active: true,
            })
            .await
            .unwrap();
        crm.upsert_rule(Trigger::Thankyou, Some(template.id), true, TriggerSettings::default())
            .await
            .unwrap();

        let automation = AutomationService::new(store.clone(), Arc::new(LogMessenger));
        let service = CheckoutService::new(store.clone()).with_automation(automation);

        service
            .complete_sale(CheckoutRequest {
                customer_id: Some(customer.id.clone()),
                lines: vec![CheckoutLine { product_id: product.id, quantity: 1 }],
                payment_method: PaymentMethod::Cash,
                tendered_minor: Some(3000),
            })
            .await
            .unwrap();

        let log = crm.message_history(Some(&customer.id), None).await;
        assert_eq!(log.len(), 1);
        assert!(log[0].content.contains("Mehmet Demir"));
    }

    #[tokio::test]
    async fn committed_sale_survives_automation_failure() {
        let (_dir, store) = test_store().await;
        let product = seed_product(&store, 3000, 1, 10).await;

        // Active thank-you rule, but the sale references a customer that
        // no longer exists; the stale reference must not fail the receipt.
        let crm = CrmRepository::new(store.clone());
        let template = crm
            .add_template(TemplateInput {
                name: "Teşekkürler".to_string(),
                category: "Satış Sonrası".to_string(),
                channel: TemplateChannel::Whatsapp,
                content: "Teşekkürler!".to_string(),
                active: true,
            })
            .await
            .unwrap();
        crm.upsert_rule(Trigger::Thankyou, Some(template.id), true, TriggerSettings::default())
            .await
            .unwrap();

        let automation = AutomationService::new(store.clone(), Arc::new(LogMessenger));
        let service = CheckoutService::new(store.clone()).with_automation(automation);

        let outcome = service
            .complete_sale(CheckoutRequest {
                customer_id: Some("ghost".to_string()),
                lines: vec![CheckoutLine { product_id: product.id, quantity: 1 }],
                payment_method: PaymentMethod::Cash,
                tendered_minor: Some(3000),
            })
            .await
            .unwrap();

        // The sale is really there, once.
        let recent = SaleRepository::new(store).recent(10).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].sale.id, outcome.sale.id);
    }
}
