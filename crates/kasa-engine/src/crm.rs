//! Customer intelligence: purchase aggregates and segment classification.
//!
//! Nothing here is stored; aggregates and segments are recomputed from the
//! sales log on every call, so they can never drift from the data.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use kasa_core::{classify, Customer, PurchaseAggregate, Segment};
use kasa_store::{CustomerRepository, SaleRepository, SettingsRepository, Store};

use crate::error::EngineResult;

/// A customer joined with their recomputed aggregate and segment.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerProfile {
    #[serde(flatten)]
    pub customer: Customer,
    pub total_purchases: u32,
    pub total_spent_minor: i64,
    pub average_basket_minor: i64,
    pub segment: Segment,
}

#[derive(Clone)]
pub struct CrmService {
    customers: CustomerRepository,
    sales: SaleRepository,
    settings: SettingsRepository,
}

impl CrmService {
    pub fn new(store: Store) -> Self {
        Self {
            customers: CustomerRepository::new(store.clone()),
            sales: SaleRepository::new(store.clone()),
            settings: SettingsRepository::new(store),
        }
    }

    /// Recomputes one customer's purchase aggregate from the sales log.
    pub async fn aggregate_for(&self, customer_id: &str) -> PurchaseAggregate {
        let sales = self.sales.for_customer(customer_id).await;
        PurchaseAggregate::from_sales(
            sales
                .iter()
                .map(|s| (s.grand_total_minor, s.created_at)),
        )
    }

    /// One customer's profile: record + aggregate + segment.
    pub async fn profile(&self, customer_id: &str) -> EngineResult<CustomerProfile> {
        let customer = self.customers.get(customer_id).await?;
        let settings = self.settings.get().await;
        Ok(self
            .build_profile(customer, settings.vip_threshold_minor)
            .await)
    }

    /// Profiles for every customer, classification as of now.
    pub async fn profiles(&self) -> EngineResult<Vec<CustomerProfile>> {
        let settings = self.settings.get().await;
        let customers = self.customers.list().await;
        let mut profiles = Vec::with_capacity(customers.len());
        for customer in customers {
            profiles.push(
                self.build_profile(customer, settings.vip_threshold_minor)
                    .await,
            );
        }
        debug!(count = profiles.len(), "customer profiles built");
        Ok(profiles)
    }

    /// How many customers fall in each segment (dashboard widget).
    pub async fn segment_counts(&self) -> EngineResult<HashMap<Segment, usize>> {
        let mut counts = HashMap::new();
        for profile in self.profiles().await? {
            *counts.entry(profile.segment).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn build_profile(&self, customer: Customer, vip_threshold: i64) -> CustomerProfile {
        let aggregate = self.aggregate_for(&customer.id).await;
        let segment = classify(&aggregate, vip_threshold, Utc::now());
        CustomerProfile {
            customer,
            total_purchases: aggregate.total_purchases,
            total_spent_minor: aggregate.total_spent_minor,
            average_basket_minor: aggregate.average_basket_minor,
            segment,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
