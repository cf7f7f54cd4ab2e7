//! Customer repository.
//!
//! Deleting a customer does not cascade into the sales log; their sales
//! survive as anonymous history.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use kasa_core::validation::validate_name;
use kasa_core::{CoreError, Customer};

use crate::error::StoreResult;
use crate::store::{new_id, not_found, Store};

/// Fields accepted when creating or replacing a customer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct CustomerRepository {
    store: Store,
}

impl CustomerRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// All customers, sorted by name.
    pub async fn list(&self) -> Vec<Customer> {
        self.store
            .read(|db| {
                let mut customers = db.customers.clone();
                customers.sort_by(|a, b| a.name.cmp(&b.name));
                customers
            })
            .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Customer> {
        self.store
            .read(|db| db.customers.iter().find(|c| c.id == id).cloned())
            .await
            .ok_or_else(|| not_found("customer", id))
    }

    pub async fn insert(&self, input: CustomerInput) -> StoreResult<Customer> {
        validate_name(&input.name).map_err(CoreError::from)?;

        let customer = self
            .store
            .mutate(|db| {
                let customer = Customer {
                    id: new_id(),
                    name: input.name.clone(),
                    phone: input.phone.clone(),
                    email: input.email.clone(),
                    address: input.address.clone(),
                    birth_date: input.birth_date,
                    debt_minor: 0,
                    loyalty_points: 0,
                    created_at: Utc::now(),
                };
                db.customers.push(customer.clone());
                Ok(customer)
            })
            .await?;

        info!(id = %customer.id, "customer created");
        Ok(customer)
    }

    /// Replaces contact fields; debt and points are managed separately.
    pub async fn update(&self, id: &str, input: CustomerInput) -> StoreResult<Customer> {
        validate_name(&input.name).map_err(CoreError::from)?;

        self.store
            .mutate(|db| {
                let customer = db
                    .customers
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| not_found("customer", id))?;
                customer.name = input.name.clone();
                customer.phone = input.phone.clone();
                customer.email = input.email.clone();
                customer.address = input.address.clone();
                customer.birth_date = input.birth_date;
                Ok(customer.clone())
            })
            .await
    }

    /// Deletes the customer and their CRM side records (notes, reminders).
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store
            .mutate(|db| {
                let before = db.customers.len();
                db.customers.retain(|c| c.id != id);
                if db.customers.len() == before {
                    return Err(not_found("customer", id));
                }
                db.customer_notes.retain(|n| n.customer_id != id);
                db.customer_reminders.retain(|r| r.customer_id != id);
                Ok(())
            })
            .await?;
        info!(id, "customer deleted");
        Ok(())
    }

    /// Adds `delta` (may be negative, for payments) to the store-credit
    /// balance. Returns the new balance; it may go negative (overpayment).
    pub async fn adjust_debt(&self, id: &str, delta_minor: i64) -> StoreResult<i64> {
        self.store
            .mutate(|db| {
                let customer = db
                    .customers
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| not_found("customer", id))?;
                customer.debt_minor += delta_minor;
                Ok(customer.debt_minor)
            })
            .await
    }

    /// Adds `delta` loyalty points, flooring the balance at zero.
    pub async fn adjust_points(&self, id: &str, delta: i64) -> StoreResult<i64> {
        self.store
            .mutate(|db| {
                let customer = db
                    .customers
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| not_found("customer", id))?;
                customer.loyalty_points = (customer.loyalty_points + delta).max(0);
                Ok(customer.loyalty_points)
            })
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
