//! CRM repository: notes, reminders, message templates, the outbound
//! message log, and automation rules.
//!
//! The message log is append-only; nothing in the system edits or deletes
//! entries, and the automation evaluator relies on that to enforce its
//! de-duplication windows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use kasa_core::validation::validate_name;
use kasa_core::{
    AutomationRule, Channel, CoreError, CustomerNote, CustomerReminder, MessageHistoryEntry,
    MessageStatus, MessageTemplate, TemplateChannel, Trigger, TriggerSettings,
};

use crate::error::StoreResult;
use crate::store::{new_id, not_found, Store};

/// Fields accepted when creating or replacing a template.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
    pub name: String,
    pub category: String,
    pub channel: TemplateChannel,
    pub content: String,
    pub active: bool,
}

#[derive(Clone)]
pub struct CrmRepository {
    store: Store,
}

impl CrmRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    // =========================================================================
    // Notes
    // =========================================================================

    /// Notes for one customer, newest first.
    pub async fn notes_for(&self, customer_id: &str) -> Vec<CustomerNote> {
        self.store
            .read(|db| {
                let mut notes: Vec<CustomerNote> = db
                    .customer_notes
                    .iter()
                    .filter(|n| n.customer_id == customer_id)
                    .cloned()
                    .collect();
                notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                notes
            })
            .await
    }

    pub async fn add_note(&self, customer_id: &str, note: &str) -> StoreResult<CustomerNote> {
        let customer_id = customer_id.to_string();
        let note = note.to_string();
        self.store
            .mutate(move |db| {
                if !db.customers.iter().any(|c| c.id == customer_id) {
                    return Err(not_found("customer", &customer_id));
                }
                let record = CustomerNote {
                    id: new_id(),
                    customer_id,
                    note,
                    created_at: Utc::now(),
                };
                db.customer_notes.push(record.clone());
                Ok(record)
            })
            .await
    }

    pub async fn delete_note(&self, id: &str) -> StoreResult<()> {
        self.store
            .mutate(|db| {
                let before = db.customer_notes.len();
                db.customer_notes.retain(|n| n.id != id);
                if db.customer_notes.len() == before {
                    return Err(not_found("note", id));
                }
                Ok(())
            })
            .await
    }

    // =========================================================================
    // Reminders
    // =========================================================================

    /// Reminders for one customer, soonest due first.
    pub async fn reminders_for(&self, customer_id: &str) -> Vec<CustomerReminder> {
        self.store
            .read(|db| {
                let mut reminders: Vec<CustomerReminder> = db
                    .customer_reminders
                    .iter()
                    .filter(|r| r.customer_id == customer_id)
                    .cloned()
                    .collect();
                reminders.sort_by_key(|r| r.due_date);
                reminders
            })
            .await
    }

    pub async fn add_reminder(
        &self,
        customer_id: &str,
        title: &str,
        due_date: NaiveDate,
    ) -> StoreResult<CustomerReminder> {
        validate_name(title).map_err(CoreError::from)?;
        let customer_id = customer_id.to_string();
        let title = title.to_string();
        self.store
            .mutate(move |db| {
                if !db.customers.iter().any(|c| c.id == customer_id) {
                    return Err(not_found("customer", &customer_id));
                }
                let record = CustomerReminder {
                    id: new_id(),
                    customer_id,
                    title,
                    due_date,
                    completed: false,
                };
                db.customer_reminders.push(record.clone());
                Ok(record)
            })
            .await
    }

    pub async fn set_reminder_completed(&self, id: &str, completed: bool) -> StoreResult<()> {
        self.store
            .mutate(|db| {
                let reminder = db
                    .customer_reminders
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(|| not_found("reminder", id))?;
                reminder.completed = completed;
                Ok(())
            })
            .await
    }

    pub async fn delete_reminder(&self, id: &str) -> StoreResult<()> {
        self.store
            .mutate(|db| {
                let before = db.customer_reminders.len();
                db.customer_reminders.retain(|r| r.id != id);
                if db.customer_reminders.len() == before {
                    return Err(not_found("reminder", id));
                }
                Ok(())
            })
            .await
    }

    // =========================================================================
    // Message Templates
    // =========================================================================

    pub async fn templates(&self) -> Vec<MessageTemplate> {
        self.store.read(|db| db.message_templates.clone()).await
    }

    pub async fn find_template(&self, id: &str) -> Option<MessageTemplate> {
        self.store
            .read(|db| db.message_templates.iter().find(|t| t.id == id).cloned())
            .await
    }

    pub async fn add_template(&self, input: TemplateInput) -> StoreResult<MessageTemplate> {
        validate_name(&input.name).map_err(CoreError::from)?;
        self.store
            .mutate(move |db| {
                let template = MessageTemplate {
                    id: new_id(),
                    name: input.name,
                    category: input.category,
                    channel: input.channel,
                    content: input.content,
                    active: input.active,
                    created_at: Utc::now(),
                };
                db.message_templates.push(template.clone());
                Ok(template)
            })
            .await
    }

    pub async fn update_template(
        &self,
        id: &str,
        input: TemplateInput,
    ) -> StoreResult<MessageTemplate> {
        validate_name(&input.name).map_err(CoreError::from)?;
        self.store
            .mutate(move |db| {
                let template = db
                    .message_templates
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| not_found("template", id))?;
                template.name = input.name;
                template.category = input.category;
                template.channel = input.channel;
                template.content = input.content;
                template.active = input.active;
                Ok(template.clone())
            })
            .await
    }

    /// Deletes a template. Rules pointing at it keep their `template_id`;
    /// the automation engine treats the dangling reference as "no send".
    pub async fn delete_template(&self, id: &str) -> StoreResult<()> {
        self.store
            .mutate(|db| {
                let before = db.message_templates.len();
                db.message_templates.retain(|t| t.id != id);
                if db.message_templates.len() == before {
                    return Err(not_found("template", id));
                }
                Ok(())
            })
            .await
    }

    // =========================================================================
    // Message History
    // =========================================================================

    /// Appends one delivery record to the outbound log.
    pub async fn append_message(
        &self,
        customer_id: &str,
        template_id: &str,
        channel: Channel,
        content: &str,
        status: MessageStatus,
        sent_at: DateTime<Utc>,
    ) -> StoreResult<MessageHistoryEntry> {
        let entry = MessageHistoryEntry {
            id: new_id(),
            customer_id: customer_id.to_string(),
            template_id: template_id.to_string(),
            channel,
            content: content.to_string(),
            status,
            sent_at,
        };
        let stored = entry.clone();
        self.store
            .mutate(move |db| {
                db.message_history.push(entry);
                Ok(())
            })
            .await?;
        Ok(stored)
    }

    /// The outbound log, optionally narrowed to one customer and/or one
    /// template, newest first.
    pub async fn message_history(
        &self,
        customer_id: Option<&str>,
        template_id: Option<&str>,
    ) -> Vec<MessageHistoryEntry> {
        self.store
            .read(|db| {
                let mut entries: Vec<MessageHistoryEntry> = db
                    .message_history
                    .iter()
                    .filter(|e| customer_id.map_or(true, |id| e.customer_id == id))
                    .filter(|e| template_id.map_or(true, |id| e.template_id == id))
                    .cloned()
                    .collect();
                entries.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
                entries
            })
            .await
    }

    // =========================================================================
    // Automation Rules
    // =========================================================================

    pub async fn automation_rules(&self) -> Vec<AutomationRule> {
        self.store.read(|db| db.automation_rules.clone()).await
    }

    /// The rule for one trigger kind, if configured.
    pub async fn rule_for(&self, trigger: Trigger) -> Option<AutomationRule> {
        self.store
            .read(|db| {
                db.automation_rules
                    .iter()
                    .find(|r| r.trigger == trigger)
                    .cloned()
            })
            .await
    }

    /// Creates or replaces the single rule for a trigger kind.
    pub async fn upsert_rule(
        &self,
        trigger: Trigger,
        template_id: Option<String>,
        active: bool,
        settings: TriggerSettings,
    ) -> StoreResult<AutomationRule> {
        let rule = self
            .store
            .mutate(move |db| {
                if let Some(existing) = db.automation_rules.iter_mut().find(|r| r.trigger == trigger)
                {
                    existing.template_id = template_id;
                    existing.active = active;
                    existing.settings = settings;
                    return Ok(existing.clone());
                }
                let rule = AutomationRule {
                    id: new_id(),
                    trigger,
                    template_id,
                    active,
                    settings,
                    created_at: Utc::now(),
                };
                db.automation_rules.push(rule.clone());
                Ok(rule)
            })
            .await?;

        info!(trigger = ?rule.trigger, active = rule.active, "automation rule saved");
        Ok(rule)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::repository::{CustomerInput, CustomerRepository};

    async fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("kasa.json")).await.unwrap();
        (dir, store)
    }

    async fn seed_customer(store: &Store) -> kasa_core::Customer {
        CustomerRepository::new(store.clone())
            .insert(CustomerInput {
                name: "Mehmet Demir".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    fn welcome_template() -> TemplateInput {
        TemplateInput {
            name: "Hoş Geldiniz".to_string(),
            category: "Karşılama".to_string(),
            channel: TemplateChannel::Whatsapp,
            content: "Merhaba {customer_name}, aramıza hoş geldiniz!".to_string(),
            active: true,
        }
    }

    #[tokio::test]
    async fn notes_require_an_existing_customer() {
        let (_dir, store) = test_store().await;
        let crm = CrmRepository::new(store);

        let err = crm.add_note("ghost", "not here").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "customer", .. }));
    }

    #[tokio::test]
    async fn notes_are_newest_first() {
        let (_dir, store) = test_store().await;
        let customer = seed_customer(&store).await;
        let crm = CrmRepository::new(store);

        crm.add_note(&customer.id, "ilk not").await.unwrap();
        crm.add_note(&customer.id, "ikinci not").await.unwrap();

        let notes = crm.notes_for(&customer.id).await;
        assert_eq!(notes.len(), 2);
        assert!(notes[0].created_at >= notes[1].created_at);
    }

    #[tokio::test]
    async fn reminder_lifecycle() {
        let (_dir, store) = test_store().await;
        let customer = seed_customer(&store).await;
        let crm = CrmRepository::new(store);

        let due = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let reminder = crm
            .add_reminder(&customer.id, "Borç hatırlat", due)
            .await
            .unwrap();
        assert!(!reminder.completed);

        crm.set_reminder_completed(&reminder.id, true).await.unwrap();
        assert!(crm.reminders_for(&customer.id).await[0].completed);

        crm.delete_reminder(&reminder.id).await.unwrap();
        assert!(crm.reminders_for(&customer.id).await.is_empty());
    }

    #[tokio::test]
    async fn template_crud() {
        let (_dir, store) = test_store().await;
        let crm = CrmRepository::new(store);

        let created = crm.add_template(welcome_template()).await.unwrap();
        assert!(crm.find_template(&created.id).await.is_some());

        let mut edit = welcome_template();
        edit.active = false;
        let updated = crm.update_template(&created.id, edit).await.unwrap();
        assert!(!updated.active);

        crm.delete_template(&created.id).await.unwrap();
        assert!(crm.find_template(&created.id).await.is_none());
    }

    #[tokio::test]
    async fn history_filters_by_customer_and_template() {
        let (_dir, store) = test_store().await;
        let customer = seed_customer(&store).await;
        let crm = CrmRepository::new(store);

        crm.append_message(
            &customer.id,
            "tpl-1",
            Channel::Whatsapp,
            "merhaba",
            MessageStatus::Sent,
            Utc::now(),
        )
        .await
        .unwrap();
        crm.append_message(
            &customer.id,
            "tpl-2",
            Channel::Email,
            "tekrar merhaba",
            MessageStatus::Failed,
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(crm.message_history(Some(&customer.id), None).await.len(), 2);
        assert_eq!(
            crm.message_history(Some(&customer.id), Some("tpl-1")).await.len(),
            1
        );
        assert!(crm.message_history(Some("ghost"), None).await.is_empty());
    }

    #[tokio::test]
    async fn upsert_rule_replaces_existing_trigger() {
        let (_dir, store) = test_store().await;
        let crm = CrmRepository::new(store);

        let first = crm
            .upsert_rule(Trigger::Birthday, Some("tpl-1".to_string()), true, TriggerSettings::default())
            .await
            .unwrap();
        let second = crm
            .upsert_rule(Trigger::Birthday, Some("tpl-2".to_string()), false, TriggerSettings::default())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(crm.automation_rules().await.len(), 1);
        let rule = crm.rule_for(Trigger::Birthday).await.unwrap();
        assert_eq!(rule.template_id.as_deref(), Some("tpl-2"));
        assert!(!rule.active);
    }
}
