//! Messaging automation: evaluates triggers, renders templates, dispatches
//! through the [`Messenger`] and records every attempt in the message log.
//!
//! ## Flow
//! ```text
//!   trigger event ──▶ evaluate_trigger (kasa-core, pure)
//!                          │ should_send?
//!                          ▼
//!                    render_template ──▶ Messenger::deliver per channel
//!                          │                      │
//!                          └──────────────────────┴──▶ message log entry
//! ```
//!
//! Failures are per-customer: one bad number never stops a batch, it is
//! recorded as `Failed` in the log and the run continues.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use kasa_core::{
    classify, evaluate_trigger, render_template, Channel, Customer, MessageStatus,
    TemplateContext, Trigger,
};
use kasa_store::{CrmRepository, CustomerRepository, SettingsRepository, Store};

use crate::crm::CrmService;
use crate::error::EngineResult;
use crate::messaging::{BulkReport, Messenger, OutboundMessage, BULK_PACING};

/// Tally of one scheduler pass over the customer base.
///
/// Counters are per (trigger, customer) evaluation, not per customer: a
/// pass with both the birthday and inactive rules configured evaluates
/// every customer twice, so `sent + skipped + failed` can reach 2 × N.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutomationRunReport {
    /// Evaluations that said "send" and had at least one channel deliver.
    pub sent: usize,
    /// Evaluations that did not message (no match, cooldown, no contact
    /// info).
    pub skipped: usize,
    /// Evaluations where every attempted channel failed.
    pub failed: usize,
}

#[derive(Clone)]
pub struct AutomationService {
    customers: CustomerRepository,
    crm_repo: CrmRepository,
    settings: SettingsRepository,
    crm: CrmService,
    messenger: Arc<dyn Messenger>,
}

impl AutomationService {
    pub fn new(store: Store, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            customers: CustomerRepository::new(store.clone()),
            crm_repo: CrmRepository::new(store.clone()),
            settings: SettingsRepository::new(store.clone()),
            crm: CrmService::new(store),
            messenger,
        }
    }

    /// One scheduler pass: evaluates the birthday and inactive triggers
    /// for every customer. Meant to be called periodically (e.g. once a
    /// day at opening).
    pub async fn run_due_automations(&self, now: DateTime<Utc>) -> EngineResult<AutomationRunReport> {
        let mut report = AutomationRunReport::default();
        let customers = self.customers.list().await;

        for trigger in [Trigger::Birthday, Trigger::Inactive] {
            let rule = match self.crm_repo.rule_for(trigger).await {
                Some(rule) => rule,
                None => continue,
            };

            let settings = self.settings.get().await;
            for customer in &customers {
                let aggregate = self.crm.aggregate_for(&customer.id).await;
                let segment = classify(&aggregate, settings.vip_threshold_minor, now);
                let history = self.crm_repo.message_history(Some(&customer.id), None).await;

                let decision =
                    evaluate_trigger(trigger, &rule, customer, segment, &history, now);
                if !decision.should_send {
                    report.skipped += 1;
                    continue;
                }

                let discount_code = match trigger {
                    Trigger::Birthday => Some(settings.birthday_discount_code.clone()),
                    Trigger::Inactive => Some(settings.winback_discount_code.clone()),
                    _ => None,
                };

                match self
                    .dispatch_to(customer, decision.template_id.as_deref(), discount_code, now)
                    .await?
                {
                    DispatchOutcome::Delivered => report.sent += 1,
                    DispatchOutcome::AllFailed => report.failed += 1,
                    DispatchOutcome::Skipped => report.skipped += 1,
                }
            }
        }

        info!(
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            "automation pass finished"
        );
        Ok(report)
    }

    /// Fires the welcome trigger for a freshly created customer. A
    /// configured delay defers only the send, on a background task.
    pub async fn on_customer_created(&self, customer_id: &str) -> EngineResult<()> {
        self.fire_event_trigger(Trigger::Welcome, customer_id).await
    }

    /// Fires the thank-you trigger after a completed sale. Anonymous sales
    /// (no customer) never reach this point.
    pub async fn on_sale_completed(&self, customer_id: &str) -> EngineResult<()> {
        self.fire_event_trigger(Trigger::Thankyou, customer_id).await
    }

    async fn fire_event_trigger(&self, trigger: Trigger, customer_id: &str) -> EngineResult<()> {
        let rule = match self.crm_repo.rule_for(trigger).await {
            Some(rule) => rule,
            None => return Ok(()),
        };
        let customer = self.customers.get(customer_id).await?;
        let settings = self.settings.get().await;
        let now = Utc::now();
        let aggregate = self.crm.aggregate_for(customer_id).await;
        let segment = classify(&aggregate, settings.vip_threshold_minor, now);
        let history = self.crm_repo.message_history(Some(customer_id), None).await;

        let decision = evaluate_trigger(trigger, &rule, &customer, segment, &history, now);
        if !decision.should_send {
            return Ok(());
        }

        match decision.delay {
            Some(delay) => {
                // Decision is final now; only delivery waits.
                let service = self.clone();
                let template_id = decision.template_id.clone();
                let customer_id = customer_id.to_string();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let customer = match service.customers.get(&customer_id).await {
                        Ok(customer) => customer,
                        // Deleted while the delay ran; nothing to send.
                        Err(_) => return,
                    };
                    if let Err(e) = service
                        .dispatch_to(&customer, template_id.as_deref(), None, Utc::now())
                        .await
                    {
                        warn!(customer_id = %customer_id, error = %e, "deferred send failed");
                    }
                });
                Ok(())
            }
            None => {
                self.dispatch_to(&customer, decision.template_id.as_deref(), None, now)
                    .await?;
                Ok(())
            }
        }
    }

    /// Sends one template to one customer straight away, outside any
    /// trigger (the "send message" button).
    pub async fn send_to_customer(
        &self,
        customer_id: &str,
        template_id: &str,
    ) -> EngineResult<DispatchOutcome> {
        let customer = self.customers.get(customer_id).await?;
        self.dispatch_to(&customer, Some(template_id), None, Utc::now())
            .await
    }

    /// Sends one template to many customers, paced by [`BULK_PACING`].
    /// Every recipient is attempted; failures are tallied, never fatal.
    pub async fn send_bulk(
        &self,
        customer_ids: &[String],
        template_id: &str,
    ) -> EngineResult<BulkReport> {
        let mut report = BulkReport::default();

        for (index, customer_id) in customer_ids.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(BULK_PACING).await;
            }

            let customer = match self.customers.get(customer_id).await {
                Ok(customer) => customer,
                Err(_) => {
                    warn!(customer_id = %customer_id, "bulk recipient not found, skipping");
                    report.skipped += 1;
                    continue;
                }
            };

            match self
                .dispatch_to(&customer, Some(template_id), None, Utc::now())
                .await?
            {
                DispatchOutcome::Delivered => report.sent += 1,
                DispatchOutcome::AllFailed => report.failed += 1,
                DispatchOutcome::Skipped => report.skipped += 1,
            }
        }

        info!(
            template_id,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "bulk send finished"
        );
        Ok(report)
    }

    /// Renders and delivers one template to one customer across every
    /// channel the template allows and the customer has contact info for.
    /// Each attempt lands in the message log with its outcome.
    async fn dispatch_to(
        &self,
        customer: &Customer,
        template_id: Option<&str>,
        discount_code: Option<String>,
        now: DateTime<Utc>,
    ) -> EngineResult<DispatchOutcome> {
        let template_id = match template_id {
            Some(id) => id,
            None => return Ok(DispatchOutcome::Skipped),
        };
        let template = match self.crm_repo.find_template(template_id).await {
            Some(template) if template.active => template,
            Some(_) | None => {
                // Rule points at a deleted or disabled template.
                warn!(template_id, "template unavailable, dropping send");
                return Ok(DispatchOutcome::Skipped);
            }
        };

        let settings = self.settings.get().await;
        let aggregate = self.crm.aggregate_for(&customer.id).await;
        let mut ctx = TemplateContext::for_customer(customer, &aggregate)
            .with_store_name(settings.store_name.clone())
            .with_today(now);
        if let Some(code) = discount_code {
            ctx = ctx.with_discount_code(code);
        }
        let content = render_template(&template.content, &ctx);

        let mut delivered = 0;
        let mut failed = 0;
        for channel in [Channel::Whatsapp, Channel::Email] {
            if !template.channel.includes(channel) {
                continue;
            }
            let recipient = match recipient_for(customer, channel) {
                Some(recipient) => recipient,
                None => continue,
            };

            let message = OutboundMessage {
                customer_id: customer.id.clone(),
                template_id: template.id.clone(),
                channel,
                recipient,
                content: content.clone(),
            };

            let status = match self.messenger.deliver(&message) {
                Ok(()) => MessageStatus::Sent,
                Err(e) => {
                    warn!(customer_id = %customer.id, channel = ?channel, error = %e, "delivery failed");
                    MessageStatus::Failed
                }
            };
            if status == MessageStatus::Sent {
                delivered += 1;
            } else {
                failed += 1;
            }

            self.crm_repo
                .append_message(&customer.id, &template.id, channel, &content, status, now)
                .await?;
        }

        Ok(if delivered > 0 {
            DispatchOutcome::Delivered
        } else if failed > 0 {
            DispatchOutcome::AllFailed
        } else {
            DispatchOutcome::Skipped
        })
    }
}

/// Dispatch result for one customer across channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// At least one channel delivered.
    Delivered,
    /// Channels were attempted and all failed.
    AllFailed,
    /// Nothing was attempted (no template, no contact info).
    Skipped,
}

fn recipient_for(customer: &Customer, channel: Channel) -> Option<String> {
    match channel {
        Channel::Whatsapp => customer.phone.clone(),
        Channel::Email => customer.email.clone(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{Duration, NaiveDate, TimeZone};
    use kasa_core::{PaymentMethod, Sale, TemplateChannel, TriggerSettings};
    use kasa_store::{CustomerInput, SaleRepository, TemplateInput};

    use crate::messaging::DeliveryError;

    /// Test double that records deliveries and can be told to fail.
    #[derive(Default)]
    struct MockMessenger {
        delivered: Mutex<Vec<OutboundMessage>>,
        fail: std::sync::atomic::AtomicBool,
    }

    impl MockMessenger {
        fn messages(&self) -> Vec<OutboundMessage> {
            self.delivered.lock().unwrap().clone()
        }

        fn set_fail(&self, fail: bool) {
            self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl Messenger for MockMessenger {
        fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(DeliveryError("gateway down".to_string()));
            }
            self.delivered.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Store,
        messenger: Arc<MockMessenger>,
        service: AutomationService,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("kasa.json")).await.unwrap();
        let messenger = Arc::new(MockMessenger::default());
        let service = AutomationService::new(store.clone(), messenger.clone());
        Fixture {
            _dir: dir,
            store,
            messenger,
            service,
        }
    }

    async fn seed_customer(store: &Store, birth: Option<NaiveDate>) -> Customer {
        CustomerRepository::new(store.clone())
            .insert(CustomerInput {
                name: "Ayşe Yılmaz".to_string(),
                phone: Some("+905551112233".to_string()),
                email: None,
                address: None,
                birth_date: birth,
            })
            .await
            .unwrap()
    }

    async fn seed_rule(store: &Store, trigger: Trigger, settings: TriggerSettings) -> String {
        let crm = CrmRepository::new(store.clone());
        let template = crm
            .add_template(TemplateInput {
                name: "Şablon".to_string(),
                category: "Test".to_string(),
                channel: TemplateChannel::Whatsapp,
                content: "Merhaba {customer_name}! Kod: {discount_code}".to_string(),
                active: true,
            })
            .await
            .unwrap();
        crm.upsert_rule(trigger, Some(template.id.clone()), true, settings)
            .await
            .unwrap();
        template.id
    }

    async fn record_sale(store: &Store, customer_id: &str, days_ago: i64) {
        let sale = Sale {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: Some(customer_id.to_string()),
            subtotal_minor: 0,
            total_vat_minor: 0,
            grand_total_minor: 5000,
            payment_method: PaymentMethod::Cash,
            tendered_minor: Some(5000),
            change_minor: Some(0),
            created_at: Utc::now() - Duration::days(days_ago),
        };
        SaleRepository::new(store.clone())
            .commit_sale(sale, Vec::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn birthday_sends_on_matching_day_with_code() {
        let f = fixture().await;
        let birth = NaiveDate::from_ymd_opt(1990, 6, 15);
        seed_customer(&f.store, birth).await;
        seed_rule(&f.store, Trigger::Birthday, TriggerSettings::default()).await;

        let on_birthday = Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap();
        let report = f.service.run_due_automations(on_birthday).await.unwrap();
        assert_eq!(report.sent, 1);

        let messages = f.messenger.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.contains("DOGUMGUNU20"));
        assert!(messages[0].content.contains("Ayşe Yılmaz"));
    }

    #[tokio::test]
    async fn birthday_skips_on_other_days() {
        let f = fixture().await;
        seed_customer(&f.store, NaiveDate::from_ymd_opt(1990, 6, 15)).await;
        seed_rule(&f.store, Trigger::Birthday, TriggerSettings::default()).await;

        let not_birthday = Utc.with_ymd_and_hms(2025, 6, 16, 9, 0, 0).unwrap();
        let report = f.service.run_due_automations(not_birthday).await.unwrap();
        assert_eq!(report.sent, 0);
        assert!(f.messenger.messages().is_empty());
    }

    #[tokio::test]
    async fn inactive_fires_once_then_cools_down() {
        let f = fixture().await;
        let customer = seed_customer(&f.store, None).await;
        record_sale(&f.store, &customer.id, 45).await;
        seed_rule(&f.store, Trigger::Inactive, TriggerSettings::default()).await;

        let now = Utc::now();
        let first = f.service.run_due_automations(now).await.unwrap();
        assert_eq!(first.sent, 1);
        assert!(f.messenger.messages()[0].content.contains("GELDINIZ15"));

        // Second pass inside the cooldown window stays quiet.
        let second = f.service.run_due_automations(now).await.unwrap();
        assert_eq!(second.sent, 0);
        assert_eq!(f.messenger.messages().len(), 1);
    }

    #[tokio::test]
    async fn delivery_failure_is_logged_not_fatal() {
        let f = fixture().await;
        let customer = seed_customer(&f.store, None).await;
        record_sale(&f.store, &customer.id, 45).await;
        seed_rule(&f.store, Trigger::Inactive, TriggerSettings::default()).await;
        f.messenger.set_fail(true);

        let report = f.service.run_due_automations(Utc::now()).await.unwrap();
        assert_eq!(report.failed, 1);

        let log = CrmRepository::new(f.store.clone())
            .message_history(Some(&customer.id), None)
            .await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, MessageStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn welcome_delay_defers_only_the_send() {
        let f = fixture().await;
        let customer = seed_customer(&f.store, None).await;
        seed_rule(
            &f.store,
            Trigger::Welcome,
            TriggerSettings {
                delay_minutes: Some(5),
                time_of_day: None,
            },
        )
        .await;

        f.service.on_customer_created(&customer.id).await.unwrap();
        assert!(f.messenger.messages().is_empty());

        tokio::time::sleep(std::time::Duration::from_secs(5 * 60 + 1)).await;
        // Give the spawned task room to finish its file I/O.
        for _ in 0..100 {
            if !f.messenger.messages().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(f.messenger.messages().len(), 1);
    }

    #[tokio::test]
    async fn thankyou_fires_immediately_without_delay() {
        let f = fixture().await;
        let customer = seed_customer(&f.store, None).await;
        seed_rule(&f.store, Trigger::Thankyou, TriggerSettings::default()).await;

        f.service.on_sale_completed(&customer.id).await.unwrap();
        assert_eq!(f.messenger.messages().len(), 1);
    }

    #[tokio::test]
    async fn dangling_template_is_dropped_with_warning() {
        let f = fixture().await;
        let customer = seed_customer(&f.store, None).await;
        let crm = CrmRepository::new(f.store.clone());
        crm.upsert_rule(
            Trigger::Thankyou,
            Some("tpl-deleted".to_string()),
            true,
            TriggerSettings::default(),
        )
        .await
        .unwrap();

        f.service.on_sale_completed(&customer.id).await.unwrap();
        assert!(f.messenger.messages().is_empty());
        assert!(crm.message_history(Some(&customer.id), None).await.is_empty());
    }

    #[tokio::test]
    async fn report_counts_each_trigger_evaluation() {
        let f = fixture().await;
        seed_customer(&f.store, NaiveDate::from_ymd_opt(1990, 6, 15)).await;
        seed_rule(&f.store, Trigger::Birthday, TriggerSettings::default()).await;
        seed_rule(&f.store, Trigger::Inactive, TriggerSettings::default()).await;

        // Neither trigger matches: one customer, two rules, two skips.
        let not_birthday = Utc.with_ymd_and_hms(2025, 6, 16, 9, 0, 0).unwrap();
        let report = f.service.run_due_automations(not_birthday).await.unwrap();
        assert_eq!(report.sent, 0);
        assert_eq!(report.skipped, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_send_continues_past_missing_customers() {
        let f = fixture().await;
        let customer = seed_customer(&f.store, None).await;
        let template_id = seed_rule(&f.store, Trigger::Welcome, TriggerSettings::default()).await;

        let ids = vec!["ghost".to_string(), customer.id.clone()];
        let report = f.service.send_bulk(&ids, &template_id).await.unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
    }
}
