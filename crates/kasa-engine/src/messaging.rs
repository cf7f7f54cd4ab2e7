//! Outbound message dispatch.
//!
//! The engine decides WHAT to send; delivery itself goes through the
//! [`Messenger`] trait so the actual WhatsApp/SMTP integration (or a test
//! double) lives outside this crate. The default [`LogMessenger`] only
//! writes a log line, which is exactly what a development build wants.

use std::time::Duration;

use thiserror::Error;
use tracing::info;

use kasa_core::Channel;

/// Pause between consecutive sends in a bulk campaign, so a hundred
/// customers do not hit the gateway in one burst.
pub const BULK_PACING: Duration = Duration::from_millis(1500);

/// One rendered message ready for delivery.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub customer_id: String,
    pub template_id: String,
    pub channel: Channel,
    /// Recipient address: phone number or e-mail, per `channel`.
    pub recipient: String,
    /// Fully rendered content, no placeholders left.
    pub content: String,
}

/// Delivery failure reported by a messenger.
#[derive(Debug, Error)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Pluggable delivery backend.
///
/// Implementations must be cheap to call from async context; anything
/// slow should queue internally.
pub trait Messenger: Send + Sync {
    fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

/// Messenger that records deliveries in the log and always succeeds.
#[derive(Debug, Default)]
pub struct LogMessenger;

impl Messenger for LogMessenger {
    fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        info!(
            customer_id = %message.customer_id,
            channel = ?message.channel,
            recipient = %message.recipient,
            "outbound message (log only)"
        );
        Ok(())
    }
}

/// Outcome of a bulk campaign: every recipient is attempted, failures
/// never abort the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub sent: usize,
    pub failed: usize,
    /// Recipients skipped before delivery (no contact info, no such
    /// customer).
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_messenger_always_succeeds() {
        let message = OutboundMessage {
            customer_id: "c1".to_string(),
            template_id: "t1".to_string(),
            channel: Channel::Whatsapp,
            recipient: "+905551112233".to_string(),
            content: "Merhaba!".to_string(),
        };
        assert!(LogMessenger.deliver(&message).is_ok());
    }
}
