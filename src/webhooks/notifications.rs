use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::config::WebhookConfig;
use crate::types::ReservationCode;

use super::NotifyError;

/// welcome message selected by the guest's visit count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitTier {
    FirstVisit,
    SecondVisit,
    LoyalCustomer,
}

impl VisitTier {
    pub fn from_visit_count(visit_count: u32) -> Self {
        match visit_count {
            0 | 1 => VisitTier::FirstVisit,
            2 => VisitTier::SecondVisit,
            _ => VisitTier::LoyalCustomer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestContact {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub visit_count: u32,
    pub doc_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaySummary {
    pub room_number: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// one field changed by a reservation update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

impl FieldChange {
    pub fn new(field: &str, old_value: impl ToString, new_value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            old_value: old_value.to_string(),
            new_value: new_value.to_string(),
        }
    }
}

/// payload sent to the notification webhooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    CheckIn {
        guest: GuestContact,
        reservation: StaySummary,
        message_type: VisitTier,
        timestamp: DateTime<Utc>,
    },
    CheckOut {
        guest_name: String,
        guest_phone: Option<String>,
        room_number: String,
        timestamp: DateTime<Utc>,
    },
    ReservationUpdate {
        reservation_code: ReservationCode,
        changed_fields: Vec<FieldChange>,
        updated_by: String,
        timestamp: DateTime<Utc>,
    },
}

impl Notification {
    pub fn label(&self) -> &'static str {
        match self {
            Notification::CheckIn { .. } => "check_in",
            Notification::CheckOut { .. } => "check_out",
            Notification::ReservationUpdate { .. } => "reservation_update",
        }
    }
}

/// outbound notification seam
pub trait Notifier {
    /// hand a notification over for delivery; never blocks the caller for long
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// keeps notifications in memory, clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
        Ok(())
    }
}

/// posts JSON to the configured webhook on a detached thread
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    config: WebhookConfig,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Self {
        Self { config }
    }

    fn url_for(&self, notification: &Notification) -> Option<&str> {
        let url = match notification {
            Notification::CheckIn { .. } => &self.config.checkin_url,
            Notification::CheckOut { .. } => &self.config.checkout_url,
            Notification::ReservationUpdate { .. } => &self.config.update_url,
        };
        url.as_deref()
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        if !self.config.enabled {
            return Ok(());
        }
        let url = self
            .url_for(&notification)
            .ok_or(NotifyError::NotConfigured { event: notification.label() })?
            .to_string();
        let timeout = Duration::from_secs(self.config.notify_timeout_secs);

        thread::Builder::new()
            .name("frontdesk-notify".to_string())
            .spawn(move || {
                let event = notification.label();
                match post_json(&url, &notification, timeout) {
                    Ok(()) => tracing::debug!(event, url = %url, "webhook delivered"),
                    Err(e) => tracing::warn!(event, url = %url, error = %e, "webhook delivery failed"),
                }
            })?;

        Ok(())
    }
}

fn post_json(url: &str, notification: &Notification, timeout: Duration) -> Result<(), NotifyError> {
    let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
    let response = client.post(url).json(notification).send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(NotifyError::Status { status: status.as_u16() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_tiers() {
        assert_eq!(VisitTier::from_visit_count(1), VisitTier::FirstVisit);
        assert_eq!(VisitTier::from_visit_count(2), VisitTier::SecondVisit);
        assert_eq!(VisitTier::from_visit_count(3), VisitTier::LoyalCustomer);
        assert_eq!(VisitTier::from_visit_count(40), VisitTier::LoyalCustomer);
    }

    #[test]
    fn test_payload_shape() {
        let notification = Notification::ReservationUpdate {
            reservation_code: ReservationCode(12),
            changed_fields: vec![FieldChange::new("end_date", "2025-01-03", "2025-01-04")],
            updated_by: "ana".to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["event"], "reservation_update");
        assert_eq!(json["reservation_code"], 12);
        assert_eq!(json["changed_fields"][0]["field"], "end_date");
    }

    #[test]
    fn test_memory_notifier_shares_buffer() {
        let notifier = MemoryNotifier::new();
        let handle = notifier.clone();

        notifier
            .notify(Notification::CheckOut {
                guest_name: "Rosa".to_string(),
                guest_phone: None,
                room_number: "201".to_string(),
                timestamp: Utc::now(),
            })
            .unwrap();

        assert_eq!(handle.sent().len(), 1);
        assert_eq!(handle.sent()[0].label(), "check_out");
    }

    #[test]
    fn test_disabled_webhooks_are_silent() {
        let notifier = WebhookNotifier::new(WebhookConfig::default());
        let result = notifier.notify(Notification::CheckOut {
            guest_name: "Rosa".to_string(),
            guest_phone: None,
            room_number: "201".to_string(),
            timestamp: Utc::now(),
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_url_is_reported() {
        let config = WebhookConfig { enabled: true, ..WebhookConfig::default() };
        let result = WebhookNotifier::new(config).notify(Notification::CheckOut {
            guest_name: "Rosa".to_string(),
            guest_phone: None,
            room_number: "201".to_string(),
            timestamp: Utc::now(),
        });
        assert!(matches!(result, Err(NotifyError::NotConfigured { event: "check_out" })));
    }
}
