use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{DeskError, Result};

/// errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {source}")]
    Yaml { source: serde_yml::Error },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// desk configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub webhooks: WebhookConfig,
}

impl DeskConfig {
    /// load from a YAML file, then apply the webhook environment overrides
    pub fn from_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// parse from a YAML string, then apply the webhook environment overrides
    pub fn parse(yaml: &str) -> std::result::Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.webhooks.apply_env_overrides();
        Ok(config)
    }

    /// validate configuration values
    pub fn validate(&self) -> Result<()> {
        let tolerances = [
            ("checkout_tolerance", self.billing.checkout_tolerance),
            ("overpayment_tolerance", self.billing.overpayment_tolerance),
            ("allocation_epsilon", self.billing.allocation_epsilon),
        ];
        for (name, value) in tolerances {
            if value < Decimal::ZERO {
                return Err(DeskError::InvalidConfiguration {
                    message: format!("billing.{} cannot be negative ({})", name, value),
                });
            }
        }

        if self.billing.payment_decimals > 2 {
            return Err(DeskError::InvalidConfiguration {
                message: format!(
                    "billing.payment_decimals must be between 0 and 2, got {}",
                    self.billing.payment_decimals
                ),
            });
        }

        if self.booking.max_window_days == 0 {
            return Err(DeskError::InvalidConfiguration {
                message: "booking.max_window_days must be positive".to_string(),
            });
        }

        // chrono rejects offsets of a day or more
        if self.booking.business_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(DeskError::InvalidConfiguration {
                message: format!(
                    "booking.business_utc_offset_minutes out of range: {}",
                    self.booking.business_utc_offset_minutes
                ),
            });
        }

        if self.booking.default_doc_type.trim().is_empty() {
            return Err(DeskError::InvalidConfiguration {
                message: "booking.default_doc_type cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// money tolerances and payment rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// debt at or below this is settled for checkout
    #[serde(default = "default_checkout_tolerance")]
    pub checkout_tolerance: Decimal,
    /// slack allowed above the total debt when paying
    #[serde(default = "default_overpayment_tolerance")]
    pub overpayment_tolerance: Decimal,
    /// bucket splits at or below this are dropped
    #[serde(default = "default_allocation_epsilon")]
    pub allocation_epsilon: Decimal,
    /// fractional digits allowed on payments, 0 for whole units
    #[serde(default)]
    pub payment_decimals: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            checkout_tolerance: default_checkout_tolerance(),
            overpayment_tolerance: default_overpayment_tolerance(),
            allocation_epsilon: default_allocation_epsilon(),
            payment_decimals: 0,
        }
    }
}

/// booking defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingConfig {
    #[serde(default = "default_doc_type")]
    pub default_doc_type: String,
    /// widest availability window accepted
    #[serde(default = "default_max_window_days")]
    pub max_window_days: u32,
    /// offset of the business time zone, used to bucket ledger entries by day
    #[serde(default = "default_business_utc_offset_minutes")]
    pub business_utc_offset_minutes: i32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            default_doc_type: default_doc_type(),
            max_window_days: default_max_window_days(),
            business_utc_offset_minutes: default_business_utc_offset_minutes(),
        }
    }
}

/// outbound webhook endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub checkin_url: Option<String>,
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub update_url: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,
    #[serde(default = "default_document_timeout_secs")]
    pub document_timeout_secs: u64,
}

impl WebhookConfig {
    /// environment variables win over the file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FRONTDESK_CHECKIN_WEBHOOK") {
            self.checkin_url = Some(val);
        }
        if let Ok(val) = std::env::var("FRONTDESK_CHECKOUT_WEBHOOK") {
            self.checkout_url = Some(val);
        }
        if let Ok(val) = std::env::var("FRONTDESK_UPDATE_WEBHOOK") {
            self.update_url = Some(val);
        }
        if let Ok(val) = std::env::var("FRONTDESK_DOCUMENT_WEBHOOK") {
            self.document_url = Some(val);
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            checkin_url: None,
            checkout_url: None,
            update_url: None,
            document_url: None,
            notify_timeout_secs: default_notify_timeout_secs(),
            document_timeout_secs: default_document_timeout_secs(),
        }
    }
}

fn default_checkout_tolerance() -> Decimal {
    dec!(0.01)
}

fn default_overpayment_tolerance() -> Decimal {
    dec!(0.1)
}

fn default_allocation_epsilon() -> Decimal {
    dec!(0.001)
}

fn default_doc_type() -> String {
    "DNI".to_string()
}

const fn default_max_window_days() -> u32 {
    366
}

const fn default_business_utc_offset_minutes() -> i32 {
    -300
}

const fn default_notify_timeout_secs() -> u64 {
    5
}

const fn default_document_timeout_secs() -> u64 {
    30
}
