use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tix_common::Naira;

/// The envelope FluxPay posts to our webhook endpoint. The same `data` shape is returned by the transaction
/// verification endpoint, so the webhook path and the polling path feed identical values into reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub event: Option<String>,
    pub data: ChargeData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeData {
    /// The provider-side transaction id. Assigned by FluxPay, so it is absent until the first notification.
    #[serde(default)]
    pub id: Option<i64>,
    /// Our idempotent reference for the charge. This always equals the order id.
    #[serde(alias = "reference")]
    pub tx_ref: String,
    pub status: ChargeStatus,
    /// Amount in major currency units, as reported by the provider.
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerInfo>,
    #[serde(default, alias = "gateway_response")]
    pub processor_response: Option<String>,
}

impl ChargeData {
    /// The reported amount converted to kobo. The provider reports decimal major units; rounding to the nearest kobo
    /// is exact for any amount the provider can legally report (two decimal places).
    pub fn amount_kobo(&self) -> Naira {
        Naira::from((self.amount * 100.0).round() as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChargeStatus {
    Pending,
    Successful,
    Failed,
    Cancelled,
    /// Any status we do not recognise. Logged and ignored by reconciliation; never a state mutation.
    Other(String),
}

impl From<String> for ChargeStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "successful" | "success" => Self::Successful,
            "failed" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(value),
        }
    }
}

impl From<ChargeStatus> for String {
    fn from(value: ChargeStatus) -> Self {
        value.to_string()
    }
}

impl Display for ChargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChargeStatus::Pending => write!(f, "pending"),
            ChargeStatus::Successful => write!(f, "successful"),
            ChargeStatus::Failed => write!(f, "failed"),
            ChargeStatus::Cancelled => write!(f, "cancelled"),
            ChargeStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A bank-transfer instruction scoped to a single order reference. This is what the attendee pays into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualAccount {
    pub account_number: String,
    pub bank_name: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}
