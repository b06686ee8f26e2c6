use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use tix_common::Naira;

//--------------------------------------        OrderId        -------------------------------------------------------
/// The externally visible order reference. It doubles as the idempotent transaction reference sent to the payment
/// provider (`tx_ref`), which is how webhook notifications find their way back to the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created; no payment has been confirmed yet.
    Pending,
    /// Payment confirmed, tickets issued, buyer notified.
    Completed,
    /// The order sat unpaid beyond the retention window.
    Expired,
    /// The provider reported the payment as failed.
    Failed,
    /// The provider reported the payment as cancelled, or the buyer abandoned checkout.
    Cancelled,
    /// Payment was confirmed but ticket issuance failed. Requires operator intervention.
    PaidFailedTicketing,
    /// Payment was confirmed and tickets exist, but the fulfilment email could not be sent.
    PaidFailedEmail,
}

impl OrderStatusType {
    /// True for every status that means money has been taken. Replayed webhooks for such orders are no-ops.
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Completed | Self::PaidFailedTicketing | Self::PaidFailedEmail)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "Pending",
            OrderStatusType::Completed => "Completed",
            OrderStatusType::Expired => "Expired",
            OrderStatusType::Failed => "Failed",
            OrderStatusType::Cancelled => "Cancelled",
            OrderStatusType::PaidFailedTicketing => "PaidFailedTicketing",
            OrderStatusType::PaidFailedEmail => "PaidFailedEmail",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Expired" => Ok(Self::Expired),
            "Failed" => Ok(Self::Failed),
            "Cancelled" => Ok(Self::Cancelled),
            "PaidFailedTicketing" => Ok(Self::PaidFailedTicketing),
            "PaidFailedEmail" => Ok(Self::PaidFailedEmail),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub buyer_id: i64,
    pub event_id: i64,
    /// Snapshot of the selected ticket tier. Copied, not referenced: later edits to the event's tiers never
    /// retroactively alter a historical order.
    pub tier_name: Option<String>,
    pub tier_description: Option<String>,
    pub tier_price: Option<Naira>,
    pub quantity: i64,
    /// Unit price × quantity, fixed at creation time. Never recomputed.
    pub total_price: Naira,
    pub status: OrderStatusType,
    pub payment_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The per-seat price this order was struck at.
    pub fn unit_price(&self) -> Naira {
        self.tier_price.unwrap_or_else(|| {
            if self.quantity > 0 {
                Naira::from(self.total_price.value() / self.quantity)
            } else {
                self.total_price
            }
        })
    }
}

//--------------------------------------       NewOrder       --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub buyer_id: i64,
    pub event_id: i64,
    pub tier_name: Option<String>,
    pub tier_description: Option<String>,
    pub tier_price: Option<Naira>,
    pub quantity: i64,
    pub total_price: Naira,
}

//--------------------------------------     Transaction      --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Successful,
    Failed,
    Cancelled,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Successful => "Successful",
            TransactionStatus::Failed => "Failed",
            TransactionStatus::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Successful" => Ok(Self::Successful),
            "Failed" => Ok(Self::Failed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

impl From<String> for TransactionStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid transaction status: {value}. But this conversion cannot fail. Defaulting to Pending");
            TransactionStatus::Pending
        })
    }
}

/// One row per payment attempt against an order. The status only ever moves forward
/// (`Pending → Successful | Failed | Cancelled`); every webhook or poll observed for the attempt is appended to the
/// [`TransactionEvent`] log, never overwritten, so underpay/overpay/retry forensics stay possible.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub order_id: OrderId,
    pub payer_id: i64,
    /// The idempotent reference shared with the provider. Always equals the order id.
    pub reference: OrderId,
    /// Assigned by the provider; absent until the first notification arrives.
    pub provider_tx_id: Option<i64>,
    pub amount: Naira,
    pub currency: String,
    pub payment_method: String,
    pub status: TransactionStatus,
    pub va_account_number: Option<String>,
    pub va_bank: Option<String>,
    pub va_expires_at: Option<DateTime<Utc>>,
    pub metadata: Option<String>,
    pub initiated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub id: i64,
    pub transaction_id: i64,
    pub amount: Naira,
    pub status: String,
    pub received_at: DateTime<Utc>,
    pub raw_payload: String,
}

//--------------------------------------        Ticket        --------------------------------------------------------
/// One admission credential per attendee-seat. The QR payload is the sole artifact used at check-in; it is unique
/// per ticket and deterministic (`"{order_id}-{n}"` for seat n of the order).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub event_id: i64,
    pub buyer_id: i64,
    pub order_id: OrderId,
    pub tier_name: Option<String>,
    pub price_paid: Naira,
    pub seat_label: String,
    pub qr_code: String,
    /// Terminal once set. Cancellation reuses this flag (with `cancelled_at` as the marker) to keep the observed
    /// two-state check-in model.
    pub used: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub event_id: i64,
    pub buyer_id: i64,
    pub order_id: OrderId,
    pub tier_name: Option<String>,
    pub price_paid: Naira,
    pub seat_label: String,
    pub qr_code: String,
}

//--------------------------------------        Event         --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum EventStatus {
    Draft,
    Published,
    Archived,
    Deleted,
}

impl Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Draft => "Draft",
            EventStatus::Published => "Published",
            EventStatus::Archived => "Archived",
            EventStatus::Deleted => "Deleted",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EventStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "Published" => Ok(Self::Published),
            "Archived" => Ok(Self::Archived),
            "Deleted" => Ok(Self::Deleted),
            s => Err(ConversionError(format!("Invalid event status: {s}"))),
        }
    }
}

impl From<String> for EventStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid event status: {value}. But this conversion cannot fail. Defaulting to Draft");
            EventStatus::Draft
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub organizer_id: i64,
    pub title: String,
    pub venue: String,
    pub capacity: i64,
    /// Flat per-seat price. `None` when the event sells named tiers instead.
    pub price: Option<Naira>,
    pub status: EventStatus,
    /// When set on a Draft event, the sweep worker flips it to Published once this time elapses.
    pub publish_at: Option<DateTime<Utc>>,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TicketType {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub description: String,
    pub price: Naira,
}

//--------------------------------------         User         --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    /// Only ever mutated by the settlement step, by atomic increment.
    pub available_balance: Naira,
    pub total_earnings: Naira,
    /// The payer identity registered with the payment provider, cached after first use.
    pub provider_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
