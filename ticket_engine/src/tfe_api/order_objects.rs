use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tix_common::Naira;

use crate::db_types::{Event, Order, OrderId, Ticket, Transaction, User};

/// The order creation request, as it arrives from the server layer. Prices are deliberately absent: the engine is
/// the sole place prices are computed, from the event's stored tier or flat price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub buyer_id: i64,
    pub event_id: i64,
    /// The named tier, if the event sells tiers. Matched case-insensitively.
    pub ticket_type: Option<String>,
    pub quantity: i64,
}

/// What a payment-success notification did to the ledger. The server decides the HTTP response and side effects
/// (ticket issuance, settlement, mail, operator alerts) from this.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// No order carries this reference. An operator alert, not an error: the money is real even if the order isn't.
    OrderNotFound { reference: OrderId },
    /// The order had already left `Pending`. Replayed delivery or a lost race; a strict no-op.
    AlreadyCompleted(Order),
    /// The reported amount differs from the order total beyond tolerance. Nothing changed except the appended
    /// observation in the transaction log.
    AmountMismatch { order: Order, expected: Naira, received: Naira },
    /// The conditional completion committed. Exactly one delivery per order ever gets this.
    Completed(SettledOrder),
}

#[derive(Debug, Clone)]
pub struct SettledOrder {
    pub order: Order,
    pub transaction: Transaction,
}

/// Event fields the gate display needs at check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: i64,
    pub title: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self { id: event.id, title: event.title.clone(), venue: event.venue.clone(), starts_at: event.starts_at }
    }
}

/// Buyer fields the gate display needs at check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderSummary {
    pub id: i64,
    pub display_name: String,
    pub email: String,
}

impl From<&User> for HolderSummary {
    fn from(user: &User) -> Self {
        Self { id: user.id, display_name: user.display_name.clone(), email: user.email.clone() }
    }
}

/// A successful check-in: the ticket after its `used` flip, plus the context the gate operator sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckedInTicket {
    pub ticket: Ticket,
    pub event: EventSummary,
    pub holder: HolderSummary,
}

/// Everything needed to re-send a fulfilment email for a single ticket.
#[derive(Debug, Clone)]
pub struct ResendBundle {
    pub ticket: Ticket,
    pub order: Order,
    pub event: Event,
    pub buyer: User,
}
