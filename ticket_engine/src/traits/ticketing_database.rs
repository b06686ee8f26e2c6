use chrono::Duration;
use thiserror::Error;
use tix_common::Naira;

use crate::{
    db_types::{
        Event,
        NewOrder,
        NewTicket,
        Order,
        OrderId,
        OrderStatusType,
        Ticket,
        TicketType,
        Transaction,
        TransactionStatus,
        User,
    },
    traits::VirtualAccountSnapshot,
};

/// The write-side contract for the order ledger, transaction log, ticket issuance and settlement.
///
/// Implementations must make the guarantees the engine relies on explicit at the storage layer:
/// * [`complete_order`](Self::complete_order) is a *conditional* transition (`status = Pending` guard in the same
///   statement as the write). Two racing webhook deliveries must not both observe a pending order.
/// * [`insert_tickets`](Self::insert_tickets) is all-or-nothing: either every row commits or none do.
/// * [`credit_organizer`](Self::credit_organizer) is an atomic increment, never read-modify-write, because
///   concurrent settlements for different orders of the same organizer must not lose updates.
#[allow(async_fn_in_trait)]
pub trait TicketingDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    async fn fetch_event(&self, event_id: i64) -> Result<Option<Event>, LedgerError>;

    /// Fetch the named ticket tier for an event. The match is case-insensitive.
    async fn fetch_ticket_type(&self, event_id: i64, name: &str) -> Result<Option<TicketType>, LedgerError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, LedgerError>;

    /// Cache the provider-side payer identity on the user record, so it is created at most once per user.
    async fn set_provider_customer_id(&self, user_id: i64, customer_id: &str) -> Result<(), LedgerError>;

    /// Persist a priced order together with its pending transaction (reference = order id) in one atomic
    /// transaction. Fails with [`LedgerError::OrderAlreadyExists`] on a duplicate order id.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Transaction), LedgerError>;

    async fn fetch_order_by_reference(&self, reference: &OrderId) -> Result<Option<Order>, LedgerError>;

    /// Transition an order from `Pending` to `Completed`, recording the payment reference and paid timestamp.
    ///
    /// The guard is part of the UPDATE itself; `None` means the order was not pending (replayed webhook, or a
    /// concurrent delivery won the race) and the caller must treat the call as a no-op.
    async fn complete_order(&self, reference: &OrderId, payment_ref: &str) -> Result<Option<Order>, LedgerError>;

    /// Unconditional status write used for the failure-path transitions (`Failed`, `PaidFailedTicketing`,
    /// `PaidFailedEmail`, and the recovery back to `Completed` after a successful resend).
    async fn update_order_status(
        &self,
        reference: &OrderId,
        status: OrderStatusType,
        failure_reason: Option<&str>,
    ) -> Result<Option<Order>, LedgerError>;

    async fn fetch_transaction_by_reference(&self, reference: &OrderId) -> Result<Option<Transaction>, LedgerError>;

    /// Snapshot the virtual account details onto the pending transaction for this reference.
    async fn attach_virtual_account(
        &self,
        reference: &OrderId,
        va: &VirtualAccountSnapshot,
    ) -> Result<(), LedgerError>;

    /// Move a transaction out of `Pending`. Conditional like [`complete_order`](Self::complete_order): `None`
    /// means the transaction had already reached a terminal status, which is never reversed.
    async fn transition_transaction(
        &self,
        reference: &OrderId,
        status: TransactionStatus,
        provider_tx_id: Option<i64>,
    ) -> Result<Option<Transaction>, LedgerError>;

    /// Append one observation (webhook delivery or poll result) to the transaction's attempt log. The log is
    /// append-only; every delivery is recorded, including replays and amount mismatches.
    async fn record_transaction_event(
        &self,
        reference: &OrderId,
        amount: Naira,
        status: &str,
        raw_payload: &serde_json::Value,
    ) -> Result<(), LedgerError>;

    /// Insert all tickets for an order in a single transaction. Either every row exists afterwards or the error
    /// propagates with nothing written.
    async fn insert_tickets(&self, tickets: Vec<NewTicket>) -> Result<Vec<Ticket>, LedgerError>;

    async fn fetch_tickets_for_order(&self, reference: &OrderId) -> Result<Vec<Ticket>, LedgerError>;

    /// Credit the organizer's available balance and lifetime earnings by `amount`, atomically.
    async fn credit_organizer(&self, user_id: i64, amount: Naira) -> Result<(), LedgerError>;

    /// Pending orders older than `grace` but younger than `retention`, for the reconciliation sweep. The grace
    /// window keeps the sweep from racing a webhook that is already in flight; the retention window stops us
    /// polling the provider about orders it has long forgotten.
    async fn fetch_stale_pending_orders(
        &self,
        grace: Duration,
        retention: Duration,
    ) -> Result<Vec<Order>, LedgerError>;

    /// Flip Draft events whose scheduled publish time has elapsed to Published. Returns the affected events.
    async fn publish_due_events(&self) -> Result<Vec<Event>, LedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists: {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested event #{0} does not exist")]
    EventNotFound(i64),
    #[error("The requested user #{0} does not exist")]
    UserNotFound(i64),
    #[error("Event #{event_id} has no ticket tier named '{name}'")]
    TicketTypeNotFound { event_id: i64, name: String },
    #[error("The requested transaction {0} does not exist")]
    TransactionNotFound(OrderId),
    #[error("No ticket matches '{0}'")]
    TicketNotFound(String),
    #[error("Cancellation rejected: {0}")]
    CancellationPreconditionFailed(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
