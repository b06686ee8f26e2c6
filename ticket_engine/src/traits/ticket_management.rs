use crate::{db_types::Ticket, traits::LedgerError};

/// The ticket lifecycle contract: check-in verification and buyer-initiated cancellation.
#[allow(async_fn_in_trait)]
pub trait TicketManagement: Clone {
    /// Look a ticket up by its scannable payload. Tries an exact `qr_code` match first, then a substring match
    /// (scanners sometimes deliver the payload embedded in URL or framing noise), then the raw numeric id.
    async fn fetch_ticket_by_code(&self, code: &str) -> Result<Option<Ticket>, LedgerError>;

    async fn fetch_ticket_by_id(&self, ticket_id: i64) -> Result<Option<Ticket>, LedgerError>;

    /// Flip a ticket to used. The `used = 0` guard is part of the UPDATE, so two simultaneous scans of the same
    /// ticket admit exactly one holder: `None` means the ticket was already used.
    async fn use_ticket(&self, ticket_id: i64) -> Result<Option<Ticket>, LedgerError>;

    /// Cancel a batch of tickets belonging to `buyer_id`.
    ///
    /// All-or-nothing: if any requested id does not exist, is not owned by the buyer, or is already used, the call
    /// fails with [`LedgerError::CancellationPreconditionFailed`] and nothing is written. On success every ticket
    /// is marked used with a cancellation timestamp (rows are never deleted).
    async fn cancel_tickets(&self, buyer_id: i64, ticket_ids: &[i64]) -> Result<u64, LedgerError>;
}
