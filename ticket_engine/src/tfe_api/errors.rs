use thiserror::Error;

use crate::{db_types::Ticket, traits::LedgerError};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Could not complete order flow. {0}")]
    Ledger(#[from] LedgerError),
    #[error("Event #{0} has neither a flat price nor a ticket tier to price the order against")]
    UnpricedEvent(i64),
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),
}

#[derive(Debug, Clone, Error)]
pub enum TicketApiError {
    #[error("Could not complete ticket operation. {0}")]
    Ledger(LedgerError),
    #[error("No ticket matches '{0}'")]
    TicketNotFound(String),
    /// The ticket exists but was already checked in (or cancelled). Carries the ticket so the gate operator can
    /// see who is holding it.
    #[error("Ticket [{}] has already been used", .0.qr_code)]
    TicketUsed(Box<Ticket>),
    #[error("Cancellation rejected: {0}")]
    CancellationRejected(String),
}

impl From<LedgerError> for TicketApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::TicketNotFound(code) => TicketApiError::TicketNotFound(code),
            LedgerError::CancellationPreconditionFailed(reason) => TicketApiError::CancellationRejected(reason),
            other => TicketApiError::Ledger(other),
        }
    }
}
