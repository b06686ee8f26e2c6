use std::fmt::Debug;

use log::*;

use crate::{
    tfe_api::{
        errors::TicketApiError,
        order_objects::{CheckedInTicket, EventSummary, HolderSummary, ResendBundle},
    },
    traits::{LedgerError, TicketManagement, TicketingDatabase},
};

/// `TicketApi` covers the ticket lifecycle after issuance: gate check-in, buyer cancellation, and the lookups
/// behind a fulfilment email resend.
pub struct TicketApi<B> {
    db: B,
}

impl<B> Debug for TicketApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TicketApi")
    }
}

impl<B> TicketApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> TicketApi<B>
where B: TicketManagement + TicketingDatabase
{
    /// Verify a scanned code and admit the holder.
    ///
    /// The lookup tries an exact QR match, then a substring match, then the raw numeric id. An unused ticket is
    /// flipped to used; the flip is conditional at the storage layer, so of two simultaneous scans exactly one
    /// returns success and the other gets [`TicketApiError::TicketUsed`].
    pub async fn verify_ticket(&self, code: &str) -> Result<CheckedInTicket, TicketApiError> {
        let ticket = self
            .db
            .fetch_ticket_by_code(code)
            .await?
            .ok_or_else(|| TicketApiError::TicketNotFound(code.to_string()))?;
        if ticket.used {
            debug!("🎫️ Rejected scan of used ticket [{}]", ticket.qr_code);
            return Err(TicketApiError::TicketUsed(Box::new(ticket)));
        }
        let ticket = self
            .db
            .use_ticket(ticket.id)
            .await?
            .ok_or_else(|| TicketApiError::TicketUsed(Box::new(ticket)))?;
        let event =
            self.db.fetch_event(ticket.event_id).await?.ok_or(LedgerError::EventNotFound(ticket.event_id))?;
        let holder =
            self.db.fetch_user(ticket.buyer_id).await?.ok_or(LedgerError::UserNotFound(ticket.buyer_id))?;
        info!("🎫️ Ticket [{}] admitted for '{}'", ticket.qr_code, event.title);
        Ok(CheckedInTicket { ticket, event: EventSummary::from(&event), holder: HolderSummary::from(&holder) })
    }

    /// Cancel a batch of the buyer's tickets. All-or-nothing: a single ineligible id rejects the whole request and
    /// changes nothing.
    pub async fn cancel_tickets(&self, buyer_id: i64, ticket_ids: &[i64]) -> Result<u64, TicketApiError> {
        let cancelled = TicketManagement::cancel_tickets(&self.db, buyer_id, ticket_ids).await?;
        info!("🎫️ Buyer #{buyer_id} cancelled {cancelled} tickets");
        Ok(cancelled)
    }

    /// Load everything needed to re-send the fulfilment email for one ticket.
    pub async fn ticket_for_resend(&self, ticket_id: i64) -> Result<ResendBundle, TicketApiError> {
        let ticket = self
            .db
            .fetch_ticket_by_id(ticket_id)
            .await?
            .ok_or_else(|| TicketApiError::TicketNotFound(ticket_id.to_string()))?;
        let order = self
            .db
            .fetch_order_by_reference(&ticket.order_id)
            .await?
            .ok_or_else(|| LedgerError::OrderNotFound(ticket.order_id.clone()))?;
        let event =
            self.db.fetch_event(ticket.event_id).await?.ok_or(LedgerError::EventNotFound(ticket.event_id))?;
        let buyer =
            self.db.fetch_user(ticket.buyer_id).await?.ok_or(LedgerError::UserNotFound(ticket.buyer_id))?;
        Ok(ResendBundle { ticket, order, event, buyer })
    }
}
