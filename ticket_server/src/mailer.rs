//! The outbound email seam.
//!
//! Actual delivery (SMTP relay, templating, PDF ticket rendering) is operated outside this service. The server only
//! decides *what* must be sent and *when*; the [`Mailer`] trait is that decision's boundary. [`LogMailer`] is the
//! bundled implementation, which logs every would-be delivery so a development instance is fully traceable without
//! a mail relay.
//!
//! Email failure is never allowed to roll back the ledger: a confirmed payment with an undeliverable email parks
//! the order in `PaidFailedEmail`, and the resend endpoint recovers it later.
use log::*;
use thiserror::Error;
use ticket_engine::db_types::{Event, Order, Ticket, User};

#[derive(Debug, Clone, Error)]
#[error("Could not send email. {0}")]
pub struct MailerError(pub String);

#[allow(async_fn_in_trait)]
pub trait Mailer {
    /// Payment confirmed. Sent with the first ticket's QR payload so single-ticket buyers get everything in one
    /// mail.
    async fn send_payment_confirmation(
        &self,
        buyer: &User,
        event: &Event,
        order: &Order,
        ticket: &Ticket,
    ) -> Result<(), MailerError>;

    /// The consolidated bundle for multi-ticket orders, one QR payload per seat.
    async fn send_ticket_bundle(
        &self,
        buyer: &User,
        event: &Event,
        order: &Order,
        tickets: &[Ticket],
    ) -> Result<(), MailerError>;

    /// Payment failed or was cancelled. Carries a link the buyer can follow to retry checkout.
    async fn send_payment_failed(
        &self,
        buyer: &User,
        order: &Order,
        reason: &str,
        retry_url: &str,
    ) -> Result<(), MailerError>;

    /// Re-delivery of a single ticket, requested through the resend endpoint.
    async fn send_ticket_resend(
        &self,
        buyer: &User,
        event: &Event,
        order: &Order,
        ticket: &Ticket,
    ) -> Result<(), MailerError>;

    /// Operator alert: orphaned payments, amount mismatches, issuance failures. These are never auto-resolved.
    async fn send_admin_alert(&self, recipients: &[String], subject: &str, body: &str) -> Result<(), MailerError>;
}

/// Logs every delivery instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send_payment_confirmation(
        &self,
        buyer: &User,
        event: &Event,
        order: &Order,
        ticket: &Ticket,
    ) -> Result<(), MailerError> {
        info!(
            "📧️ To {}: payment of {} confirmed for '{}', order [{}]. First ticket QR: {}",
            buyer.email, order.total_price, event.title, order.order_id, ticket.qr_code
        );
        Ok(())
    }

    async fn send_ticket_bundle(
        &self,
        buyer: &User,
        event: &Event,
        order: &Order,
        tickets: &[Ticket],
    ) -> Result<(), MailerError> {
        let codes = tickets.iter().map(|t| t.qr_code.as_str()).collect::<Vec<_>>().join(", ");
        info!(
            "📧️ To {}: your {} tickets for '{}' (order [{}]): {codes}",
            buyer.email,
            tickets.len(),
            event.title,
            order.order_id
        );
        Ok(())
    }

    async fn send_payment_failed(
        &self,
        buyer: &User,
        order: &Order,
        reason: &str,
        retry_url: &str,
    ) -> Result<(), MailerError> {
        info!(
            "📧️ To {}: payment for order [{}] failed ({reason}). Retry at {retry_url}",
            buyer.email, order.order_id
        );
        Ok(())
    }

    async fn send_ticket_resend(
        &self,
        buyer: &User,
        event: &Event,
        order: &Order,
        ticket: &Ticket,
    ) -> Result<(), MailerError> {
        info!(
            "📧️ To {}: re-sending ticket [{}] for '{}', order [{}]",
            buyer.email, ticket.qr_code, event.title, order.order_id
        );
        Ok(())
    }

    async fn send_admin_alert(&self, recipients: &[String], subject: &str, body: &str) -> Result<(), MailerError> {
        warn!("📧️🚨️ Operator alert to {recipients:?}: {subject}. {body}");
        Ok(())
    }
}
