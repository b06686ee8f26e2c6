//! The payment reconciliation controller.
//!
//! Everything that can tell us about a payment funnels into [`handle_payment_event`]: webhook deliveries, manual
//! verification requests, and the pending-order sweep. All three therefore share one decision table, and the
//! idempotence guarantees live in the engine's conditional storage transitions rather than in each entry point.
//!
//! The success path runs a chain of side effects after the ledger transition commits: ticket issuance, organizer
//! settlement, and the buyer's fulfilment email. Each step is best-effort *after* the money is recorded: a failure
//! parks the order in the matching `PaidFailed*` status (or is merely logged, for settlement) but never reverses
//! the completion. Tickets and money never disagree silently; an operator alert goes out for anything that needs a
//! human.
use fluxpay_tools::{ChargeData, ChargeStatus};
use log::*;
use ticket_engine::{
    db_types::{Order, OrderId},
    order_objects::{SettledOrder, SettlementOutcome},
    OrderFlowApi,
    TicketingDatabase,
};
use tix_common::Naira;

use crate::{config::ServerOptions, data_objects::JsonResponse, errors::ServerError, mailer::Mailer};

/// Apply one charge notification to the system. Returns the response body for the caller to serialize; business
/// outcomes that intentionally change nothing (replays, unknown statuses) are reported as success so the provider
/// stops retrying.
pub async fn handle_payment_event<B, M>(
    charge: &ChargeData,
    raw_payload: &serde_json::Value,
    api: &OrderFlowApi<B>,
    mailer: &M,
    options: &ServerOptions,
) -> Result<JsonResponse, ServerError>
where
    B: TicketingDatabase,
    M: Mailer,
{
    let reference = OrderId::from(charge.tx_ref.clone());
    match &charge.status {
        ChargeStatus::Successful => handle_successful_charge(&reference, charge, raw_payload, api, mailer, options).await,
        ChargeStatus::Failed | ChargeStatus::Cancelled => {
            let reason = charge.processor_response.clone().unwrap_or_else(|| charge.status.to_string());
            handle_failed_charge(&reference, charge, &reason, raw_payload, api, mailer, options).await
        },
        ChargeStatus::Pending => {
            debug!("🛎️ Charge for [{reference}] is still pending at the provider. Nothing to do.");
            Ok(JsonResponse::success("Charge still pending"))
        },
        ChargeStatus::Other(s) => {
            warn!("🛎️ Unrecognised charge status '{s}' for [{reference}]. Ignoring.");
            Ok(JsonResponse::success(format!("Unrecognised status '{s}' ignored")))
        },
    }
}

async fn handle_successful_charge<B, M>(
    reference: &OrderId,
    charge: &ChargeData,
    raw_payload: &serde_json::Value,
    api: &OrderFlowApi<B>,
    mailer: &M,
    options: &ServerOptions,
) -> Result<JsonResponse, ServerError>
where
    B: TicketingDatabase,
    M: Mailer,
{
    let amount = charge.amount_kobo();
    let outcome = api.record_payment_success(reference, amount, charge.id, raw_payload).await?;
    match outcome {
        SettlementOutcome::OrderNotFound { reference } => {
            let subject = format!("Payment received for unknown order reference [{reference}]");
            let body = format!(
                "The provider reported a successful charge of {amount} against reference [{reference}], but no \
                 order carries that reference. The money is real; the order is not. Manual investigation required."
            );
            alert_operators(mailer, options, &subject, &body).await;
            Ok(JsonResponse::failure(format!("No order found for reference [{reference}]")))
        },
        SettlementOutcome::AlreadyCompleted(order) => {
            Ok(JsonResponse::success(format!("Order [{}] already processed", order.order_id)))
        },
        SettlementOutcome::AmountMismatch { order, expected, received } => {
            let subject = format!("Amount mismatch on order [{}]", order.order_id);
            let body = format!(
                "The provider reported {received} for order [{}], which expects {expected}. The order has been left \
                 pending and nothing was issued. Manual investigation required.",
                order.order_id
            );
            alert_operators(mailer, options, &subject, &body).await;
            Ok(JsonResponse::failure(format!("Amount mismatch on order [{}] recorded", order.order_id)))
        },
        SettlementOutcome::Completed(settled) => {
            fulfil_order(&settled, amount, api, mailer, options).await;
            Ok(JsonResponse::success(format!("Order [{}] completed", settled.order.order_id)))
        },
    }
}

/// The post-completion side effect chain. Never returns an error: the ledger transition has already committed, so
/// every failure here is absorbed into a `PaidFailed*` status or an operator alert instead.
async fn fulfil_order<B, M>(
    settled: &SettledOrder,
    amount: Naira,
    api: &OrderFlowApi<B>,
    mailer: &M,
    options: &ServerOptions,
) where
    B: TicketingDatabase,
    M: Mailer,
{
    let order = &settled.order;
    let tickets = match api.issue_tickets(order).await {
        Ok(t) => t,
        Err(e) => {
            if let Err(e2) = api.mark_ticketing_failed(&order.order_id, &e.to_string()).await {
                error!("🛎️ Could not park order [{}] after issuance failure: {e2}", order.order_id);
            }
            let subject = format!("Ticket issuance failed for paid order [{}]", order.order_id);
            let body = format!(
                "Payment for order [{}] is confirmed, but ticket issuance failed: {e}. The order is parked in \
                 PaidFailedTicketing and needs an operator.",
                order.order_id
            );
            alert_operators(mailer, options, &subject, &body).await;
            return;
        },
    };

    // The organizer is credited what the provider actually collected, not the order total; within the amount
    // tolerance the two may differ by a few kobo. Settlement failure is logged only: the money is safe in the
    // transaction log and a missed increment is recoverable from it.
    if let Err(e) = api.settle_organizer_balance(order, amount, options.platform_fee_bps).await {
        error!("🛎️ Could not credit organizer for order [{}]: {e}", order.order_id);
    }

    send_fulfilment_email(order, &tickets, api, mailer).await;
}

async fn send_fulfilment_email<B, M>(
    order: &Order,
    tickets: &[ticket_engine::db_types::Ticket],
    api: &OrderFlowApi<B>,
    mailer: &M,
) where
    B: TicketingDatabase,
    M: Mailer,
{
    let context = async {
        let buyer = api
            .db()
            .fetch_user(order.buyer_id)
            .await?
            .ok_or_else(|| ticket_engine::LedgerError::UserNotFound(order.buyer_id))?;
        let event = api
            .db()
            .fetch_event(order.event_id)
            .await?
            .ok_or_else(|| ticket_engine::LedgerError::EventNotFound(order.event_id))?;
        Ok::<_, ticket_engine::LedgerError>((buyer, event))
    };
    let (buyer, event) = match context.await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("🛎️ Could not load email context for order [{}]: {e}", order.order_id);
            return;
        },
    };
    let result = match tickets {
        [] => {
            error!("🛎️ Order [{}] completed with zero tickets. This should be impossible.", order.order_id);
            return;
        },
        [only] => mailer.send_payment_confirmation(&buyer, &event, order, only).await,
        [first, ..] => {
            let confirmation = mailer.send_payment_confirmation(&buyer, &event, order, first).await;
            match confirmation {
                Ok(()) => mailer.send_ticket_bundle(&buyer, &event, order, tickets).await,
                err => err,
            }
        },
    };
    if let Err(e) = result {
        warn!("🛎️ Fulfilment email for order [{}] failed: {e}", order.order_id);
        if let Err(e2) = api.mark_email_failed(&order.order_id, &e.to_string()).await {
            error!("🛎️ Could not park order [{}] after email failure: {e2}", order.order_id);
        }
    }
}

async fn handle_failed_charge<B, M>(
    reference: &OrderId,
    charge: &ChargeData,
    reason: &str,
    raw_payload: &serde_json::Value,
    api: &OrderFlowApi<B>,
    mailer: &M,
    options: &ServerOptions,
) -> Result<JsonResponse, ServerError>
where
    B: TicketingDatabase,
    M: Mailer,
{
    let order = api.record_payment_failure(reference, charge.amount_kobo(), reason, raw_payload).await?;
    let Some(order) = order else {
        // Failures for references we never finished creating are tolerated without an alert.
        return Ok(JsonResponse::success(format!("Failure for unknown reference [{reference}] noted")));
    };
    let retry_url = format!("{}/orders/{}/retry", options.frontend_url, order.order_id);
    match api.db().fetch_user(order.buyer_id).await {
        Ok(Some(buyer)) => {
            if let Err(e) = mailer.send_payment_failed(&buyer, &order, reason, &retry_url).await {
                warn!("🛎️ Could not send failure notice for order [{}]: {e}", order.order_id);
            }
        },
        Ok(None) => warn!("🛎️ Buyer #{} for failed order [{}] not found", order.buyer_id, order.order_id),
        Err(e) => error!("🛎️ Could not load buyer for failed order [{}]: {e}", order.order_id),
    }
    Ok(JsonResponse::success(format!("Order [{}] marked failed", order.order_id)))
}

async fn alert_operators<M: Mailer>(mailer: &M, options: &ServerOptions, subject: &str, body: &str) {
    if let Err(e) = mailer.send_admin_alert(&options.admin_emails, subject, body).await {
        error!("🛎️🚨️ Could not deliver operator alert '{subject}': {e}");
    }
}
