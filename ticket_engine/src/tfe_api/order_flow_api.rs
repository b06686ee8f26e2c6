use std::fmt::Debug;

use chrono::Duration;
use log::*;
use tix_common::Naira;

use crate::{
    db_types::{Event, NewOrder, NewTicket, Order, OrderId, OrderStatusType, Ticket, Transaction, TransactionStatus},
    helpers::{new_order_id, organizer_credit, qr_payload, AMOUNT_TOLERANCE},
    tfe_api::{
        errors::OrderFlowError,
        order_objects::{NewOrderRequest, SettledOrder, SettlementOutcome},
    },
    traits::{LedgerError, TicketingDatabase},
};

/// `OrderFlowApi` is the primary API for the order ledger and the payment reconciliation flows. Webhook deliveries,
/// manual verification requests and the stale-order sweep all funnel into [`Self::record_payment_success`] and
/// [`Self::record_payment_failure`]; the conditional storage transitions underneath make that funnel safe to enter
/// from several directions at once.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: TicketingDatabase
{
    /// Create a new pending order, with pricing resolved from the event record.
    ///
    /// This is the sole place in the system where a price is computed. The selected tier (or the event's flat
    /// price) is snapshotted onto the order, so later edits to the event never change what this buyer owes. The
    /// pending transaction that shadows the order is created atomically with it, with the order id as the
    /// provider-facing reference.
    pub async fn create_order(&self, req: NewOrderRequest) -> Result<(Order, Transaction), OrderFlowError> {
        if req.quantity < 1 {
            return Err(OrderFlowError::InvalidQuantity(req.quantity));
        }
        let event =
            self.db.fetch_event(req.event_id).await?.ok_or(LedgerError::EventNotFound(req.event_id))?;
        let tier = match &req.ticket_type {
            Some(name) => Some(self.db.fetch_ticket_type(event.id, name).await?.ok_or_else(|| {
                LedgerError::TicketTypeNotFound { event_id: event.id, name: name.clone() }
            })?),
            None => None,
        };
        let unit_price = match (&tier, event.price) {
            (Some(t), _) => t.price,
            (None, Some(p)) => p,
            (None, None) => return Err(OrderFlowError::UnpricedEvent(event.id)),
        };
        let total_price = unit_price * req.quantity;
        let new_order = NewOrder {
            order_id: new_order_id(),
            buyer_id: req.buyer_id,
            event_id: event.id,
            tier_name: tier.as_ref().map(|t| t.name.clone()),
            tier_description: tier.as_ref().map(|t| t.description.clone()),
            tier_price: tier.as_ref().map(|t| t.price),
            quantity: req.quantity,
            total_price,
        };
        let (order, pending) = self.db.insert_order(new_order).await?;
        debug!(
            "🔄️📦️ Order [{}] created for buyer #{} ({} × {unit_price} = {total_price})",
            order.order_id, order.buyer_id, order.quantity
        );
        Ok((order, pending))
    }

    /// Apply a payment-success notification (webhook delivery or poll result) to the ledger.
    ///
    /// Every observation is appended to the transaction log first, replays and mismatches included. The decision
    /// table:
    /// * no order for the reference → [`SettlementOutcome::OrderNotFound`] (the caller alerts an operator),
    /// * order already paid → [`SettlementOutcome::AlreadyCompleted`] (strict no-op),
    /// * amount off by more than [`AMOUNT_TOLERANCE`] → [`SettlementOutcome::AmountMismatch`] (no state change),
    /// * otherwise the conditional completion runs; losing the race to a concurrent delivery downgrades the
    ///   outcome to `AlreadyCompleted`.
    pub async fn record_payment_success(
        &self,
        reference: &OrderId,
        amount: Naira,
        provider_tx_id: Option<i64>,
        raw_payload: &serde_json::Value,
    ) -> Result<SettlementOutcome, OrderFlowError> {
        let Some(order) = self.db.fetch_order_by_reference(reference).await? else {
            warn!("🔄️💰️ Payment success reported for unknown reference [{reference}]");
            return Ok(SettlementOutcome::OrderNotFound { reference: reference.clone() });
        };
        self.db.record_transaction_event(reference, amount, "successful", raw_payload).await?;
        if order.status.is_paid() {
            debug!("🔄️💰️ Replayed payment notification for [{reference}]. Ignoring.");
            return Ok(SettlementOutcome::AlreadyCompleted(order));
        }
        if amount.abs_diff(order.total_price) > AMOUNT_TOLERANCE {
            warn!(
                "🔄️💰️ Amount mismatch on [{reference}]: expected {}, provider reported {amount}",
                order.total_price
            );
            return Ok(SettlementOutcome::AmountMismatch { expected: order.total_price, received: amount, order });
        }
        let payment_ref = provider_tx_id.map(|id| id.to_string()).unwrap_or_else(|| reference.to_string());
        let Some(completed) = self.db.complete_order(reference, &payment_ref).await? else {
            // A concurrent delivery won the conditional update between our read and our write.
            debug!("🔄️💰️ Order [{reference}] was completed by a concurrent delivery. Ignoring.");
            let order = self
                .db
                .fetch_order_by_reference(reference)
                .await?
                .ok_or_else(|| LedgerError::OrderNotFound(reference.clone()))?;
            return Ok(SettlementOutcome::AlreadyCompleted(order));
        };
        let transaction =
            match self.db.transition_transaction(reference, TransactionStatus::Successful, provider_tx_id).await? {
                Some(tx) => tx,
                // The transaction row reached a terminal status out of band; the order completion stands.
                None => self
                    .db
                    .fetch_transaction_by_reference(reference)
                    .await?
                    .ok_or_else(|| LedgerError::TransactionNotFound(reference.clone()))?,
            };
        info!("🔄️💰️ Order [{reference}] settled for {amount}");
        Ok(SettlementOutcome::Completed(SettledOrder { order: completed, transaction }))
    }

    /// Issue the admission tickets for a completed order: one per seat, QR payloads `"{order_id}-{n}"` for
    /// `n = 1..=quantity`, all inserted in one storage transaction. Event and buyer are loaded first so a missing
    /// record fails before anything is written.
    pub async fn issue_tickets(&self, order: &Order) -> Result<Vec<Ticket>, OrderFlowError> {
        let event =
            self.db.fetch_event(order.event_id).await?.ok_or(LedgerError::EventNotFound(order.event_id))?;
        let buyer =
            self.db.fetch_user(order.buyer_id).await?.ok_or(LedgerError::UserNotFound(order.buyer_id))?;
        let unit_price = order.unit_price();
        let new_tickets = (1..=order.quantity)
            .map(|n| NewTicket {
                event_id: event.id,
                buyer_id: buyer.id,
                order_id: order.order_id.clone(),
                tier_name: order.tier_name.clone(),
                price_paid: unit_price,
                seat_label: format!("{n} of {}", order.quantity),
                qr_code: qr_payload(&order.order_id, n),
            })
            .collect::<Vec<_>>();
        let tickets = self.db.insert_tickets(new_tickets).await?;
        info!("🔄️🎫️ Issued {} tickets for order [{}] ({})", tickets.len(), order.order_id, event.title);
        Ok(tickets)
    }

    /// Credit the organizer with the settled amount less the platform fee. Returns the credited amount.
    pub async fn settle_organizer_balance(
        &self,
        order: &Order,
        amount: Naira,
        fee_bps: u32,
    ) -> Result<Naira, OrderFlowError> {
        let event =
            self.db.fetch_event(order.event_id).await?.ok_or(LedgerError::EventNotFound(order.event_id))?;
        let credit = organizer_credit(amount, fee_bps);
        self.db.credit_organizer(event.organizer_id, credit).await?;
        info!(
            "🔄️💰️ Credited {credit} to organizer #{} for order [{}] ({amount} less {fee_bps}bps fee)",
            event.organizer_id, order.order_id
        );
        Ok(credit)
    }

    /// Apply a payment-failure notification. The observation is appended to the transaction log first, exactly as
    /// the success path appends its own. An unknown reference is tolerated (the provider may report failures for
    /// attempts we never completed creating); a known order and its transaction are marked `Failed` with the
    /// provider's response text.
    pub async fn record_payment_failure(
        &self,
        reference: &OrderId,
        amount: Naira,
        reason: &str,
        raw_payload: &serde_json::Value,
    ) -> Result<Option<Order>, OrderFlowError> {
        match self.db.record_transaction_event(reference, amount, "failed", raw_payload).await {
            Ok(()) => {},
            Err(LedgerError::TransactionNotFound(_)) => {
                debug!("🔄️❌️ No transaction to log the failed attempt against for [{reference}]");
            },
            Err(e) => return Err(e.into()),
        }
        let order = self.db.update_order_status(reference, OrderStatusType::Failed, Some(reason)).await?;
        match &order {
            Some(o) => info!("🔄️❌️ Order [{}] marked failed: {reason}", o.order_id),
            None => debug!("🔄️❌️ Payment failure reported for unknown reference [{reference}]: {reason}"),
        }
        self.db.transition_transaction(reference, TransactionStatus::Failed, None).await?;
        Ok(order)
    }

    /// Payment is in the bank but ticket issuance failed. The order is parked for operator intervention; it never
    /// returns to `Pending`, so replayed webhooks cannot re-trigger issuance.
    pub async fn mark_ticketing_failed(&self, reference: &OrderId, reason: &str) -> Result<(), OrderFlowError> {
        self.db.update_order_status(reference, OrderStatusType::PaidFailedTicketing, Some(reason)).await?;
        error!("🔄️🎫️ Ticket issuance failed for paid order [{reference}]: {reason}");
        Ok(())
    }

    /// Tickets exist but the fulfilment email could not be sent. A later successful resend recovers the order via
    /// [`Self::mark_email_recovered`].
    pub async fn mark_email_failed(&self, reference: &OrderId, reason: &str) -> Result<(), OrderFlowError> {
        self.db.update_order_status(reference, OrderStatusType::PaidFailedEmail, Some(reason)).await?;
        warn!("🔄️📧️ Fulfilment email failed for order [{reference}]: {reason}");
        Ok(())
    }

    pub async fn mark_email_recovered(&self, reference: &OrderId) -> Result<(), OrderFlowError> {
        self.db.update_order_status(reference, OrderStatusType::Completed, None).await?;
        info!("🔄️📧️ Fulfilment email for order [{reference}] delivered on retry");
        Ok(())
    }

    /// Mark an abandoned pending order as expired.
    pub async fn expire_order(&self, reference: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        let order = self
            .db
            .update_order_status(reference, OrderStatusType::Expired, Some("retention window elapsed"))
            .await?;
        if order.is_some() {
            info!("🔄️⏲️ Order [{reference}] expired");
        }
        Ok(order)
    }

    /// Pending orders due for a reconciliation poll: older than `grace`, younger than `retention`.
    pub async fn stale_pending_orders(
        &self,
        grace: Duration,
        retention: Duration,
    ) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_stale_pending_orders(grace, retention).await?;
        Ok(orders)
    }

    /// Flip Draft events whose scheduled publish time has elapsed. Returns the newly published events.
    pub async fn publish_due_events(&self) -> Result<Vec<Event>, OrderFlowError> {
        let events = self.db.publish_due_events().await?;
        Ok(events)
    }

    pub async fn fetch_order(&self, reference: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        let order = self.db.fetch_order_by_reference(reference).await?;
        Ok(order)
    }

    pub async fn fetch_tickets_for_order(&self, reference: &OrderId) -> Result<Vec<Ticket>, OrderFlowError> {
        let tickets = self.db.fetch_tickets_for_order(reference).await?;
        Ok(tickets)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
