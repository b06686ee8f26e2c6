//! The pending-order sweep.
//!
//! Webhooks get lost. Once a minute this worker polls the provider for every pending order that is old enough for
//! its webhook to have plausibly gone missing, and feeds each poll result through the same reconciliation path a
//! webhook delivery would take. Orders past the retention window are expired instead. The worker also flips Draft
//! events whose scheduled publish time has arrived.
use chrono::Duration;
use fluxpay_tools::FluxPayApi;
use log::*;
use ticket_engine::{OrderFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::{config::ServerOptions, mailer::LogMailer, reconciliation::handle_payment_event};

const SWEEP_INTERVAL_SECS: u64 = 60;

/// Orders older than this are expired without a final poll. Effectively "forever"; expiry is driven by the
/// retention window, this just bounds the query.
const EXPIRY_HORIZON_DAYS: i64 = 3650;

pub fn start_sweep_worker(
    db: SqliteDatabase,
    fluxpay: FluxPayApi,
    mailer: LogMailer,
    options: ServerOptions,
    grace: Duration,
    retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api = OrderFlowApi::new(db);
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("🕰️ Sweep worker started. Grace: {grace}, retention: {retention}");
        loop {
            interval.tick().await;
            run_sweep(&api, &fluxpay, &mailer, &options, grace, retention).await;
        }
    })
}

async fn run_sweep(
    api: &OrderFlowApi<SqliteDatabase>,
    fluxpay: &FluxPayApi,
    mailer: &LogMailer,
    options: &ServerOptions,
    grace: Duration,
    retention: Duration,
) {
    trace!("🕰️ Sweep tick");
    match api.publish_due_events().await {
        Ok(events) if !events.is_empty() => {
            for event in &events {
                info!("🕰️📣️ Event #{} ('{}') published on schedule", event.id, event.title);
            }
        },
        Ok(_) => {},
        Err(e) => error!("🕰️ Could not publish due events: {e}"),
    }

    let stale = match api.stale_pending_orders(grace, retention).await {
        Ok(orders) => orders,
        Err(e) => {
            error!("🕰️ Could not fetch stale pending orders: {e}");
            return;
        },
    };
    if !stale.is_empty() {
        debug!("🕰️ Polling the provider for {} stale pending orders", stale.len());
    }
    for order in &stale {
        let charge = match fluxpay.verify_transaction_by_reference(order.order_id.as_str()).await {
            Ok(charge) => charge,
            Err(e) if e.is_transient() => {
                debug!("🕰️ Poll for order [{}] hit a transient error, will retry next tick: {e}", order.order_id);
                continue;
            },
            Err(e) => {
                warn!("🕰️ Poll for order [{}] failed: {e}", order.order_id);
                continue;
            },
        };
        let raw_payload = match serde_json::to_value(&charge) {
            Ok(v) => v,
            Err(e) => {
                error!("🕰️ Could not serialize poll result for [{}]: {e}", order.order_id);
                continue;
            },
        };
        match handle_payment_event(&charge, &raw_payload, api, mailer, options).await {
            Ok(response) => debug!("🕰️ Sweep reconciled order [{}]: {}", order.order_id, response.message),
            Err(e) => error!("🕰️ Sweep reconciliation failed for order [{}]: {e}", order.order_id),
        }
    }

    // Anything still pending past the retention window will never be paid. Expire it.
    let abandoned = match api.stale_pending_orders(retention, Duration::days(EXPIRY_HORIZON_DAYS)).await {
        Ok(orders) => orders,
        Err(e) => {
            error!("🕰️ Could not fetch abandoned orders: {e}");
            return;
        },
    };
    for order in &abandoned {
        if let Err(e) = api.expire_order(&order.order_id).await {
            error!("🕰️ Could not expire order [{}]: {e}", order.order_id);
        }
    }
}
