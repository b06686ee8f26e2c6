//! Route definitions for the ticket server.
//!
//! Handlers are generic over the storage backend (and the mailer, where one is needed), which is what lets the
//! endpoint tests drive them with mockall mocks. Actix cannot register generic handlers directly, so each one gets
//! a small concrete wrapper type via the `route!` macro; the server instantiates those wrappers with the production
//! types.
//!
//! Buyer identity arrives in the `x-user-id` header, placed there by the campus SSO proxy that fronts this service.
//! Requests without it are rejected with a 401 before any handler logic runs.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use fluxpay_tools::{FluxPayApi, WebhookPayload};
use log::*;
use ticket_engine::{
    db_types::OrderId,
    order_objects::NewOrderRequest,
    traits::VirtualAccountSnapshot,
    OrderFlowApi,
    TicketApi,
    TicketBackend,
    TicketingDatabase,
};

use crate::{
    config::ServerOptions,
    data_objects::{CancelTicketsParams, NewOrderParams, OrderCreatedResponse, VerifyPaymentParams, VerifyTicketParams},
    errors::ServerError,
    mailer::Mailer,
    reconciliation::handle_payment_event,
};

// Actix cannot handle generics in handlers, so the `route!` macro generates a concrete wrapper struct per handler
// with one type parameter per listed trait bound.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

/// Extract the buyer id the SSO proxy attached to the request.
fn buyer_id_from_headers(req: &HttpRequest) -> Result<i64, ServerError> {
    req.headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| ServerError::Unauthenticated("Missing or malformed x-user-id header".to_string()))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(new_order => Post "/orders" impl TicketingDatabase);
/// Route handler for order creation.
///
/// Prices the order from the event record, registers the buyer with the payment provider if this is their first
/// purchase, and mints a virtual account scoped to the order reference. The response carries the pending order and
/// the bank details the attendee must pay into.
pub async fn new_order<TTicketingDatabase>(
    req: HttpRequest,
    body: web::Json<NewOrderParams>,
    api: web::Data<OrderFlowApi<TTicketingDatabase>>,
    fluxpay: web::Data<FluxPayApi>,
) -> Result<HttpResponse, ServerError>
where
    TTicketingDatabase: TicketingDatabase,
{
    let buyer_id = buyer_id_from_headers(&req)?;
    let params = body.into_inner();
    trace!("💻️ New order request from buyer #{buyer_id} for event #{}", params.event_id);
    let buyer = api
        .db()
        .fetch_user(buyer_id)
        .await?
        .ok_or_else(|| ServerError::Unauthenticated(format!("No account for user #{buyer_id}")))?;
    let request = NewOrderRequest {
        buyer_id,
        event_id: params.event_id,
        ticket_type: params.ticket_type,
        quantity: params.quantity,
    };
    let (order, transaction) = api.create_order(request).await?;
    let customer_id = match &buyer.provider_customer_id {
        Some(id) => id.clone(),
        None => {
            let id = fluxpay.create_customer(&buyer.email, &buyer.display_name).await?;
            api.db().set_provider_customer_id(buyer.id, &id).await?;
            id
        },
    };
    let va = fluxpay.create_virtual_account(order.order_id.as_str(), order.total_price, &customer_id).await?;
    let snapshot = VirtualAccountSnapshot {
        account_number: va.account_number.clone(),
        bank: va.bank_name.clone(),
        expires_at: va.expires_at,
    };
    api.db().attach_virtual_account(&order.order_id, &snapshot).await?;
    info!("💻️📦️ Order [{}] created. Awaiting payment into {}", order.order_id, va.account_number);
    Ok(HttpResponse::Ok().json(OrderCreatedResponse { order, transaction, virtual_account: va }))
}

route!(get_order => Get "/orders/{order_id}" impl TicketingDatabase);
/// Fetch one of the caller's orders, with its issued tickets (if any).
pub async fn get_order<TTicketingDatabase>(
    req: HttpRequest,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<TTicketingDatabase>>,
) -> Result<HttpResponse, ServerError>
where
    TTicketingDatabase: TicketingDatabase,
{
    let buyer_id = buyer_id_from_headers(&req)?;
    let order_id = OrderId::from(path.into_inner());
    let order = api
        .fetch_order(&order_id)
        .await?
        .filter(|o| o.buyer_id == buyer_id)
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order [{order_id}]")))?;
    let tickets = api.fetch_tickets_for_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "order": order, "tickets": tickets })))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(payment_webhook => Post "/payment" impl TicketingDatabase, Mailer);
/// Route handler for FluxPay webhook notifications.
///
/// The HMAC middleware has already verified the signature over the raw body by the time this runs, so the bytes can
/// be trusted to have come from the provider. A body that does not parse as a charge notification is a 400; every
/// business outcome, including replays and mismatches, is a 200 so the provider stops retrying.
pub async fn payment_webhook<TTicketingDatabase, TMailer>(
    body: web::Bytes,
    api: web::Data<OrderFlowApi<TTicketingDatabase>>,
    mailer: web::Data<TMailer>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    TTicketingDatabase: TicketingDatabase,
    TMailer: Mailer,
{
    trace!("💻️ Received FluxPay webhook delivery");
    let raw_payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        warn!("💻️ Webhook body is not JSON: {e}");
        ServerError::CouldNotDeserializePayload
    })?;
    let payload: WebhookPayload = serde_json::from_value(raw_payload.clone()).map_err(|e| {
        warn!("💻️ Webhook body is not a charge notification: {e}");
        ServerError::CouldNotDeserializePayload
    })?;
    let response = handle_payment_event(&payload.data, &raw_payload, &api, mailer.get_ref(), &options).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(verify_payment => Post "/payments/verify" impl TicketingDatabase, Mailer);
/// Route handler for manual payment verification.
///
/// Lets a buyer who paid but never saw a confirmation poll the provider on demand. The poll result feeds the same
/// reconciliation path as a webhook delivery, so a verified payment completes the order identically.
pub async fn verify_payment<TTicketingDatabase, TMailer>(
    body: web::Json<VerifyPaymentParams>,
    api: web::Data<OrderFlowApi<TTicketingDatabase>>,
    fluxpay: web::Data<FluxPayApi>,
    mailer: web::Data<TMailer>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    TTicketingDatabase: TicketingDatabase,
    TMailer: Mailer,
{
    let params = body.into_inner();
    let charge = match (params.transaction_id, params.reference.as_deref()) {
        (Some(id), _) => fluxpay.verify_transaction(id).await?,
        (None, Some(reference)) => fluxpay.verify_transaction_by_reference(reference).await?,
        (None, None) => {
            return Err(ServerError::InvalidRequestBody(
                "Either transaction_id or reference is required".to_string(),
            ))
        },
    };
    debug!("💻️ Manual verification for [{}] returned status '{}'", charge.tx_ref, charge.status);
    let raw_payload = serde_json::to_value(&charge)
        .map_err(|e| ServerError::Unspecified(format!("Could not serialize charge data. {e}")))?;
    let response = handle_payment_event(&charge, &raw_payload, &api, mailer.get_ref(), &options).await?;
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Tickets  ----------------------------------------------------
route!(verify_ticket => Post "/tickets/verify" impl TicketBackend);
/// Route handler for gate check-in.
///
/// A valid unused ticket is atomically marked used and the holder's details are returned for the gate operator. A
/// used ticket is a 409 carrying the original ticket, so the operator can see who already went in.
pub async fn verify_ticket<TTicketBackend>(
    body: web::Json<VerifyTicketParams>,
    api: web::Data<TicketApi<TTicketBackend>>,
) -> Result<HttpResponse, ServerError>
where
    TTicketBackend: TicketBackend,
{
    let params = body.into_inner();
    trace!("💻️ Ticket verification request for '{}'", params.ticket_code);
    let admitted = api.verify_ticket(&params.ticket_code).await?;
    Ok(HttpResponse::Ok().json(admitted))
}

route!(cancel_tickets => Post "/tickets/cancel" impl TicketBackend);
/// Cancel a batch of the caller's tickets. All-or-nothing: one ineligible ticket rejects the whole batch.
pub async fn cancel_tickets<TTicketBackend>(
    req: HttpRequest,
    body: web::Json<CancelTicketsParams>,
    api: web::Data<TicketApi<TTicketBackend>>,
) -> Result<HttpResponse, ServerError>
where
    TTicketBackend: TicketBackend,
{
    let buyer_id = buyer_id_from_headers(&req)?;
    let params = body.into_inner();
    if params.ticket_ids.is_empty() {
        return Err(ServerError::InvalidRequestBody("No ticket ids supplied".to_string()));
    }
    let cancelled = api.cancel_tickets(buyer_id, &params.ticket_ids).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "cancelled": cancelled })))
}

route!(resend_ticket => Post "/tickets/{ticket_id}/resend" impl TicketBackend, Mailer);
/// Re-send the fulfilment email for one ticket. If the order was parked in `PaidFailedEmail`, a successful resend
/// recovers it to `Completed`.
pub async fn resend_ticket<TTicketBackend, TMailer>(
    req: HttpRequest,
    path: web::Path<i64>,
    tickets: web::Data<TicketApi<TTicketBackend>>,
    orders: web::Data<OrderFlowApi<TTicketBackend>>,
    mailer: web::Data<TMailer>,
) -> Result<HttpResponse, ServerError>
where
    TTicketBackend: TicketBackend,
    TMailer: Mailer,
{
    let buyer_id = buyer_id_from_headers(&req)?;
    let ticket_id = path.into_inner();
    let bundle = tickets.ticket_for_resend(ticket_id).await?;
    if bundle.buyer.id != buyer_id {
        return Err(ServerError::NoRecordFound(format!("Ticket #{ticket_id}")));
    }
    mailer.send_ticket_resend(&bundle.buyer, &bundle.event, &bundle.order, &bundle.ticket).await?;
    if bundle.order.status == ticket_engine::db_types::OrderStatusType::PaidFailedEmail {
        orders.mark_email_recovered(&bundle.order.order_id).await?;
    }
    info!("💻️🎫️ Ticket #{ticket_id} re-sent to {}", bundle.buyer.email);
    Ok(HttpResponse::Ok().json(crate::data_objects::JsonResponse::success(format!(
        "Ticket #{ticket_id} re-sent"
    ))))
}
