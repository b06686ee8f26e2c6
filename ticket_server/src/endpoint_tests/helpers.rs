use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
    ResponseError,
};
use chrono::{TimeZone, Utc};
use ticket_engine::db_types::{Event, EventStatus, Order, OrderId, OrderStatusType, Ticket, Transaction, TransactionStatus, User};
use tix_common::Naira;

use crate::config::ServerOptions;

pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";

pub fn test_options() -> ServerOptions {
    ServerOptions {
        platform_fee_bps: 500,
        frontend_url: "https://tickets.unilag.edu.ng".to_string(),
        admin_emails: vec!["ops@unilag.edu.ng".to_string()],
    }
}

/// Fire one request at an app built from `configure` and return the response status and body. Handler and
/// middleware errors are rendered through their `ResponseError` impls, same as in production.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
            (status, body.unwrap_or_default())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
            (status, body.unwrap_or_default())
        },
    }
}

//----------------------------------------------   Fixtures  ----------------------------------------------------

pub fn order_fixture(status: OrderStatusType) -> Order {
    let ts = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
    Order {
        id: 1,
        order_id: OrderId("TIX-0123456789ab".into()),
        buyer_id: 42,
        event_id: 7,
        tier_name: Some("VIP".into()),
        tier_description: Some("Front row".into()),
        tier_price: Some(Naira::from(1_000_000)),
        quantity: 2,
        total_price: Naira::from(2_000_000),
        status,
        payment_ref: None,
        paid_at: None,
        failure_reason: None,
        created_at: ts,
        updated_at: ts,
    }
}

pub fn transaction_fixture(status: TransactionStatus) -> Transaction {
    let ts = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
    Transaction {
        id: 1,
        order_id: OrderId("TIX-0123456789ab".into()),
        payer_id: 42,
        reference: OrderId("TIX-0123456789ab".into()),
        provider_tx_id: Some(990_011),
        amount: Naira::from(2_000_000),
        currency: "NGN".into(),
        payment_method: "virtual_account".into(),
        status,
        va_account_number: Some("9301234567".into()),
        va_bank: Some("Wema Bank".into()),
        va_expires_at: None,
        metadata: None,
        initiated_at: ts,
        completed_at: None,
        failed_at: None,
    }
}

pub fn event_fixture() -> Event {
    let ts = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
    Event {
        id: 7,
        organizer_id: 3,
        title: "Engineering Dinner 2026".into(),
        venue: "Multipurpose Hall".into(),
        capacity: 500,
        price: None,
        status: EventStatus::Published,
        publish_at: None,
        starts_at: Utc.with_ymd_and_hms(2026, 4, 18, 18, 0, 0).unwrap(),
        created_at: ts,
        updated_at: ts,
    }
}

pub fn buyer_fixture() -> User {
    let ts = Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap();
    User {
        id: 42,
        email: "ada@students.unilag.edu.ng".into(),
        display_name: "Ada Obi".into(),
        available_balance: Naira::from(0),
        total_earnings: Naira::from(0),
        provider_customer_id: Some("cus_8842".into()),
        created_at: ts,
        updated_at: ts,
    }
}

pub fn ticket_fixture(id: i64, used: bool) -> Ticket {
    Ticket {
        id,
        event_id: 7,
        buyer_id: 42,
        order_id: OrderId("TIX-0123456789ab".into()),
        tier_name: Some("VIP".into()),
        price_paid: Naira::from(1_000_000),
        seat_label: format!("{id} of 2"),
        qr_code: format!("TIX-0123456789ab-{id}"),
        used,
        cancelled_at: None,
        purchased_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 1, 0).unwrap(),
    }
}
