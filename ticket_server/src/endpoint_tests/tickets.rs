use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use ticket_engine::{
    db_types::{OrderStatusType, Ticket},
    OrderFlowApi,
    TicketApi,
};

use super::{
    helpers::{buyer_fixture, event_fixture, order_fixture, send_request, ticket_fixture},
    mocks::{MockBackend, MockTestMailer},
};
use crate::routes::{CancelTicketsRoute, ResendTicketRoute, VerifyTicketRoute};

fn ticket_app(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = TicketApi::new(backend);
        cfg.service(VerifyTicketRoute::<MockBackend>::new())
            .service(CancelTicketsRoute::<MockBackend>::new())
            .app_data(web::Data::new(api));
    }
}

fn verify_request(code: &str) -> TestRequest {
    TestRequest::post().uri("/tickets/verify").set_json(serde_json::json!({ "ticket_code": code }))
}

#[actix_web::test]
async fn scanning_an_unused_ticket_admits_the_holder() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_ticket_by_code()
        .withf(|code| code == "TIX-0123456789ab-1")
        .returning(|_| Ok(Some(ticket_fixture(1, false))));
    backend.expect_use_ticket().times(1).returning(|_| Ok(Some(ticket_fixture(1, true))));
    backend.expect_fetch_event().returning(|_| Ok(Some(event_fixture())));
    backend.expect_fetch_user().returning(|_| Ok(Some(buyer_fixture())));

    let (status, body) = send_request(verify_request("TIX-0123456789ab-1"), ticket_app(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ada@students.unilag.edu.ng"), "unexpected body: {body}");
    assert!(body.contains("Engineering Dinner 2026"), "unexpected body: {body}");
}

#[actix_web::test]
async fn scanning_a_used_ticket_is_a_conflict_carrying_the_ticket() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_ticket_by_code().returning(|_| Ok(Some(ticket_fixture(1, true))));

    let (status, body) = send_request(verify_request("TIX-0123456789ab-1"), ticket_app(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    // The gate operator gets the full ticket record to see who went in already.
    assert!(body.contains(r#""qr_code":"TIX-0123456789ab-1""#), "unexpected body: {body}");
}

#[actix_web::test]
async fn scanning_an_unknown_code_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_ticket_by_code().returning(|_| Ok(None));

    let (status, _) = send_request(verify_request("garbage"), ticket_app(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn cancellation_requires_a_buyer_identity() {
    let _ = env_logger::try_init().ok();
    let backend = MockBackend::new();
    let req = TestRequest::post().uri("/tickets/cancel").set_json(serde_json::json!({ "ticket_ids": [1, 2] }));
    let (status, _) = send_request(req, ticket_app(backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn cancellation_rejects_an_empty_batch() {
    let _ = env_logger::try_init().ok();
    let backend = MockBackend::new();
    let req = TestRequest::post()
        .uri("/tickets/cancel")
        .insert_header(("x-user-id", "42"))
        .set_json(serde_json::json!({ "ticket_ids": [] }));
    let (status, _) = send_request(req, ticket_app(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn cancellation_reports_the_cancelled_count() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_cancel_tickets()
        .withf(|buyer_id, ids| *buyer_id == 42 && *ids == [1, 2])
        .times(1)
        .returning(|_, ids| Ok(ids.len() as u64));
    let req = TestRequest::post()
        .uri("/tickets/cancel")
        .insert_header(("x-user-id", "42"))
        .set_json(serde_json::json!({ "ticket_ids": [1, 2] }));
    let (status, body) = send_request(req, ticket_app(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""cancelled":2"#), "unexpected body: {body}");
}

fn resend_app(backend: MockBackend, mailer: MockTestMailer) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let tickets_api = TicketApi::new(backend.clone());
        let orders_api = OrderFlowApi::new(backend);
        cfg.service(ResendTicketRoute::<MockBackend, MockTestMailer>::new())
            .app_data(web::Data::new(tickets_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(mailer));
    }
}

#[actix_web::test]
async fn resend_recovers_an_email_parked_order() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    let mut second = MockBackend::new();
    second.expect_fetch_ticket_by_id().returning(|_| Ok(Some(ticket_fixture(1, false))));
    second
        .expect_fetch_order_by_reference()
        .returning(|_| Ok(Some(order_fixture(OrderStatusType::PaidFailedEmail))));
    second.expect_fetch_event().returning(|_| Ok(Some(event_fixture())));
    second.expect_fetch_user().returning(|_| Ok(Some(buyer_fixture())));
    // The recovery transition lands on the orders API's copy of the backend.
    backend
        .expect_update_order_status()
        .withf(|_, status, _| *status == OrderStatusType::Completed)
        .times(1)
        .returning(|_, _, _| Ok(Some(order_fixture(OrderStatusType::Completed))));
    backend.expect_clone().return_once(move || second);
    let mut mailer = MockTestMailer::new();
    mailer
        .expect_send_ticket_resend()
        .withf(|buyer, _, _, ticket: &Ticket| buyer.id == 42 && ticket.id == 1)
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let req = TestRequest::post().uri("/tickets/1/resend").insert_header(("x-user-id", "42"));
    let (status, body) = send_request(req, resend_app(backend, mailer)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("re-sent"), "unexpected body: {body}");
}

#[actix_web::test]
async fn resend_hides_other_buyers_tickets() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    let mut second = MockBackend::new();
    second.expect_fetch_ticket_by_id().returning(|_| Ok(Some(ticket_fixture(1, false))));
    second
        .expect_fetch_order_by_reference()
        .returning(|_| Ok(Some(order_fixture(OrderStatusType::Completed))));
    second.expect_fetch_event().returning(|_| Ok(Some(event_fixture())));
    second.expect_fetch_user().returning(|_| Ok(Some(buyer_fixture())));
    backend.expect_clone().return_once(move || second);
    let mailer = MockTestMailer::new();

    let req = TestRequest::post().uri("/tickets/1/resend").insert_header(("x-user-id", "777"));
    let (status, _) = send_request(req, resend_app(backend, mailer)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
