use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use fluxpay_tools::{sign_payload, WEBHOOK_SIGNATURE_HEADER};
use ticket_engine::{
    db_types::{OrderStatusType, TransactionStatus},
    OrderFlowApi,
};
use tix_common::{Naira, Secret};

use super::{
    helpers::{
        buyer_fixture,
        event_fixture,
        order_fixture,
        send_request,
        test_options,
        ticket_fixture,
        transaction_fixture,
        TEST_WEBHOOK_SECRET,
    },
    mocks::{MockBackend, MockTestMailer},
};
use crate::{middleware::HmacMiddlewareFactory, routes::PaymentWebhookRoute};

const SUCCESS_BODY: &str = r#"{
    "event": "charge.completed",
    "data": {
        "id": 990011,
        "tx_ref": "TIX-0123456789ab",
        "status": "successful",
        "amount": 20000,
        "currency": "NGN"
    }
}"#;

fn webhook_app(
    backend: MockBackend,
    mailer: MockTestMailer,
    signature_checks: bool,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(backend);
        cfg.service(
            web::scope("/webhook")
                .wrap(HmacMiddlewareFactory::new(
                    WEBHOOK_SIGNATURE_HEADER,
                    Secret::new(TEST_WEBHOOK_SECRET.to_string()),
                    signature_checks,
                ))
                .service(PaymentWebhookRoute::<MockBackend, MockTestMailer>::new()),
        )
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(mailer))
        .app_data(web::Data::new(test_options()));
    }
}

fn signed_post(body: &'static str) -> TestRequest {
    let signature = sign_payload(TEST_WEBHOOK_SECRET, body.as_bytes());
    TestRequest::post()
        .uri("/webhook/payment")
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature))
        .set_payload(body)
}

#[actix_web::test]
async fn unsigned_delivery_is_rejected_without_side_effects() {
    let _ = env_logger::try_init().ok();
    // No expectations are set, so any backend call would panic the test.
    let backend = MockBackend::new();
    let mailer = MockTestMailer::new();
    let req = TestRequest::post().uri("/webhook/payment").set_payload(SUCCESS_BODY);
    let (status, _) = send_request(req, webhook_app(backend, mailer, true)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn tampered_body_is_rejected() {
    let _ = env_logger::try_init().ok();
    let backend = MockBackend::new();
    let mailer = MockTestMailer::new();
    let signature = sign_payload(TEST_WEBHOOK_SECRET, SUCCESS_BODY.as_bytes());
    let tampered = SUCCESS_BODY.replace("20000", "1");
    let req = TestRequest::post()
        .uri("/webhook/payment")
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature))
        .set_payload(tampered);
    let (status, _) = send_request(req, webhook_app(backend, mailer, true)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn signed_success_completes_the_order_and_fulfils_it() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order_by_reference()
        .returning(|_| Ok(Some(order_fixture(OrderStatusType::Pending))));
    backend
        .expect_record_transaction_event()
        .withf(|r, amount, status, _| {
            r.as_str() == "TIX-0123456789ab" && *amount == Naira::from(2_000_000) && status == "successful"
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    backend
        .expect_complete_order()
        .withf(|r, payment_ref| r.as_str() == "TIX-0123456789ab" && payment_ref == "990011")
        .times(1)
        .returning(|_, _| Ok(Some(order_fixture(OrderStatusType::Completed))));
    backend
        .expect_transition_transaction()
        .withf(|_, status, id| *status == TransactionStatus::Successful && *id == Some(990_011))
        .times(1)
        .returning(|_, _, _| Ok(Some(transaction_fixture(TransactionStatus::Successful))));
    backend.expect_fetch_event().returning(|_| Ok(Some(event_fixture())));
    backend.expect_fetch_user().returning(|_| Ok(Some(buyer_fixture())));
    backend
        .expect_insert_tickets()
        .withf(|tickets| tickets.len() == 2 && tickets[1].qr_code == "TIX-0123456789ab-2")
        .times(1)
        .returning(|_| Ok(vec![ticket_fixture(1, false), ticket_fixture(2, false)]));
    // ₦20,000.00 less the 5% platform fee.
    backend
        .expect_credit_organizer()
        .withf(|organizer_id, amount| *organizer_id == 3 && *amount == Naira::from(1_900_000))
        .times(1)
        .returning(|_, _| Ok(()));
    let mut mailer = MockTestMailer::new();
    mailer.expect_send_payment_confirmation().times(1).returning(|_, _, _, _| Ok(()));
    mailer
        .expect_send_ticket_bundle()
        .withf(|_, _, _, tickets| tickets.len() == 2)
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let (status, body) = send_request(signed_post(SUCCESS_BODY), webhook_app(backend, mailer, true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "unexpected body: {body}");
    assert!(body.contains("completed"), "unexpected body: {body}");
}

#[actix_web::test]
async fn replayed_delivery_is_logged_but_changes_nothing() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order_by_reference()
        .returning(|_| Ok(Some(order_fixture(OrderStatusType::Completed))));
    // The observation still lands in the attempt log. Anything else would panic the mock.
    backend.expect_record_transaction_event().times(1).returning(|_, _, _, _| Ok(()));
    let mailer = MockTestMailer::new();

    let (status, body) = send_request(signed_post(SUCCESS_BODY), webhook_app(backend, mailer, true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("already processed"), "unexpected body: {body}");
}

#[actix_web::test]
async fn amount_mismatch_alerts_operators_and_issues_nothing() {
    let _ = env_logger::try_init().ok();
    const UNDERPAID_BODY: &str = r#"{"data": {"id": 990011, "tx_ref": "TIX-0123456789ab",
        "status": "successful", "amount": 15000, "currency": "NGN"}}"#;
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order_by_reference()
        .returning(|_| Ok(Some(order_fixture(OrderStatusType::Pending))));
    backend.expect_record_transaction_event().times(1).returning(|_, _, _, _| Ok(()));
    let mut mailer = MockTestMailer::new();
    mailer
        .expect_send_admin_alert()
        .withf(|recipients, subject, _| {
            *recipients == ["ops@unilag.edu.ng"] && subject.contains("Amount mismatch")
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let (status, body) = send_request(signed_post(UNDERPAID_BODY), webhook_app(backend, mailer, true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":false"#), "unexpected body: {body}");
}

#[actix_web::test]
async fn failed_charge_marks_the_order_and_mails_a_retry_link() {
    let _ = env_logger::try_init().ok();
    const FAILED_BODY: &str = r#"{"data": {"id": 990011, "tx_ref": "TIX-0123456789ab", "status": "failed",
        "amount": 20000, "currency": "NGN", "processor_response": "Insufficient funds"}}"#;
    let mut backend = MockBackend::new();
    backend
        .expect_record_transaction_event()
        .withf(|r, amount, status, raw| {
            r.as_str() == "TIX-0123456789ab" &&
                *amount == Naira::from(2_000_000) &&
                status == "failed" &&
                raw["data"]["processor_response"] == "Insufficient funds"
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    backend
        .expect_update_order_status()
        .withf(|_, status, reason| {
            *status == OrderStatusType::Failed && reason == &Some("Insufficient funds")
        })
        .times(1)
        .returning(|_, _, _| Ok(Some(order_fixture(OrderStatusType::Failed))));
    backend.expect_transition_transaction().times(1).returning(|_, _, _| Ok(None));
    backend.expect_fetch_user().returning(|_| Ok(Some(buyer_fixture())));
    let mut mailer = MockTestMailer::new();
    mailer
        .expect_send_payment_failed()
        .withf(|_, _, reason, retry_url| {
            reason == "Insufficient funds" &&
                retry_url == "https://tickets.unilag.edu.ng/orders/TIX-0123456789ab/retry"
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let (status, body) = send_request(signed_post(FAILED_BODY), webhook_app(backend, mailer, true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("marked failed"), "unexpected body: {body}");
}

#[actix_web::test]
async fn within_tolerance_settlement_credits_the_observed_amount() {
    let _ = env_logger::try_init().ok();
    // ₦19,999.50 against a ₦20,000.00 order: 50 kobo short, inside the tolerance.
    const SHORT_BODY: &str = r#"{"data": {"id": 990011, "tx_ref": "TIX-0123456789ab",
        "status": "successful", "amount": 19999.5, "currency": "NGN"}}"#;
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order_by_reference()
        .returning(|_| Ok(Some(order_fixture(OrderStatusType::Pending))));
    backend
        .expect_record_transaction_event()
        .withf(|_, amount, status, _| *amount == Naira::from(1_999_950) && status == "successful")
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    backend
        .expect_complete_order()
        .times(1)
        .returning(|_, _| Ok(Some(order_fixture(OrderStatusType::Completed))));
    backend
        .expect_transition_transaction()
        .times(1)
        .returning(|_, _, _| Ok(Some(transaction_fixture(TransactionStatus::Successful))));
    backend.expect_fetch_event().returning(|_| Ok(Some(event_fixture())));
    backend.expect_fetch_user().returning(|_| Ok(Some(buyer_fixture())));
    backend
        .expect_insert_tickets()
        .times(1)
        .returning(|_| Ok(vec![ticket_fixture(1, false), ticket_fixture(2, false)]));
    // The credit is computed from the ₦19,999.50 the provider collected, not the order total.
    backend
        .expect_credit_organizer()
        .withf(|organizer_id, amount| *organizer_id == 3 && *amount == Naira::from(1_899_953))
        .times(1)
        .returning(|_, _| Ok(()));
    let mut mailer = MockTestMailer::new();
    mailer.expect_send_payment_confirmation().times(1).returning(|_, _, _, _| Ok(()));
    mailer.expect_send_ticket_bundle().times(1).returning(|_, _, _, _| Ok(()));

    let (status, body) = send_request(signed_post(SHORT_BODY), webhook_app(backend, mailer, true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("completed"), "unexpected body: {body}");
}

#[actix_web::test]
async fn garbage_body_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let backend = MockBackend::new();
    let mailer = MockTestMailer::new();
    const BODY: &str = r#"{"event": "charge.completed"}"#;
    let (status, _) = send_request(signed_post(BODY), webhook_app(backend, mailer, true)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unsigned_delivery_passes_when_checks_are_disabled() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order_by_reference()
        .returning(|_| Ok(Some(order_fixture(OrderStatusType::Completed))));
    backend.expect_record_transaction_event().times(1).returning(|_, _, _, _| Ok(()));
    let mailer = MockTestMailer::new();
    let req = TestRequest::post().uri("/webhook/payment").set_payload(SUCCESS_BODY);
    let (status, _) = send_request(req, webhook_app(backend, mailer, false)).await;
    assert_eq!(status, StatusCode::OK);
}
