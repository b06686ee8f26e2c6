use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use fluxpay_tools::{FluxPayApi, FluxPayConfig};
use ticket_engine::OrderFlowApi;

use super::{
    helpers::{buyer_fixture, send_request},
    mocks::MockBackend,
};
use crate::routes::NewOrderRoute;

// The provider client is concrete, so these tests only cover the paths that fail before any provider call. The
// reconciliation flows behind a successful checkout are covered by the webhook tests, which drive the same code.
fn order_app(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(backend);
        let fluxpay = FluxPayApi::new(FluxPayConfig::default()).expect("client should build");
        cfg.service(NewOrderRoute::<MockBackend>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(fluxpay));
    }
}

#[actix_web::test]
async fn order_creation_requires_a_buyer_identity() {
    let _ = env_logger::try_init().ok();
    let backend = MockBackend::new();
    let req = TestRequest::post()
        .uri("/orders")
        .set_json(serde_json::json!({ "event_id": 7, "ticket_type": "VIP", "quantity": 2 }));
    let (status, _) = send_request(req, order_app(backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn order_creation_rejects_a_zero_quantity() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_user().returning(|_| Ok(Some(buyer_fixture())));
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(("x-user-id", "42"))
        .set_json(serde_json::json!({ "event_id": 7, "quantity": 0 }));
    let (status, body) = send_request(req, order_app(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Quantity must be at least 1"), "unexpected body: {body}");
}

#[actix_web::test]
async fn order_creation_rejects_an_unknown_buyer() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_user().returning(|_| Ok(None));
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(("x-user-id", "404"))
        .set_json(serde_json::json!({ "event_id": 7, "quantity": 1 }));
    let (status, _) = send_request(req, order_app(backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
