use actix_web::{http::StatusCode, test::TestRequest};
use paygate_api::{data_objects::CheckoutSuccess, GatewayError};
use serde_json::json;

use super::{
    helpers::{configure, send, test_config},
    mocks::{basket, MockGateway, MockStore},
};

fn checkout_request() -> TestRequest {
    TestRequest::post().uri("/checkout").set_json(json!({
        "payment_ref": "bsk-1",
        "customer_name": "Alice Smith",
        "customer_email": "alice@example.com",
        "total": "20.00",
    }))
}

#[actix_web::test]
async fn checkout_registers_the_basket_and_returns_the_payment_page() {
    let mut store = MockStore::new();
    store.expect_record_response().returning(|_| Some(1));
    store
        .expect_upsert_basket()
        .withf(|b| b.payment_ref.as_str() == "bsk-1" && b.currency == "EUR")
        .times(1)
        .return_once(|_| Ok(basket("bsk-1", 2000)));
    let mut gateway = MockGateway::new();
    gateway
        .expect_checkout()
        .withf(|r| {
            r.payment_ref.as_str() == "bsk-1"
                && r.callback_urls.server.ends_with("/callback/server")
                && r.server_params.iter().any(|p| p.key == "payment_ref" && p.value == "bsk-1")
        })
        .times(1)
        .returning(|_| {
            Ok(CheckoutSuccess {
                payment_page_url: "https://paygate.example.com/pay/abc123".to_string(),
                session_token: "abc123".to_string(),
                payment_id: Some("987".to_string()),
            })
        });
    let (status, _, body) = send(checkout_request(), configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("https://paygate.example.com/pay/abc123"), "body: {body}");
    assert!(body.contains("abc123"), "body: {body}");
}

#[actix_web::test]
async fn a_bare_ref_reuses_the_registered_basket() {
    let mut store = MockStore::new();
    store.expect_record_response().returning(|_| Some(1));
    store.expect_fetch_basket_by_payment_ref().times(1).return_once(|_| Ok(Some(basket("bsk-1", 2000))));
    store.expect_upsert_basket().times(0);
    let mut gateway = MockGateway::new();
    gateway.expect_checkout().times(1).returning(|_| {
        Ok(CheckoutSuccess {
            payment_page_url: "https://paygate.example.com/pay/abc123".to_string(),
            session_token: "abc123".to_string(),
            payment_id: None,
        })
    });
    let req = TestRequest::post().uri("/checkout").set_json(json!({"payment_ref": "bsk-1"}));
    let (status, _, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn a_bare_ref_for_an_unknown_basket_is_a_404() {
    let mut store = MockStore::new();
    store.expect_fetch_basket_by_payment_ref().times(1).returning(|_| Ok(None));
    let gateway = MockGateway::new();
    let req = TestRequest::post().uri("/checkout").set_json(json!({"payment_ref": "nope"}));
    let (status, _, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn a_rejected_checkout_is_a_server_error() {
    let mut store = MockStore::new();
    store.expect_record_response().returning(|_| Some(1));
    store.expect_upsert_basket().times(1).return_once(|_| Ok(basket("bsk-1", 2000)));
    let mut gateway = MockGateway::new();
    gateway.expect_checkout().times(1).returning(|_| {
        Err(GatewayError::CheckoutRejected {
            return_code: "D0001".to_string(),
            short_message: "Not success".to_string(),
            long_message: "The merchant code is not active".to_string(),
        })
    });
    let (status, _, body) = send(checkout_request(), configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("D0001"), "body: {body}");
}

#[actix_web::test]
async fn a_malformed_total_is_rejected_before_any_backend_call() {
    let store = MockStore::new();
    let gateway = MockGateway::new();
    let req = TestRequest::post().uri("/checkout").set_json(json!({
        "payment_ref": "bsk-1",
        "customer_name": "Alice Smith",
        "customer_email": "alice@example.com",
        "total": "20.001",
    }));
    let (status, _, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn mark_test_paid_reports_the_gateway_verdict() {
    let store = MockStore::new();
    let mut gateway = MockGateway::new();
    gateway.expect_mark_test_payment_as_paid().times(1).returning(|_| true);
    let req = TestRequest::post().uri("/test/mark-paid").set_json(json!({"payment_ref": "bsk-1"}));
    let (status, _, body) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"success\":true"), "body: {body}");
}

#[actix_web::test]
async fn mark_test_paid_without_a_ref_is_a_412() {
    let store = MockStore::new();
    let gateway = MockGateway::new();
    let req = TestRequest::post().uri("/test/mark-paid").set_json(json!({}));
    let (status, _, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
}
