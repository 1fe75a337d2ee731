use std::net::SocketAddr;

use actix_web::{http::StatusCode, test::TestRequest};
use paygate_engine::traits::InsertOrderResult;
use serde_json::json;

use super::{
    helpers::{configure, location, send, test_config},
    mocks::{basket, completed_tx, order, MockGateway, MockStore},
};

fn loopback() -> SocketAddr {
    "127.0.0.1:80".parse().unwrap()
}

fn server_callback(payment_ref: &str) -> TestRequest {
    TestRequest::post()
        .uri("/callback/server")
        .peer_addr(loopback())
        .set_json(json!({"payment_ref": payment_ref, "statusCode": "C", "success": true}))
}

#[actix_web::test]
async fn verified_callback_creates_an_order() {
    let mut store = MockStore::new();
    store.expect_record_response().returning(|_| Some(1));
    store.expect_fetch_basket_by_payment_ref().times(1).return_once(|_| Ok(Some(basket("bsk-1", 2000))));
    store.expect_order_exists().times(1).returning(|_| Ok(false));
    store.expect_insert_order().times(1).return_once(|_| Ok(InsertOrderResult::Inserted(order("bsk-1", 2000))));
    let mut gateway = MockGateway::new();
    gateway.expect_search_transactions().times(1).returning(|_| Ok(vec![completed_tx("bsk-1", 2000)]));
    let (status, _, body) = send(server_callback("bsk-1"), configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Received server callback with success"), "body: {body}");
}

#[actix_web::test]
async fn duplicate_callback_is_acknowledged_without_a_second_order() {
    let mut store = MockStore::new();
    store.expect_record_response().returning(|_| Some(1));
    store.expect_fetch_basket_by_payment_ref().times(1).return_once(|_| Ok(Some(basket("bsk-1", 2000))));
    store.expect_order_exists().times(1).returning(|_| Ok(true));
    store.expect_insert_order().times(0);
    let mut gateway = MockGateway::new();
    gateway.expect_search_transactions().times(1).returning(|_| Ok(vec![completed_tx("bsk-1", 2000)]));
    let (status, _, body) = send(server_callback("bsk-1"), configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Received server callback with success"), "body: {body}");
}

#[actix_web::test]
async fn callback_from_outside_the_allow_list_is_rejected() {
    // No expectations: the request must be turned away before any store or gateway call.
    let store = MockStore::new();
    let gateway = MockGateway::new();
    let req = TestRequest::post()
        .uri("/callback/server")
        .peer_addr("10.1.2.3:80".parse().unwrap())
        .set_json(json!({"payment_ref": "bsk-1"}));
    let (status, _, body) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Unauthorized invalid allowed ip address"), "body: {body}");
}

#[actix_web::test]
async fn forwarded_header_is_honoured_when_configured() {
    let mut store = MockStore::new();
    store.expect_record_response().returning(|_| Some(1));
    store.expect_fetch_basket_by_payment_ref().times(1).return_once(|_| Ok(Some(basket("bsk-1", 2000))));
    store.expect_order_exists().times(1).returning(|_| Ok(true));
    let mut gateway = MockGateway::new();
    gateway.expect_search_transactions().times(1).returning(|_| Ok(vec![completed_tx("bsk-1", 2000)]));
    let mut config = test_config();
    config.use_x_forwarded_for = true;
    // The proxy peer is not on the allow-list; the forwarded client is.
    let req = TestRequest::post()
        .uri("/callback/server")
        .peer_addr("10.1.2.3:80".parse().unwrap())
        .insert_header(("X-Forwarded-For", "127.0.0.1, 10.1.2.3"))
        .set_json(json!({"payment_ref": "bsk-1", "statusCode": "C"}));
    let (status, _, _) = send(req, configure(store, gateway, config)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn callback_without_a_payment_ref_is_a_412() {
    let store = MockStore::new();
    let gateway = MockGateway::new();
    // No allow-list configured: the request is let through to payload validation.
    let mut config = test_config();
    config.callback_allowed_networks = None;
    let req = TestRequest::post().uri("/callback/server").set_json(json!({"statusCode": "C"}));
    let (status, _, body) = send(req, configure(store, gateway, config)).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert!(body.contains("Incorrect payment_ref"), "body: {body}");
}

#[actix_web::test]
async fn callback_for_an_unknown_basket_is_an_error() {
    let mut store = MockStore::new();
    store.expect_record_response().returning(|_| Some(1));
    store.expect_fetch_basket_by_payment_ref().times(1).returning(|_| Ok(None));
    let gateway = MockGateway::new();
    let (status, _, _) = send(server_callback("nope"), configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn unverifiable_callback_is_an_error_and_no_order_is_placed() {
    let mut store = MockStore::new();
    store.expect_record_response().returning(|_| Some(1));
    store.expect_fetch_basket_by_payment_ref().times(1).return_once(|_| Ok(Some(basket("bsk-1", 2000))));
    store.expect_insert_order().times(0);
    let mut gateway = MockGateway::new();
    gateway.expect_search_transactions().times(1).returning(|_| Ok(vec![]));
    let (status, _, _) = send(server_callback("bsk-1"), configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn get_on_the_server_callback_is_a_405() {
    let store = MockStore::new();
    let gateway = MockGateway::new();
    let req = TestRequest::get().uri("/callback/server").peer_addr(loopback());
    let (status, _, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[actix_web::test]
async fn success_redirect_after_the_callback_goes_to_the_receipt() {
    let mut store = MockStore::new();
    store.expect_order_exists().times(1).returning(|_| Ok(true));
    let gateway = MockGateway::new();
    let req = TestRequest::get().uri("/callback/success?payment_ref=bsk-1");
    let (status, headers, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location(&headers), Some("/checkout/receipt/"));
}

#[actix_web::test]
async fn success_redirect_that_beats_the_callback_still_places_the_order() {
    let mut store = MockStore::new();
    store.expect_record_response().returning(|_| Some(1));
    store.expect_fetch_basket_by_payment_ref().times(1).return_once(|_| Ok(Some(basket("bsk-1", 2000))));
    // Once from the handler, once inside the notification path.
    store.expect_order_exists().times(2).returning(|_| Ok(false));
    store.expect_insert_order().times(1).return_once(|_| Ok(InsertOrderResult::Inserted(order("bsk-1", 2000))));
    let mut gateway = MockGateway::new();
    gateway.expect_search_transactions().times(1).returning(|_| Ok(vec![completed_tx("bsk-1", 2000)]));
    let req = TestRequest::get().uri("/callback/success?payment_ref=bsk-1");
    let (status, headers, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location(&headers), Some("/checkout/receipt/"));
}

#[actix_web::test]
async fn unverifiable_success_redirect_goes_to_the_error_page() {
    let mut store = MockStore::new();
    store.expect_record_response().returning(|_| Some(1));
    store.expect_fetch_basket_by_payment_ref().times(1).return_once(|_| Ok(Some(basket("bsk-1", 2000))));
    store.expect_order_exists().times(1).returning(|_| Ok(false));
    store.expect_insert_order().times(0);
    let mut gateway = MockGateway::new();
    gateway.expect_search_transactions().times(1).returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/callback/success?payment_ref=bsk-1");
    let (status, headers, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location(&headers), Some("/checkout/error/"));
}

#[actix_web::test]
async fn success_redirect_without_a_ref_goes_to_the_error_page() {
    let store = MockStore::new();
    let gateway = MockGateway::new();
    let req = TestRequest::get().uri("/callback/success");
    let (status, headers, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location(&headers), Some("/checkout/error/"));
}

#[actix_web::test]
async fn cancel_redirect_is_audited_and_sent_to_the_cancel_page() {
    let mut store = MockStore::new();
    store.expect_record_response().times(1).returning(|_| Some(1));
    let gateway = MockGateway::new();
    let req = TestRequest::get().uri("/callback/cancel?payment_ref=bsk-1");
    let (status, headers, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location(&headers), Some("/checkout/cancel-checkout/"));
}

#[actix_web::test]
async fn failure_redirect_is_audited_and_sent_to_the_error_page() {
    let mut store = MockStore::new();
    store.expect_record_response().times(1).returning(|_| Some(1));
    let gateway = MockGateway::new();
    let req = TestRequest::get().uri("/callback/failure?payment_ref=bsk-1");
    let (status, headers, _) = send(req, configure(store, gateway, test_config())).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location(&headers), Some("/checkout/error/"));
}
