use std::str::FromStr;

use actix_web::{
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use paygate_engine::ReconciliationApi;

use super::mocks::{MockGateway, MockStore, MERCHANT};
use crate::{
    config::ServerConfig,
    helpers::IpNetwork,
    routes::{
        CallbackCancelRoute,
        CallbackFailureRoute,
        CallbackServerRejectedRoute,
        CallbackServerRoute,
        CallbackSuccessRoute,
        CheckoutRoute,
        MarkTestPaidRoute,
    },
};

/// A test config with the loopback address on the callback allow-list.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::new("127.0.0.1", 8380);
    config.callback_allowed_networks = Some(vec![IpNetwork::from_str("127.0.0.1").unwrap()]);
    config.paygate.merchant_code = MERCHANT.to_string();
    config
}

/// Register every route against the given mocks and config, the way the production server does.
pub fn configure(store: MockStore, gateway: MockGateway, config: ServerConfig) -> impl FnOnce(&mut ServiceConfig) {
    let merchant_code = config.paygate.merchant_code.clone();
    move |cfg: &mut ServiceConfig| {
        let api = ReconciliationApi::new(store, gateway, merchant_code);
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(config))
            .service(CallbackServerRoute::<MockStore, MockGateway>::new())
            .service(CallbackServerRejectedRoute::new())
            .service(CallbackSuccessRoute::<MockStore, MockGateway>::new())
            .service(CallbackCancelRoute::<MockStore, MockGateway>::new())
            .service(CallbackFailureRoute::<MockStore, MockGateway>::new())
            .service(CheckoutRoute::<MockStore, MockGateway>::new())
            .service(MarkTestPaidRoute::<MockStore, MockGateway>::new());
    }
}

pub async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, HeaderMap, String)
where F: FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, headers, body)
}

pub fn location(headers: &HeaderMap) -> Option<&str> {
    headers.get("Location").and_then(|v| v.to_str().ok())
}
