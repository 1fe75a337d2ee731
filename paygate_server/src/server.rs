use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use paygate_api::PayGateApi;
use paygate_engine::{sqlite::SqliteDatabase, ReconciliationApi};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        CallbackCancelRoute,
        CallbackFailureRoute,
        CallbackServerRejectedRoute,
        CallbackServerRoute,
        CallbackSuccessRoute,
        CheckoutRoute,
        MarkTestPaidRoute,
    },
    sweep_worker::start_sweep_worker,
};

/// The concrete engine the production server runs: SQLite storage and the real PayGate client,
/// with the database doubling as the audit sink for every gateway exchange.
pub type PaymentServerApi = ReconciliationApi<SqliteDatabase, PayGateApi<SqliteDatabase>>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = PayGateApi::new(config.paygate.clone(), db.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let merchant_code = config.paygate.merchant_code.clone();
    let api = ReconciliationApi::new(db, gateway, merchant_code);
    if config.sweep.enabled {
        let _ = start_sweep_worker(api.clone(), config.sweep.clone());
    } else {
        info!("🕰️ The reconciliation sweep is disabled. Missed callbacks will not be retried.");
    }
    let srv = create_server_instance(config, api)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, api: PaymentServerApi) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pgp::access_log"))
            .app_data(web::Data::new(api.clone()))
            .app_data(web::Data::new(config.clone()))
            .service(health)
            .service(CallbackServerRoute::<SqliteDatabase, PayGateApi<SqliteDatabase>>::new())
            .service(CallbackServerRejectedRoute::new())
            .service(CallbackSuccessRoute::<SqliteDatabase, PayGateApi<SqliteDatabase>>::new())
            .service(CallbackCancelRoute::<SqliteDatabase, PayGateApi<SqliteDatabase>>::new())
            .service(CallbackFailureRoute::<SqliteDatabase, PayGateApi<SqliteDatabase>>::new())
            .service(CheckoutRoute::<SqliteDatabase, PayGateApi<SqliteDatabase>>::new())
            .service(MarkTestPaidRoute::<SqliteDatabase, PayGateApi<SqliteDatabase>>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
