//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! All payment notifications, whether they arrive on the server callback or on the browser
//! redirect, are handed to [`ReconciliationApi::process_payment_notification`]. Handlers never
//! trust the request contents; the engine re-verifies every payment against the gateway before an
//! order is placed.
use actix_web::{get, http::header, web, HttpRequest, HttpResponse, Responder};
use log::*;
use paygate_api::{
    data_objects::{CallbackParam, CallbackUrls, NewProcessorResponse},
    GatewayApi,
};
use paygate_engine::{
    db_types::NewBasket,
    traits::PaymentStore,
    NotificationOrigin, NotificationOutcome, ReconciliationApi,
};
use serde_json::{json, Value};

use crate::{
    config::ServerConfig,
    data_objects::{extract_payment_ref, CallbackQuery, CheckoutInitRequest, JsonResponse},
    errors::ServerError,
    helpers::{allowed_client_ip, get_remote_ip},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
            impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

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

//------------------------------------------   Server callback  ------------------------------------------------
route!(callback_server => Post "/callback/server" impl PaymentStore, GatewayApi);
/// The server-to-server payment notification from PayGate.
///
/// This is the gateway telling us a payment completed. We don't take its word for it: the engine
/// re-queries the gateway's transaction search before an order is placed. Both a fresh order and
/// a duplicate notification are acknowledged with a 200, since PayGate retries callbacks it
/// considers failed.
pub async fn callback_server<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B, G>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore,
    G: GatewayApi,
{
    trace!("💻️ Received server callback");
    match &config.callback_allowed_networks {
        Some(networks) => {
            let ip = get_remote_ip(&req, config.use_x_forwarded_for);
            match ip {
                Some(ip) if allowed_client_ip(ip, networks) => debug!("💻️ Server callback from {ip}"),
                Some(ip) => {
                    warn!("💻️ Rejecting server callback from {ip}: not on the allow-list");
                    return Err(ServerError::ForbiddenPeer);
                },
                None => {
                    warn!("💻️ No IP address found on the server callback request, denying access.");
                    return Err(ServerError::ForbiddenPeer);
                },
            }
        },
        None => {
            warn!("🚨️ The server callback IP allow-list is not configured. Anyone can call this endpoint.");
        },
    }
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    let payment_ref = extract_payment_ref(&payload).ok_or(ServerError::MissingPaymentRef)?;
    let outcome = api
        .process_payment_notification(&payment_ref, payload, NotificationOrigin::ServerCallback)
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?;
    match outcome {
        NotificationOutcome::OrderCreated(_) | NotificationOutcome::AlreadyProcessed => {
            Ok(HttpResponse::Ok().json(JsonResponse::success("Received server callback with success")))
        },
        NotificationOutcome::BasketNotFound => {
            Err(ServerError::Unspecified(format!("No basket carries the reference [{payment_ref}]")))
        },
        NotificationOutcome::NotConfirmed(confirmation) => {
            Err(ServerError::Unspecified(format!("Could not verify payment for [{payment_ref}]: {confirmation}")))
        },
    }
}

route!(callback_server_rejected => Get "/callback/server");
/// PayGate only ever POSTs the server callback; a GET is someone poking around.
pub async fn callback_server_rejected() -> impl Responder {
    HttpResponse::MethodNotAllowed().finish()
}

//------------------------------------------   Browser redirects  ----------------------------------------------
route!(callback_success => Get "/callback/success" impl PaymentStore, GatewayApi);
/// The customer's browser returning from a successful payment.
///
/// The redirect usually loses the race against the server callback, in which case the order
/// already exists and the customer goes straight to the receipt. When the redirect arrives first
/// the payment is verified and the order placed here, so the customer is never shown an error
/// page for a payment the gateway will vouch for.
pub async fn callback_success<B, G>(
    query: web::Query<CallbackQuery>,
    api: web::Data<ReconciliationApi<B, G>>,
    config: web::Data<ServerConfig>,
) -> HttpResponse
where
    B: PaymentStore,
    G: GatewayApi,
{
    let Some(payment_ref) = query.into_inner().payment_ref else {
        warn!("💻️ Success redirect without a payment_ref");
        return redirect(&config.error_path);
    };
    debug!("💻️ Success redirect for [{payment_ref}]");
    match api.db().order_exists(&payment_ref).await {
        Ok(true) => return redirect(&config.receipt_path),
        Ok(false) => {},
        Err(e) => {
            error!("💻️ Could not check for an existing order for [{payment_ref}]. {e}");
            return redirect(&config.error_path);
        },
    }
    let payload = json!({ "payment_ref": &payment_ref, "browser_redirect": true });
    match api.process_payment_notification(&payment_ref, payload, NotificationOrigin::BrowserSuccess).await {
        Ok(NotificationOutcome::OrderCreated(_)) | Ok(NotificationOutcome::AlreadyProcessed) => {
            redirect(&config.receipt_path)
        },
        Ok(outcome) => {
            warn!("💻️ Success redirect for [{payment_ref}] could not be verified: {outcome:?}");
            redirect(&config.error_path)
        },
        Err(e) => {
            error!("💻️ Error processing success redirect for [{payment_ref}]. {e}");
            redirect(&config.error_path)
        },
    }
}

route!(callback_cancel => Get "/callback/cancel" impl PaymentStore, GatewayApi);
pub async fn callback_cancel<B, G>(
    query: web::Query<CallbackQuery>,
    api: web::Data<ReconciliationApi<B, G>>,
    config: web::Data<ServerConfig>,
) -> HttpResponse
where
    B: PaymentStore,
    G: GatewayApi,
{
    let payment_ref = query.into_inner().payment_ref;
    debug!("💻️ Cancel redirect for {payment_ref:?}");
    let payload = json!({ "payment_ref": &payment_ref, "cancelled": true });
    let _ = api.db().record_response(NewProcessorResponse::new(payment_ref, None, payload)).await;
    redirect(&config.cancel_path)
}

route!(callback_failure => Get "/callback/failure" impl PaymentStore, GatewayApi);
pub async fn callback_failure<B, G>(
    query: web::Query<CallbackQuery>,
    api: web::Data<ReconciliationApi<B, G>>,
    config: web::Data<ServerConfig>,
) -> HttpResponse
where
    B: PaymentStore,
    G: GatewayApi,
{
    let payment_ref = query.into_inner().payment_ref;
    warn!("💻️ Failure redirect for {payment_ref:?}");
    let payload = json!({ "payment_ref": &payment_ref, "failed": true });
    let _ = api.db().record_response(NewProcessorResponse::new(payment_ref, None, payload)).await;
    redirect(&config.error_path)
}

//---------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl PaymentStore, GatewayApi);
/// Register a basket and open a payment session at the gateway.
///
/// The response carries the url of the hosted payment page; the shop sends the customer's
/// browser there. Re-posting the same payment reference refreshes the stored basket rather than
/// duplicating it.
pub async fn checkout<B, G>(
    body: web::Json<CheckoutInitRequest>,
    api: web::Data<ReconciliationApi<B, G>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore,
    G: GatewayApi,
{
    let request = body.into_inner();
    debug!("💻️ Checkout requested for [{}]", request.payment_ref);
    let basket = match (request.customer_name, request.customer_email, request.total) {
        (Some(customer_name), Some(customer_email), Some(total)) => {
            let description =
                if request.description.is_empty() { config.shop_title.clone() } else { request.description };
            api.db()
                .upsert_basket(NewBasket {
                    payment_ref: request.payment_ref.clone(),
                    customer_name,
                    customer_email,
                    currency: request.currency,
                    total,
                    description,
                })
                .await
                .map_err(|e| ServerError::BackendError(e.to_string()))?
        },
        _ => api
            .db()
            .fetch_basket_by_payment_ref(&request.payment_ref)
            .await
            .map_err(|e| ServerError::BackendError(e.to_string()))?
            .ok_or_else(|| ServerError::NoRecordFound(format!("No basket for [{}]", request.payment_ref)))?,
    };
    let callback_urls = CallbackUrls {
        success: config.url_for("/callback/success"),
        cancel: config.url_for("/callback/cancel"),
        failure: config.url_for("/callback/failure"),
        server: config.url_for("/callback/server"),
    };
    let server_params =
        vec![CallbackParam { key: "payment_ref".to_string(), value: basket.payment_ref.to_string() }];
    let session = api
        .begin_checkout(&basket, &config.language, callback_urls, server_params)
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(session))
}

//---------------------------------------------   Test tools  --------------------------------------------------
route!(mark_test_paid => Post "/test/mark-paid" impl PaymentStore, GatewayApi);
/// Force-mark a payment as paid. Only has an effect against PayGate test environments.
pub async fn mark_test_paid<B, G>(
    body: web::Json<Value>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore,
    G: GatewayApi,
{
    let payment_ref = extract_payment_ref(&body).ok_or(ServerError::MissingPaymentRef)?;
    info!("💻️ Marking [{payment_ref}] as paid in the gateway test environment");
    if api.mark_test_paid(&payment_ref).await {
        Ok(HttpResponse::Ok().json(JsonResponse::success(format!("[{payment_ref}] marked as paid"))))
    } else {
        Ok(HttpResponse::Ok().json(JsonResponse::failure(format!("[{payment_ref}] could not be marked as paid"))))
    }
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().insert_header((header::LOCATION, location.to_string())).finish()
}
