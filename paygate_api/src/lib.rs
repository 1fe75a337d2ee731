//! PayGate API client
//!
//! A thin, typed client for the PayGate payment gateway's JSON API. It covers the three
//! endpoints this plugin consumes:
//! * `CheckOut` — start a payment session and obtain the hosted payment page URL.
//! * `BackOfficeSearchTransactions` — the authoritative, paged view of gateway-side
//!   transactions. Everything this plugin decides about "has this been paid?" rests on this
//!   call, never on inbound notification payloads.
//! * `MarkTestPaymentAsPaid` — an operator convenience that only works on PayGate test
//!   environments.
//!
//! All calls use HTTP basic authentication plus the access-token/merchant-code pair embedded in
//! the JSON body. Every request and every failure is handed to an [`AuditSink`] before the call
//! result is surfaced, so the exchange is reconstructible from storage even when the network is
//! misbehaving.

mod api;
mod config;
pub mod data_objects;
mod error;
mod traits;

pub use api::PayGateApi;
pub use config::PayGateConfig;
pub use error::GatewayError;
pub use traits::{AuditSink, GatewayApi};
