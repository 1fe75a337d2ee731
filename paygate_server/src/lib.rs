//! # PayGate payment server
//! This module hosts the HTTP surface of the PayGate plugin. It is responsible for:
//! Opening checkout sessions at the gateway on behalf of the host shop.
//! Listening for incoming payment callbacks from PayGate and the customer's browser.
//! Verifying every payment against the gateway before an order is placed.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /checkout`: Register a basket and open a payment session.
//! * `POST /callback/server`: The server-to-server payment notification from PayGate.
//! * `GET /callback/success`, `/callback/cancel`, `/callback/failure`: Browser return redirects.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod routes;
pub mod server;
pub mod sweep_worker;

#[cfg(test)]
mod endpoint_tests;
