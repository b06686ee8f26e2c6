//! # Ticket server
//! This module hosts the HTTP surface of the campus ticketing backend. It is responsible for:
//! Accepting order creation requests and handing attendees a virtual account to pay into.
//! Listening for incoming payment webhook notifications from FluxPay and reconciling them against the order ledger.
//! Serving the gate check-in, cancellation and resend endpoints.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/orders`: Order creation.
//! * `/webhook/payment`: The webhook route for receiving charge events from FluxPay.
//! * `/payments/verify`: Manual verification, polling the provider on demand.
//! * `/tickets/verify`, `/tickets/cancel`, `/tickets/{id}/resend`: The ticket lifecycle routes.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod mailer;
pub mod middleware;
pub mod reconciliation;
pub mod routes;
pub mod server;
pub mod sweep_worker;

#[cfg(test)]
mod endpoint_tests;
