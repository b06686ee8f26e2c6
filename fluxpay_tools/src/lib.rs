//! Client library for the FluxPay payment provider.
//!
//! FluxPay collects payments on our behalf via bank-transfer virtual accounts. This crate wraps the provider's REST
//! API (authentication, customer registration, virtual account creation and transaction polling) and implements the
//! webhook signature scheme used to authenticate inbound payment notifications.

mod api;
mod config;
mod error;

mod data_objects;
mod helpers;

pub use api::FluxPayApi;
pub use config::FluxPayConfig;
pub use data_objects::{ChargeData, ChargeStatus, CustomerInfo, VirtualAccount, WebhookPayload};
pub use error::FluxPayApiError;
pub use helpers::{sign_payload, verify_signature};

/// The header carrying the base64 HMAC-SHA256 signature of the raw webhook body.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-flux-signature";
