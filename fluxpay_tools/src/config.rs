use std::time::Duration;

use log::*;
use tix_common::Secret;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct FluxPayConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Shared secret used to verify webhook signatures. This is distinct from the API client secret.
    pub webhook_secret: Secret<String>,
    /// Upper bound on any single request to the provider. A timeout is a transient failure; the pending-order sweep
    /// will pick the order up again later.
    pub timeout: Duration,
}

impl Default for FluxPayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.fluxpay.example".to_string(),
            client_id: String::default(),
            client_secret: Secret::default(),
            webhook_secret: Secret::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl FluxPayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("TIX_FLUXPAY_BASE_URL").unwrap_or_else(|_| {
            warn!("TIX_FLUXPAY_BASE_URL not set, using the sandbox default");
            FluxPayConfig::default().base_url
        });
        let client_id = std::env::var("TIX_FLUXPAY_CLIENT_ID").unwrap_or_else(|_| {
            error!("TIX_FLUXPAY_CLIENT_ID not set. Calls to the payment provider will be rejected.");
            String::default()
        });
        let client_secret = Secret::new(std::env::var("TIX_FLUXPAY_CLIENT_SECRET").unwrap_or_else(|_| {
            error!("TIX_FLUXPAY_CLIENT_SECRET not set. Calls to the payment provider will be rejected.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("TIX_FLUXPAY_WEBHOOK_SECRET").unwrap_or_else(|_| {
            error!("TIX_FLUXPAY_WEBHOOK_SECRET not set. Inbound webhooks cannot be verified.");
            String::default()
        }));
        let timeout = std::env::var("TIX_FLUXPAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid value for TIX_FLUXPAY_TIMEOUT_SECS: {s}. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { base_url, client_id, client_secret, webhook_secret, timeout }
    }
}
