use std::env;

use chrono::Duration;
use fluxpay_tools::FluxPayConfig;
use log::*;
use tix_common::parse_boolean_flag;

const DEFAULT_TIX_HOST: &str = "127.0.0.1";
const DEFAULT_TIX_PORT: u16 = 8380;
/// Platform fee in basis points (5%).
const DEFAULT_PLATFORM_FEE_BPS: u32 = 500;
const DEFAULT_SWEEP_GRACE: Duration = Duration::minutes(10);
const DEFAULT_SWEEP_RETENTION: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The platform's cut of every settled order, in basis points. Deducted (rounded down) before the organizer
    /// balance is credited.
    pub platform_fee_bps: u32,
    /// Base URL of the attendee-facing frontend. Used to build the retry link in payment failure emails.
    pub frontend_url: String,
    /// Recipients of operator alerts (orphaned payments, amount mismatches, issuance failures).
    pub admin_emails: Vec<String>,
    /// How long a pending order is left alone before the sweep starts polling the provider about it. The grace
    /// window keeps the sweep from racing a webhook that is already in flight.
    pub sweep_grace: Duration,
    /// Pending orders older than this are expired rather than polled.
    pub sweep_retention: Duration,
    /// If false, the webhook signature middleware lets everything through. For local development only.
    pub webhook_signature_checks: bool,
    /// Payment provider configuration.
    pub fluxpay: FluxPayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TIX_HOST.to_string(),
            port: DEFAULT_TIX_PORT,
            database_url: String::default(),
            platform_fee_bps: DEFAULT_PLATFORM_FEE_BPS,
            frontend_url: "http://localhost:3000".to_string(),
            admin_emails: Vec::new(),
            sweep_grace: DEFAULT_SWEEP_GRACE,
            sweep_retention: DEFAULT_SWEEP_RETENTION,
            webhook_signature_checks: true,
            fluxpay: FluxPayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TIX_HOST").ok().unwrap_or_else(|| DEFAULT_TIX_HOST.into());
        let port = env::var("TIX_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TIX_PORT. {e} Using the default, {DEFAULT_TIX_PORT}, instead."
                    );
                    DEFAULT_TIX_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TIX_PORT);
        let database_url = env::var("TIX_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TIX_DATABASE_URL is not set. Please set it to the URL for the ticketing database.");
            String::default()
        });
        let platform_fee_bps = env::var("TIX_PLATFORM_FEE_BPS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>().map_err(|e| warn!("🪛️ Invalid value for TIX_PLATFORM_FEE_BPS: {s}. {e}")).ok()
            })
            .unwrap_or(DEFAULT_PLATFORM_FEE_BPS);
        let frontend_url = env::var("TIX_FRONTEND_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ TIX_FRONTEND_URL is not set. Payment retry links will point at localhost.");
            ServerConfig::default().frontend_url
        });
        let admin_emails = env::var("TIX_ADMIN_EMAILS")
            .ok()
            .map(|s| s.split(',').map(|e| e.trim().to_string()).filter(|e| !e.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default();
        if admin_emails.is_empty() {
            warn!("🚨️ TIX_ADMIN_EMAILS is empty. Operator alerts will be logged but not mailed to anyone.");
        }
        let (sweep_grace, sweep_retention) = configure_sweep_windows();
        let webhook_signature_checks = parse_boolean_flag(env::var("TIX_WEBHOOK_SIGNATURE_CHECKS").ok(), true);
        if !webhook_signature_checks {
            warn!(
                "🚨️🚨️🚨️ Webhook signature checks are DISABLED. Anyone who can reach this server can mark orders as \
                 paid. Never run production like this. 🚨️🚨️🚨️"
            );
        }
        let fluxpay = FluxPayConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            platform_fee_bps,
            frontend_url,
            admin_emails,
            sweep_grace,
            sweep_retention,
            webhook_signature_checks,
            fluxpay,
        }
    }
}

fn configure_sweep_windows() -> (Duration, Duration) {
    let grace = env::var("TIX_SWEEP_GRACE_MINUTES")
        .map_err(|_| {
            info!(
                "🪛️ TIX_SWEEP_GRACE_MINUTES is not set. Using the default value of {} minutes.",
                DEFAULT_SWEEP_GRACE.num_minutes()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::minutes)
                .map_err(|e| warn!("🪛️ Invalid configuration value for TIX_SWEEP_GRACE_MINUTES. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_SWEEP_GRACE);
    let retention = env::var("TIX_SWEEP_RETENTION_HOURS")
        .map_err(|_| {
            info!(
                "🪛️ TIX_SWEEP_RETENTION_HOURS is not set. Using the default value of {} hrs.",
                DEFAULT_SWEEP_RETENTION.num_hours()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::hours)
                .map_err(|e| warn!("🪛️ Invalid configuration value for TIX_SWEEP_RETENTION_HOURS. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_SWEEP_RETENTION);
    (grace, retention)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The subset of the server configuration that request handlers need. Generally we try to keep this as small as
/// possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub platform_fee_bps: u32,
    pub frontend_url: String,
    pub admin_emails: Vec<String>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            platform_fee_bps: config.platform_fee_bps,
            frontend_url: config.frontend_url.clone(),
            admin_emails: config.admin_emails.clone(),
        }
    }
}
