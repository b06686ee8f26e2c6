use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tix_common::Naira;
use tokio::sync::RwLock;

use crate::{config::FluxPayConfig, data_objects::ChargeData, FluxPayApiError, VirtualAccount};

/// Tokens are refreshed this long before their reported expiry, so a token never goes stale mid-request.
const TOKEN_EXPIRY_SKEW_SECS: i64 = 30;

#[derive(Debug, Clone)]
struct BearerToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    fn is_valid(&self) -> bool {
        Utc::now() + Duration::seconds(TOKEN_EXPIRY_SKEW_SECS) < self.expires_at
    }
}

#[derive(Clone)]
pub struct FluxPayApi {
    config: FluxPayConfig,
    client: Arc<Client>,
    // Lazily refreshed bearer credential, shared across clones of the API handle.
    token: Arc<RwLock<Option<BearerToken>>>,
}

impl FluxPayApi {
    pub fn new(config: FluxPayConfig) -> Result<Self, FluxPayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| FluxPayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), token: Arc::new(RwLock::new(None)) })
    }

    pub fn config(&self) -> &FluxPayConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Returns a valid bearer token, re-authenticating with the provider if the cached one has expired.
    async fn access_token(&self) -> Result<String, FluxPayApiError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_valid() {
                return Ok(token.token.clone());
            }
        }
        let mut guard = self.token.write().await;
        // Another task may have refreshed while we waited for the write lock.
        if let Some(token) = guard.as_ref() {
            if token.is_valid() {
                return Ok(token.token.clone());
            }
        }
        let token = self.authenticate().await?;
        let result = token.token.clone();
        debug!("💳️ Obtained a new FluxPay bearer token, valid until {}", token.expires_at);
        *guard = Some(token);
        Ok(result)
    }

    async fn authenticate(&self) -> Result<BearerToken, FluxPayApiError> {
        #[derive(Serialize)]
        struct TokenRequest<'a> {
            client_id: &'a str,
            client_secret: &'a str,
            grant_type: &'a str,
        }
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }
        let body = TokenRequest {
            client_id: &self.config.client_id,
            client_secret: self.config.client_secret.reveal(),
            grant_type: "client_credentials",
        };
        let response = self
            .client
            .post(self.url("/oauth/token"))
            .json(&body)
            .send()
            .await
            .map_err(|e| FluxPayApiError::TransportError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(FluxPayApiError::AuthenticationFailed(format!("Error {status}. {message}")));
        }
        let token: TokenResponse =
            response.json().await.map_err(|e| FluxPayApiError::JsonError(e.to_string()))?;
        Ok(BearerToken {
            token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, FluxPayApiError> {
        let token = self.access_token().await?;
        let url = self.url(path);
        trace!("💳️ Sending REST query: {url}");
        let mut req = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| FluxPayApiError::TransportError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| FluxPayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| FluxPayApiError::TransportError(e.to_string()))?;
            Err(FluxPayApiError::QueryError { status, message })
        }
    }

    /// Register a payer identity with the provider. Called once per user; the returned id is cached on the user
    /// record by the caller so subsequent orders skip this round trip.
    pub async fn create_customer(&self, email: &str, name: &str) -> Result<String, FluxPayApiError> {
        #[derive(Deserialize)]
        struct CustomerResponse {
            data: CustomerData,
        }
        #[derive(Deserialize)]
        struct CustomerData {
            id: String,
        }
        let body = serde_json::json!({ "email": email, "name": name });
        debug!("💳️ Registering customer {email} with FluxPay");
        let result = self.rest_query::<CustomerResponse, _>(Method::POST, "/customers", Some(body)).await?;
        info!("💳️ Registered FluxPay customer {}", result.data.id);
        Ok(result.data.id)
    }

    /// Mint a virtual account the attendee can pay into. The account is scoped to exactly one order reference, which
    /// is how the provider's notifications find their way back to the right order.
    pub async fn create_virtual_account(
        &self,
        reference: &str,
        amount: Naira,
        customer_id: &str,
    ) -> Result<VirtualAccount, FluxPayApiError> {
        #[derive(Deserialize)]
        struct VirtualAccountResponse {
            data: VirtualAccount,
        }
        let body = serde_json::json!({
            "tx_ref": reference,
            "amount": major_units(amount),
            "currency": tix_common::NGN_CURRENCY_CODE,
            "customer_id": customer_id,
        });
        debug!("💳️ Creating virtual account for order [{reference}] ({amount})");
        let result =
            self.rest_query::<VirtualAccountResponse, _>(Method::POST, "/virtual-accounts", Some(body)).await?;
        info!("💳️ Virtual account {} minted for order [{reference}]", result.data.account_number);
        Ok(result.data)
    }

    /// Poll the provider for the current status of a transaction by its provider-assigned id.
    pub async fn verify_transaction(&self, transaction_id: i64) -> Result<ChargeData, FluxPayApiError> {
        #[derive(Deserialize)]
        struct VerifyResponse {
            data: ChargeData,
        }
        let path = format!("/transactions/{transaction_id}/verify");
        debug!("💳️ Verifying transaction #{transaction_id}");
        let result = self.rest_query::<VerifyResponse, ()>(Method::GET, &path, None).await?;
        Ok(result.data)
    }

    /// Poll the provider for the current status of a transaction by our own reference (the order id). Used by the
    /// manual verification endpoint and the pending-order sweep, where no provider id is known yet.
    pub async fn verify_transaction_by_reference(&self, reference: &str) -> Result<ChargeData, FluxPayApiError> {
        #[derive(Deserialize)]
        struct VerifyResponse {
            data: ChargeData,
        }
        let path = format!("/transactions/verify_by_reference?tx_ref={reference}");
        debug!("💳️ Verifying transaction for order [{reference}]");
        let result = self.rest_query::<VerifyResponse, ()>(Method::GET, &path, None).await?;
        Ok(result.data)
    }
}

/// FluxPay expects amounts as decimal major units.
fn major_units(amount: Naira) -> f64 {
    amount.value() as f64 / 100.0
}
