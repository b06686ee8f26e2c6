use std::fmt::Display;

use fluxpay_tools::VirtualAccount;
use serde::{Deserialize, Serialize};
use ticket_engine::db_types::{Order, Transaction};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Order creation request body. The buyer's identity comes from the `x-user-id` header, not the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderParams {
    pub event_id: i64,
    #[serde(default)]
    pub ticket_type: Option<String>,
    pub quantity: i64,
}

/// What the attendee gets back from `POST /orders`: the pending order plus the bank account to pay into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedResponse {
    pub order: Order,
    pub transaction: Transaction,
    pub virtual_account: VirtualAccount,
}

/// Manual verification request. Exactly one of the two identifiers is required; the provider id wins if both are
/// supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentParams {
    #[serde(default)]
    pub transaction_id: Option<i64>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTicketParams {
    pub ticket_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelTicketsParams {
    pub ticket_ids: Vec<i64>,
}
