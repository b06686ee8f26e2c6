use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The virtual-account payment instruction snapshotted onto a transaction at checkout. The snapshot is what the
/// attendee pays into; keeping a copy means the transaction row stays meaningful even after the provider expires
/// the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualAccountSnapshot {
    pub account_number: String,
    pub bank: String,
    pub expires_at: Option<DateTime<Utc>>,
}
