use log::{debug, trace};
use sqlx::SqliteConnection;
use tix_common::Naira;

use crate::{
    db_types::{OrderId, Transaction, TransactionEvent, TransactionStatus},
    traits::{LedgerError, VirtualAccountSnapshot},
};

/// Insert the pending transaction row that shadows a freshly created order. The reference *is* the order id; the
/// UNIQUE constraint on `reference` is what makes the payment attempt idempotent provider-side.
pub async fn insert_transaction(
    order_id: &OrderId,
    payer_id: i64,
    amount: Naira,
    currency: &str,
    conn: &mut SqliteConnection,
) -> Result<Transaction, LedgerError> {
    let tx = sqlx::query_as(
        r#"
            INSERT INTO transactions (order_id, payer_id, reference, amount, currency)
            VALUES ($1, $2, $1, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(payer_id)
    .bind(amount)
    .bind(currency)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Transaction [{}] created for order [{order_id}]", tx_ref(&tx));
    Ok(tx)
}

fn tx_ref(tx: &Transaction) -> &str {
    tx.reference.as_str()
}

pub async fn fetch_transaction_by_reference(
    reference: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM transactions WHERE reference = $1")
        .bind(reference.as_str())
        .fetch_optional(conn)
        .await
}

pub async fn attach_virtual_account(
    reference: &OrderId,
    va: &VirtualAccountSnapshot,
    conn: &mut SqliteConnection,
) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
            UPDATE transactions
            SET va_account_number = $1, va_bank = $2, va_expires_at = $3
            WHERE reference = $4;
        "#,
    )
    .bind(&va.account_number)
    .bind(&va.bank)
    .bind(va.expires_at)
    .bind(reference.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

/// Move a transaction out of `Pending`. The guard is in the statement: a transaction that already reached a
/// terminal status is left untouched and `None` is returned, so terminal statuses never reverse.
pub async fn transition_transaction(
    reference: &OrderId,
    status: TransactionStatus,
    provider_tx_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, LedgerError> {
    let (completed, failed) = match status {
        TransactionStatus::Successful => (true, false),
        TransactionStatus::Failed | TransactionStatus::Cancelled => (false, true),
        TransactionStatus::Pending => (false, false),
    };
    let result: Option<Transaction> = sqlx::query_as(
        r#"
            UPDATE transactions
            SET status = $1,
                provider_tx_id = COALESCE($2, provider_tx_id),
                completed_at = CASE WHEN $3 THEN CURRENT_TIMESTAMP ELSE completed_at END,
                failed_at = CASE WHEN $4 THEN CURRENT_TIMESTAMP ELSE failed_at END
            WHERE reference = $5 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(provider_tx_id)
    .bind(completed)
    .bind(failed)
    .bind(reference.as_str())
    .fetch_optional(conn)
    .await?;
    if let Some(tx) = &result {
        debug!("🗃️ Transaction [{}] transitioned to {status}", tx_ref(tx));
    }
    Ok(result)
}

/// Append one observation to the attempt log. Inserts only; existing rows are never touched.
pub async fn record_transaction_event(
    reference: &OrderId,
    amount: Naira,
    status: &str,
    raw_payload: &serde_json::Value,
    conn: &mut SqliteConnection,
) -> Result<(), LedgerError> {
    let tx = fetch_transaction_by_reference(reference, &mut *conn)
        .await?
        .ok_or_else(|| LedgerError::TransactionNotFound(reference.clone()))?;
    sqlx::query(
        r#"
            INSERT INTO transaction_events (transaction_id, amount, status, raw_payload)
            VALUES ($1, $2, $3, $4);
        "#,
    )
    .bind(tx.id)
    .bind(amount)
    .bind(status)
    .bind(raw_payload.to_string())
    .execute(conn)
    .await?;
    trace!("🗃️ Recorded '{status}' event ({amount}) for transaction [{reference}]");
    Ok(())
}

pub async fn fetch_transaction_events(
    transaction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<TransactionEvent>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM transaction_events WHERE transaction_id = $1 ORDER BY id ASC")
        .bind(transaction_id)
        .fetch_all(conn)
        .await
}
