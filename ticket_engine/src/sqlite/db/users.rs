use log::debug;
use sqlx::SqliteConnection;
use tix_common::Naira;

use crate::{db_types::User, traits::LedgerError};

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await
}

pub async fn set_provider_customer_id(
    user_id: i64,
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), LedgerError> {
    sqlx::query("UPDATE users SET provider_customer_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(customer_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Settlement credit. A single atomic increment: concurrent settlements for different orders of the same organizer
/// must not lose updates, so the balance is never read back and rewritten.
pub async fn credit_balance(user_id: i64, amount: Naira, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    let affected = sqlx::query(
        r#"
            UPDATE users
            SET available_balance = available_balance + $1,
                total_earnings = total_earnings + $1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2;
        "#,
    )
    .bind(amount)
    .bind(user_id)
    .execute(conn)
    .await?
    .rows_affected();
    if affected == 0 {
        return Err(LedgerError::UserNotFound(user_id));
    }
    debug!("🗃️ Credited {amount} to user #{user_id}");
    Ok(())
}

/// Seed helper for the account CRUD layer, which lives outside this crate. Also used by the engine's own tests.
pub async fn insert_user(email: &str, display_name: &str, conn: &mut SqliteConnection) -> Result<User, LedgerError> {
    let user = sqlx::query_as("INSERT INTO users (email, display_name) VALUES ($1, $2) RETURNING *")
        .bind(email)
        .bind(display_name)
        .fetch_one(conn)
        .await?;
    Ok(user)
}
