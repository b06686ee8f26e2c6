use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTicket, OrderId, Ticket},
    traits::LedgerError,
};

pub async fn insert_ticket(ticket: NewTicket, conn: &mut SqliteConnection) -> Result<Ticket, LedgerError> {
    let ticket = sqlx::query_as(
        r#"
            INSERT INTO tickets (event_id, buyer_id, order_id, tier_name, price_paid, seat_label, qr_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(ticket.event_id)
    .bind(ticket.buyer_id)
    .bind(ticket.order_id)
    .bind(ticket.tier_name)
    .bind(ticket.price_paid)
    .bind(ticket.seat_label)
    .bind(ticket.qr_code)
    .fetch_one(conn)
    .await?;
    Ok(ticket)
}

pub async fn fetch_tickets_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Ticket>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tickets WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}

pub async fn fetch_ticket_by_id(ticket_id: i64, conn: &mut SqliteConnection) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tickets WHERE id = $1").bind(ticket_id).fetch_optional(conn).await
}

/// Resolve a scanned code to a ticket. Exact QR match wins; otherwise fall back to a substring match (scanner
/// framing noise), and finally to the raw numeric id.
pub async fn fetch_ticket_by_code(code: &str, conn: &mut SqliteConnection) -> Result<Option<Ticket>, sqlx::Error> {
    let exact: Option<Ticket> =
        sqlx::query_as("SELECT * FROM tickets WHERE qr_code = $1").bind(code).fetch_optional(&mut *conn).await?;
    if exact.is_some() {
        return Ok(exact);
    }
    let fuzzy: Option<Ticket> = sqlx::query_as("SELECT * FROM tickets WHERE instr($1, qr_code) > 0 LIMIT 1")
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;
    if fuzzy.is_some() {
        return Ok(fuzzy);
    }
    match code.parse::<i64>() {
        Ok(id) => fetch_ticket_by_id(id, conn).await,
        Err(_) => Ok(None),
    }
}

/// The check-in transition. Conditional on `used = 0` in the statement itself so concurrent scans admit one holder.
pub async fn use_ticket(ticket_id: i64, conn: &mut SqliteConnection) -> Result<Option<Ticket>, LedgerError> {
    let result: Option<Ticket> =
        sqlx::query_as("UPDATE tickets SET used = 1 WHERE id = $1 AND used = 0 RETURNING *")
            .bind(ticket_id)
            .fetch_optional(conn)
            .await?;
    if let Some(ticket) = &result {
        debug!("🗃️ Ticket [{}] checked in", ticket.qr_code);
    }
    Ok(result)
}

/// All-or-nothing cancellation. The precondition count and the bulk write run inside the caller's transaction; if
/// any requested id is missing, foreign, or already used, the whole request is rejected and nothing changes.
pub async fn cancel_tickets(
    buyer_id: i64,
    ticket_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<u64, LedgerError> {
    if ticket_ids.is_empty() {
        return Err(LedgerError::CancellationPreconditionFailed("no ticket ids supplied".to_string()));
    }
    let placeholders = ticket_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let count_sql =
        format!("SELECT COUNT(*) FROM tickets WHERE buyer_id = ? AND used = 0 AND id IN ({placeholders})");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(buyer_id);
    for id in ticket_ids {
        count_query = count_query.bind(id);
    }
    let eligible = count_query.fetch_one(&mut *conn).await?;
    if eligible != ticket_ids.len() as i64 {
        return Err(LedgerError::CancellationPreconditionFailed(format!(
            "{eligible} of {} requested tickets are cancellable for this buyer",
            ticket_ids.len()
        )));
    }
    let update_sql = format!(
        "UPDATE tickets SET used = 1, cancelled_at = CURRENT_TIMESTAMP WHERE buyer_id = ? AND used = 0 AND id IN \
         ({placeholders})"
    );
    let mut update_query = sqlx::query(&update_sql).bind(buyer_id);
    for id in ticket_ids {
        update_query = update_query.bind(id);
    }
    let affected = update_query.execute(conn).await?.rows_affected();
    debug!("🗃️ Cancelled {affected} tickets for buyer #{buyer_id}");
    Ok(affected)
}
