use chrono::Duration;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    traits::LedgerError,
};

pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    if fetch_order_by_order_id(&order.order_id, conn).await?.is_some() {
        return Err(LedgerError::OrderAlreadyExists(order.order_id));
    }
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                buyer_id,
                event_id,
                tier_name,
                tier_description,
                tier_price,
                quantity,
                total_price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.buyer_id)
    .bind(order.event_id)
    .bind(order.tier_name)
    .bind(order.tier_description)
    .bind(order.tier_price)
    .bind(order.quantity)
    .bind(order.total_price)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// The conditional completion transition. The `status = 'Pending'` guard lives in the same UPDATE statement as the
/// write, so of two racing webhook deliveries exactly one sees a row come back; the other gets `None` and must
/// treat the delivery as a replay.
pub async fn complete_order(
    order_id: &OrderId,
    payment_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = 'Completed',
                payment_ref = $1,
                paid_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $2 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(payment_ref)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    if let Some(order) = &result {
        debug!("🗃️ Order [{}] marked completed with payment ref {payment_ref}", order.order_id);
    }
    Ok(result)
}

pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    failure_reason: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = $1,
                failure_reason = COALESCE($2, failure_reason),
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $3
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(failure_reason)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Pending orders that have aged past the grace window but not yet past the retention window. Ordered oldest first
/// so the sweep retires the most at-risk orders before any fresh ones.
pub async fn fetch_stale_pending_orders(
    grace: Duration,
    retention: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, LedgerError> {
    let rows = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE status = 'Pending'
              AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) > $1
              AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) < $2
            ORDER BY created_at ASC;
        "#,
    )
    .bind(grace.num_seconds())
    .bind(retention.num_seconds())
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
