use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;
use tix_common::Naira;

use crate::{
    db_types::{Event, EventStatus, TicketType},
    traits::LedgerError,
};

pub async fn fetch_event(event_id: i64, conn: &mut SqliteConnection) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM events WHERE id = $1 AND status != 'Deleted'")
        .bind(event_id)
        .fetch_optional(conn)
        .await
}

/// Tier names are matched case-insensitively: attendees type "vip" as often as "VIP".
pub async fn fetch_ticket_type(
    event_id: i64,
    name: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<TicketType>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM event_ticket_types WHERE event_id = $1 AND name = $2 COLLATE NOCASE")
        .bind(event_id)
        .bind(name)
        .fetch_optional(conn)
        .await
}

/// Flip Draft events whose scheduled publish time has elapsed. Called from the sweep worker.
pub async fn publish_due_events(conn: &mut SqliteConnection) -> Result<Vec<Event>, LedgerError> {
    let rows: Vec<Event> = sqlx::query_as(
        r#"
            UPDATE events
            SET status = 'Published', updated_at = CURRENT_TIMESTAMP
            WHERE status = 'Draft' AND publish_at IS NOT NULL AND publish_at <= CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .fetch_all(conn)
    .await?;
    if !rows.is_empty() {
        debug!("🗃️ Auto-published {} events", rows.len());
    }
    Ok(rows)
}

/// Seed helper for the event CRUD layer, which lives outside this crate. Also used by the engine's own tests.
#[allow(clippy::too_many_arguments)]
pub async fn insert_event(
    organizer_id: i64,
    title: &str,
    venue: &str,
    capacity: i64,
    price: Option<Naira>,
    status: EventStatus,
    publish_at: Option<DateTime<Utc>>,
    starts_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Event, LedgerError> {
    let event = sqlx::query_as(
        r#"
            INSERT INTO events (organizer_id, title, venue, capacity, price, status, publish_at, starts_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(organizer_id)
    .bind(title)
    .bind(venue)
    .bind(capacity)
    .bind(price)
    .bind(status.to_string())
    .bind(publish_at)
    .bind(starts_at)
    .fetch_one(conn)
    .await?;
    Ok(event)
}

pub async fn insert_ticket_type(
    event_id: i64,
    name: &str,
    description: &str,
    price: Naira,
    conn: &mut SqliteConnection,
) -> Result<TicketType, LedgerError> {
    let tier = sqlx::query_as(
        r#"
            INSERT INTO event_ticket_types (event_id, name, description, price)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(event_id)
    .bind(name)
    .bind(description)
    .bind(price)
    .fetch_one(conn)
    .await?;
    Ok(tier)
}
