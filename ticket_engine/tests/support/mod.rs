//! Shared scaffolding for the engine integration tests: a throwaway SQLite database per test, plus seed data.
use chrono::{Duration, Utc};
use log::info;
use ticket_engine::{
    db_types::{Event, EventStatus, TicketType, User},
    sqlite::db::{events, users},
    SqliteDatabase,
};
use tix_common::Naira;

pub fn random_db_url() -> String {
    let path = std::env::temp_dir().join(format!("tix_test_{}.db", rand::random::<u64>()));
    format!("sqlite://{}?mode=rwc", path.display())
}

/// A fresh, fully migrated database. Each test gets its own file so tests can run in parallel.
pub async fn new_test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = random_db_url();
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating test database");
    info!("🚀️ Test database ready at {url}");
    db
}

pub async fn seed_users(db: &SqliteDatabase) -> (User, User) {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let organizer =
        users::insert_user("clubs@unilag.edu.ng", "Engineering Society", &mut conn).await.expect("Error seeding user");
    let buyer = users::insert_user("ada@students.unilag.edu.ng", "Ada Obi", &mut conn).await.expect("Error seeding user");
    (organizer, buyer)
}

/// A published event selling two named tiers: VIP at ₦10,000 and Regular at ₦5,000.
pub async fn seed_tiered_event(db: &SqliteDatabase, organizer_id: i64) -> (Event, Vec<TicketType>) {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let event = events::insert_event(
        organizer_id,
        "Engineering Dinner 2026",
        "Multipurpose Hall",
        500,
        None,
        EventStatus::Published,
        None,
        Utc::now() + Duration::days(30),
        &mut conn,
    )
    .await
    .expect("Error seeding event");
    let vip = events::insert_ticket_type(event.id, "VIP", "Front table, dinner included", Naira::from_naira(10_000), &mut conn)
        .await
        .expect("Error seeding tier");
    let regular = events::insert_ticket_type(event.id, "Regular", "General admission", Naira::from_naira(5_000), &mut conn)
        .await
        .expect("Error seeding tier");
    (event, vec![vip, regular])
}

/// A published event with a single flat price and no tiers.
pub async fn seed_flat_event(db: &SqliteDatabase, organizer_id: i64, price: Naira) -> Event {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    events::insert_event(
        organizer_id,
        "Matriculation Concert",
        "Main Auditorium",
        1000,
        Some(price),
        EventStatus::Published,
        None,
        Utc::now() + Duration::days(14),
        &mut conn,
    )
    .await
    .expect("Error seeding event")
}
