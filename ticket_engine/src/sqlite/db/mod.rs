//! # SQLite database methods
//!
//! This module contains the "low-level" SQLite interactions.
//!
//! All of these are plain functions (rather than stateful structs) accepting a `&mut SqliteConnection` argument.
//! Callers can obtain a connection from a pool, or open a transaction and pass `&mut *tx` to compose several calls
//! atomically.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod events;
pub mod orders;
pub mod tickets;
pub mod transactions;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/tix_store.db";

pub fn db_url() -> String {
    let result = env::var("TIX_DATABASE_URL").unwrap_or_else(|_| {
        info!("TIX_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
