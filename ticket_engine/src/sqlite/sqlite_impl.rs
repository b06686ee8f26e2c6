//! `SqliteDatabase` is a concrete implementation of a ticket fulfillment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;
use tix_common::{Naira, NGN_CURRENCY_CODE};

use super::db::{db_url, events, new_pool, orders, tickets, transactions, users};
use crate::{
    db_types::{
        Event,
        NewOrder,
        NewTicket,
        Order,
        OrderId,
        OrderStatusType,
        Ticket,
        TicketType,
        Transaction,
        TransactionStatus,
        User,
    },
    traits::{LedgerError, TicketManagement, TicketingDatabase, VirtualAccountSnapshot},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, reading the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Creates a new database API object against `url`, running any outstanding schema migrations.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        sqlx::migrate!("./src/sqlite/migrations").run(&pool).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl TicketingDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_event(&self, event_id: i64) -> Result<Option<Event>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let event = events::fetch_event(event_id, &mut conn).await?;
        Ok(event)
    }

    async fn fetch_ticket_type(&self, event_id: i64, name: &str) -> Result<Option<TicketType>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let tier = events::fetch_ticket_type(event_id, name, &mut conn).await?;
        Ok(tier)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn set_provider_customer_id(&self, user_id: i64, customer_id: &str) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::set_provider_customer_id(user_id, customer_id, &mut conn).await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Transaction), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        let pending = transactions::insert_transaction(
            &order.order_id,
            order.buyer_id,
            order.total_price,
            NGN_CURRENCY_CODE,
            &mut tx,
        )
        .await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] saved with pending transaction #{}", order.order_id, pending.id);
        Ok((order, pending))
    }

    async fn fetch_order_by_reference(&self, reference: &OrderId) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(reference, &mut conn).await?;
        Ok(order)
    }

    async fn complete_order(&self, reference: &OrderId, payment_ref: &str) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::complete_order(reference, payment_ref, &mut conn).await
    }

    async fn update_order_status(
        &self,
        reference: &OrderId,
        status: OrderStatusType,
        failure_reason: Option<&str>,
    ) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(reference, status, failure_reason, &mut conn).await
    }

    async fn fetch_transaction_by_reference(&self, reference: &OrderId) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::fetch_transaction_by_reference(reference, &mut conn).await?;
        Ok(tx)
    }

    async fn attach_virtual_account(
        &self,
        reference: &OrderId,
        va: &VirtualAccountSnapshot,
    ) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::attach_virtual_account(reference, va, &mut conn).await
    }

    async fn transition_transaction(
        &self,
        reference: &OrderId,
        status: TransactionStatus,
        provider_tx_id: Option<i64>,
    ) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::transition_transaction(reference, status, provider_tx_id, &mut conn).await
    }

    async fn record_transaction_event(
        &self,
        reference: &OrderId,
        amount: Naira,
        status: &str,
        raw_payload: &serde_json::Value,
    ) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        transactions::record_transaction_event(reference, amount, status, raw_payload, &mut conn).await
    }

    async fn insert_tickets(&self, new_tickets: Vec<NewTicket>) -> Result<Vec<Ticket>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let mut issued = Vec::with_capacity(new_tickets.len());
        for ticket in new_tickets {
            let ticket = tickets::insert_ticket(ticket, &mut tx).await?;
            issued.push(ticket);
        }
        tx.commit().await?;
        debug!("🗃️ Issued {} tickets", issued.len());
        Ok(issued)
    }

    async fn fetch_tickets_for_order(&self, reference: &OrderId) -> Result<Vec<Ticket>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = tickets::fetch_tickets_for_order(reference, &mut conn).await?;
        Ok(result)
    }

    async fn credit_organizer(&self, user_id: i64, amount: Naira) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::credit_balance(user_id, amount, &mut conn).await
    }

    async fn fetch_stale_pending_orders(
        &self,
        grace: Duration,
        retention: Duration,
    ) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_stale_pending_orders(grace, retention, &mut conn).await
    }

    async fn publish_due_events(&self) -> Result<Vec<Event>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        events::publish_due_events(&mut conn).await
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl TicketManagement for SqliteDatabase {
    async fn fetch_ticket_by_code(&self, code: &str) -> Result<Option<Ticket>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let ticket = tickets::fetch_ticket_by_code(code, &mut conn).await?;
        Ok(ticket)
    }

    async fn fetch_ticket_by_id(&self, ticket_id: i64) -> Result<Option<Ticket>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let ticket = tickets::fetch_ticket_by_id(ticket_id, &mut conn).await?;
        Ok(ticket)
    }

    async fn use_ticket(&self, ticket_id: i64) -> Result<Option<Ticket>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        tickets::use_ticket(ticket_id, &mut conn).await
    }

    async fn cancel_tickets(&self, buyer_id: i64, ticket_ids: &[i64]) -> Result<u64, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let cancelled = tickets::cancel_tickets(buyer_id, ticket_ids, &mut tx).await?;
        tx.commit().await?;
        Ok(cancelled)
    }
}
