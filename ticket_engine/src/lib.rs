//! Ticket Engine
//!
//! The ticket engine is the core library of the campus event-ticketing backend. It owns the payment-to-ticket
//! fulfillment pipeline: the order ledger, the transaction log, ticket issuance and the settlement of organizer
//! balances. It is provider- and transport-agnostic; the HTTP server and the payment-provider client live in
//! sibling crates.
//!
//! The library is divided into three main sections:
//! 1. The data types stored in the database ([`mod@db_types`]). These are public and shared with the server crate.
//! 2. The storage traits ([`mod@traits`]). A backend implements [`TicketingDatabase`] and [`TicketManagement`] to
//!    act as the persistence layer. SQLite is the bundled backend; Postgres is left as a feature hook.
//! 3. The engine public API ([`mod@tfe_api`]): [`OrderFlowApi`] for order creation and payment reconciliation, and
//!    [`TicketApi`] for check-in verification, cancellation and resend lookups.
//!
//! Every monetary invariant in the system is enforced here: prices are computed exactly once at order creation,
//! order completion is a conditional storage-level transition (so duplicate webhook deliveries cannot double-issue
//! tickets), and organizer balances only ever move by atomic increments.
pub mod db_types;
pub mod helpers;
pub mod tfe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use tfe_api::{
    errors::{OrderFlowError, TicketApiError},
    order_flow_api::OrderFlowApi,
    order_objects,
    ticket_api::TicketApi,
};
pub use traits::{LedgerError, TicketBackend, TicketManagement, TicketingDatabase};
