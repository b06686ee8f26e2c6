//! The public API for the ticket fulfillment engine.
//!
//! The engine exposes two APIs, which are the only way server code should interact with the database:
//!
//! * [`order_flow_api::OrderFlowApi`] handles order creation and the payment reconciliation flows (webhook
//!   deliveries, manual verification, the stale-order sweep).
//! * [`ticket_api::TicketApi`] handles the ticket lifecycle after issuance: check-in verification, buyer
//!   cancellation, and the lookups behind a fulfilment email resend.
//!
//! The pattern for using both APIs is the same. An API instance is created by supplying a database backend that
//! implements the storage traits required by the API.
//!
//! ```rust,ignore
//! use ticket_engine::{OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/tix.db", 5).await?;
//! let api = OrderFlowApi::new(db);
//! let (order, tx) = api.create_order(req).await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod ticket_api;
