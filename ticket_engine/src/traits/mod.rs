//! Storage traits for ticket engine backends.
//!
//! A backend implements [`TicketingDatabase`] (order ledger, transaction log, issuance and settlement writes) and
//! [`TicketManagement`] (ticket lifecycle: check-in and cancellation). The engine APIs in
//! [`crate::tfe_api`] are generic over these traits, which is also what lets the server's endpoint tests run
//! against mockall mocks instead of a live database.

mod data_objects;
mod ticket_management;
mod ticketing_database;

pub use data_objects::VirtualAccountSnapshot;
pub use ticket_management::TicketManagement;
pub use ticketing_database::{LedgerError, TicketingDatabase};

/// Convenience bound for code that needs the full storage surface, such as the server's ticket routes.
pub trait TicketBackend: TicketManagement + TicketingDatabase {}
impl<T> TicketBackend for T where T: TicketManagement + TicketingDatabase {}
