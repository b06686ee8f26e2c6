use chrono::Duration;
use mockall::mock;
use ticket_engine::{
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
use tix_common::Naira;

use crate::mailer::{Mailer, MailerError};

mock! {
    pub Backend {}

    impl Clone for Backend {
        fn clone(&self) -> Self;
    }

    impl TicketingDatabase for Backend {
        fn url(&self) -> &str;
        async fn fetch_event(&self, event_id: i64) -> Result<Option<Event>, LedgerError>;
        async fn fetch_ticket_type(&self, event_id: i64, name: &str) -> Result<Option<TicketType>, LedgerError>;
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, LedgerError>;
        async fn set_provider_customer_id(&self, user_id: i64, customer_id: &str) -> Result<(), LedgerError>;
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, Transaction), LedgerError>;
        async fn fetch_order_by_reference(&self, reference: &OrderId) -> Result<Option<Order>, LedgerError>;
        async fn complete_order(&self, reference: &OrderId, payment_ref: &str) -> Result<Option<Order>, LedgerError>;
        async fn update_order_status<'a>(&self, reference: &OrderId, status: OrderStatusType, failure_reason: Option<&'a str>) -> Result<Option<Order>, LedgerError>;
        async fn fetch_transaction_by_reference(&self, reference: &OrderId) -> Result<Option<Transaction>, LedgerError>;
        async fn attach_virtual_account(&self, reference: &OrderId, va: &VirtualAccountSnapshot) -> Result<(), LedgerError>;
        async fn transition_transaction(&self, reference: &OrderId, status: TransactionStatus, provider_tx_id: Option<i64>) -> Result<Option<Transaction>, LedgerError>;
        async fn record_transaction_event(&self, reference: &OrderId, amount: Naira, status: &str, raw_payload: &serde_json::Value) -> Result<(), LedgerError>;
        async fn insert_tickets(&self, tickets: Vec<NewTicket>) -> Result<Vec<Ticket>, LedgerError>;
        async fn fetch_tickets_for_order(&self, reference: &OrderId) -> Result<Vec<Ticket>, LedgerError>;
        async fn credit_organizer(&self, user_id: i64, amount: Naira) -> Result<(), LedgerError>;
        async fn fetch_stale_pending_orders(&self, grace: Duration, retention: Duration) -> Result<Vec<Order>, LedgerError>;
        async fn publish_due_events(&self) -> Result<Vec<Event>, LedgerError>;
    }

    impl TicketManagement for Backend {
        async fn fetch_ticket_by_code(&self, code: &str) -> Result<Option<Ticket>, LedgerError>;
        async fn fetch_ticket_by_id(&self, ticket_id: i64) -> Result<Option<Ticket>, LedgerError>;
        async fn use_ticket(&self, ticket_id: i64) -> Result<Option<Ticket>, LedgerError>;
        async fn cancel_tickets(&self, buyer_id: i64, ticket_ids: &[i64]) -> Result<u64, LedgerError>;
    }
}

mock! {
    pub TestMailer {}

    impl Mailer for TestMailer {
        async fn send_payment_confirmation(&self, buyer: &User, event: &Event, order: &Order, ticket: &Ticket) -> Result<(), MailerError>;
        async fn send_ticket_bundle(&self, buyer: &User, event: &Event, order: &Order, tickets: &[Ticket]) -> Result<(), MailerError>;
        async fn send_payment_failed(&self, buyer: &User, order: &Order, reason: &str, retry_url: &str) -> Result<(), MailerError>;
        async fn send_ticket_resend(&self, buyer: &User, event: &Event, order: &Order, ticket: &Ticket) -> Result<(), MailerError>;
        async fn send_admin_alert(&self, recipients: &[String], subject: &str, body: &str) -> Result<(), MailerError>;
    }
}
