use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use fluxpay_tools::FluxPayApiError;
use log::error;
use thiserror::Error;
use ticket_engine::{db_types::Ticket, LedgerError, OrderFlowError, TicketApiError};

use crate::mailer::MailerError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("No buyer identity on request. {0}")]
    Unauthenticated(String),
    #[error("Ticket [{}] has already been used", .0.qr_code)]
    TicketAlreadyUsed(Box<Ticket>),
    #[error("The payment provider could not complete the request. {0}")]
    PaymentProviderError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::TicketAlreadyUsed(_) => StatusCode::CONFLICT,
            Self::PaymentProviderError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            // The gate operator needs to see who is holding the duplicate ticket.
            Self::TicketAlreadyUsed(ticket) => {
                serde_json::json!({ "error": self.to_string(), "ticket": ticket })
            },
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Ledger(le) => le.into(),
            OrderFlowError::UnpricedEvent(_) => Self::InvalidRequestBody(e.to_string()),
            OrderFlowError::InvalidQuantity(_) => Self::InvalidRequestBody(e.to_string()),
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::OrderNotFound(_) |
            LedgerError::EventNotFound(_) |
            LedgerError::UserNotFound(_) |
            LedgerError::TicketTypeNotFound { .. } |
            LedgerError::TransactionNotFound(_) |
            LedgerError::TicketNotFound(_) => Self::NoRecordFound(e.to_string()),
            LedgerError::CancellationPreconditionFailed(_) => Self::InvalidRequestBody(e.to_string()),
            LedgerError::OrderAlreadyExists(_) => Self::BackendError(e.to_string()),
            LedgerError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<TicketApiError> for ServerError {
    fn from(e: TicketApiError) -> Self {
        match e {
            TicketApiError::TicketNotFound(_) => Self::NoRecordFound(e.to_string()),
            TicketApiError::TicketUsed(ticket) => Self::TicketAlreadyUsed(ticket),
            TicketApiError::CancellationRejected(_) => Self::InvalidRequestBody(e.to_string()),
            TicketApiError::Ledger(le) => le.into(),
        }
    }
}

impl From<FluxPayApiError> for ServerError {
    fn from(e: FluxPayApiError) -> Self {
        Self::PaymentProviderError(e.to_string())
    }
}

impl From<MailerError> for ServerError {
    fn from(e: MailerError) -> Self {
        Self::Unspecified(e.to_string())
    }
}
