use actix_web::{
    error::ResponseError,
    http::StatusCode,
    HttpResponse,
};
use log::error;
use settlement_engine::{CustomerApiError, SettlementError};
use thiserror::Error;

use crate::data_objects::JsonResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
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
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code()).json(JsonResponse::failure(self))
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match e {
            e if e.is_not_found() => Self::NoRecordFound(e.to_string()),
            SettlementError::InsufficientStock { .. } |
            SettlementError::InvalidTransition { .. } |
            SettlementError::OrderAlreadyExists(_) => Self::Conflict(e.to_string()),
            SettlementError::InvalidRequest(_) | SettlementError::InvalidTargetStatus(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
            e => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CustomerApiError> for ServerError {
    fn from(e: CustomerApiError) -> Self {
        match e {
            CustomerApiError::QueryError(s) => Self::InvalidRequestPath(s),
            CustomerApiError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}
