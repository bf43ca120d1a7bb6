use crate::services::payment_store::StoreError;
use crate::services::provider::ProviderError;
use crate::services::sumup_client::GatewayError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub enum HandlerError {
    NotFound,
    Validation(String),
    Gateway(GatewayError),
    Internal(String),
}

impl From<ProviderError> for HandlerError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Validation(message) => Self::Validation(message),
            ProviderError::Gateway(e) => e.into(),
            ProviderError::Store(e) => e.into(),
        }
    }
}

impl From<GatewayError> for HandlerError {
    fn from(e: GatewayError) -> Self {
        if e.is_credential_error() {
            Self::Validation(e.to_string())
        } else {
            Self::Gateway(e)
        }
    }
}

impl From<StoreError> for HandlerError {
    fn from(e: StoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<tera::Error> for HandlerError {
    fn from(e: tera::Error) -> Self {
        Self::Internal(format!("template rendering failed: {e}"))
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HandlerError::NotFound => return StatusCode::NOT_FOUND.into_response(),
            HandlerError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody { code: "validation_error", message },
            ),
            HandlerError::Gateway(e) => {
                error!("SumUp call failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody { code: "gateway_error", message: e.to_string() },
                )
            }
            HandlerError::Internal(message) => {
                error!("{}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody { code: "internal_error", message },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
