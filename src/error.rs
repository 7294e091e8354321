use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("No payment intent found for this order")]
    NoPaymentIntent,

    // Missing required fields on create surface as a generic 500 creation
    // failure, matching the original API contract.
    #[error("{0}")]
    Validation(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("{0}")]
    Configuration(String),

    #[error("Webhook signature verification failed: {0}")]
    Signature(String),

    #[error("Database error")]
    Orm(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: String,
}

impl AppError {
    fn envelope(&self) -> (StatusCode, ErrorBody) {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NoPaymentIntent => StatusCode::BAD_REQUEST,
            AppError::Signature(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Orm(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Gateway and configuration failures carry a stable outer message
        // while the underlying detail goes into `error`.
        let (message, error) = match self {
            AppError::Gateway(detail) => ("Payment gateway error".to_string(), detail.clone()),
            AppError::Configuration(detail) => {
                ("Server configuration error".to_string(), detail.clone())
            }
            other => (other.to_string(), other.to_string()),
        };

        (
            status,
            ErrorBody {
                success: false,
                message,
                error,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.envelope();
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_pair_stable_message_with_detail() {
        let (status, body) = AppError::Gateway("card declined".into()).envelope();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.success);
        assert_eq!(body.message, "Payment gateway error");
        assert_eq!(body.error, "card declined");
    }

    #[test]
    fn configuration_errors_keep_detail_out_of_message() {
        let (status, body) =
            AppError::Configuration("STRIPE_SECRET_KEY is not set".into()).envelope();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Server configuration error");
        assert_eq!(body.error, "STRIPE_SECRET_KEY is not set");
    }

    #[test]
    fn not_found_uses_display_for_both_fields() {
        let (status, body) = AppError::NotFound("Order").envelope();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Order not found");
        assert_eq!(body.error, "Order not found");
    }
}
