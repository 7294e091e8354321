use serde::Serialize;
use utoipa::ToSchema;

/// Envelope used by the payment endpoints: `{success, message?, data}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> PaymentResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }

    /// Envelope without a message, as returned by the status endpoint.
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
