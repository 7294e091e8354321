use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::error::{AppError, AppResult};
use crate::gateway::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    /// None when no provider credential is configured; payment operations
    /// then fail with a configuration error while the rest of the API works.
    pub gateway: Option<Arc<dyn PaymentGateway>>,
}

impl AppState {
    pub fn gateway(&self) -> AppResult<&dyn PaymentGateway> {
        self.gateway.as_deref().ok_or_else(|| {
            AppError::Configuration(
                "Payment gateway is not configured. Set STRIPE_SECRET_KEY.".to_string(),
            )
        })
    }
}
