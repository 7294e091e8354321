use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

pub mod stripe;

pub use stripe::StripeGateway;

/// A payment attempt as the provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    /// Amount in minor units (cents).
    pub amount: i64,
    pub currency: String,
    pub client_secret: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Refund {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
}

/// Signed notification pushed by the provider on an intent state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEventData {
    pub object: PaymentIntent,
}

#[derive(Debug, Clone)]
pub struct CreateIntentParams {
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
}

/// Isolates every call to the external payment provider. Amounts cross this
/// boundary in integer minor units; the rest of the system uses decimal major
/// units.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, params: CreateIntentParams) -> AppResult<PaymentIntent>;

    async fn retrieve_intent(&self, id: &str) -> AppResult<PaymentIntent>;

    async fn confirm_intent(
        &self,
        id: &str,
        payment_method: Option<&str>,
    ) -> AppResult<PaymentIntent>;

    async fn cancel_intent(&self, id: &str) -> AppResult<PaymentIntent>;

    /// Omitting `amount` requests a full refund.
    async fn create_refund(&self, intent_id: &str, amount: Option<i64>) -> AppResult<Refund>;

    /// Verify the webhook signature header and decode the event payload.
    fn construct_webhook_event(&self, payload: &[u8], signature: &str) -> AppResult<WebhookEvent>;
}

/// Convert a major-unit decimal amount to integer minor units, rounding to
/// the nearest cent.
pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| AppError::BadRequest("Amount out of range".into()))
}

pub fn to_major_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn converts_major_units_to_cents() {
        let amount = Decimal::from_str("99.99").unwrap();
        assert_eq!(to_minor_units(amount).unwrap(), 9999);

        let amount = Decimal::from_str("50.00").unwrap();
        assert_eq!(to_minor_units(amount).unwrap(), 5000);

        // Sub-cent precision rounds to the nearest cent.
        let amount = Decimal::from_str("10.005").unwrap();
        assert_eq!(to_minor_units(amount).unwrap(), 1000);
    }

    #[test]
    fn converts_cents_back_to_major_units() {
        assert_eq!(to_major_units(9999), Decimal::from_str("99.99").unwrap());
        assert_eq!(to_major_units(100), Decimal::from_str("1.00").unwrap());
    }

    #[test]
    fn decodes_webhook_event_payload() {
        let payload = serde_json::json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": {
                "object": {
                    "id": "pi_test123",
                    "status": "succeeded",
                    "amount": 9999,
                    "currency": "usd",
                    "payment_method": "pm_card_visa"
                }
            }
        });

        let event: WebhookEvent = serde_json::from_value(payload).unwrap();
        assert_eq!(event.event_type, "payment_intent.succeeded");
        assert_eq!(event.data.object.id, "pi_test123");
        assert_eq!(event.data.object.payment_method.as_deref(), Some("pm_card_visa"));
    }
}
