use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;

use crate::error::{AppError, AppResult};

use super::{CreateIntentParams, PaymentGateway, PaymentIntent, Refund, WebhookEvent};

const API_BASE: &str = "https://api.stripe.com/v1";
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Stripe-backed gateway. Talks to the REST API with form-encoded bodies and
/// bearer auth; webhook signatures are verified with the shared endpoint
/// secret.
pub struct StripeGateway {
    client: Client,
    secret_key: String,
    webhook_secret: Option<String>,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: String, webhook_secret: Option<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            secret_key,
            webhook_secret,
            base_url: API_BASE.to_string(),
        })
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> AppResult<T> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(request_error)?;
        decode(resp).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(request_error)?;
        decode(resp).await
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, params: CreateIntentParams) -> AppResult<PaymentIntent> {
        let mut form = vec![
            ("amount".to_string(), params.amount.to_string()),
            ("currency".to_string(), params.currency),
            ("description".to_string(), params.description),
        ];
        for (key, value) in params.metadata {
            form.push((format!("metadata[{key}]"), value));
        }
        self.post_form("/payment_intents", &form).await
    }

    async fn retrieve_intent(&self, id: &str) -> AppResult<PaymentIntent> {
        self.get(&format!("/payment_intents/{id}")).await
    }

    async fn confirm_intent(
        &self,
        id: &str,
        payment_method: Option<&str>,
    ) -> AppResult<PaymentIntent> {
        let mut form = Vec::new();
        if let Some(pm) = payment_method {
            form.push(("payment_method".to_string(), pm.to_string()));
        }
        self.post_form(&format!("/payment_intents/{id}/confirm"), &form)
            .await
    }

    async fn cancel_intent(&self, id: &str) -> AppResult<PaymentIntent> {
        self.post_form(&format!("/payment_intents/{id}/cancel"), &[])
            .await
    }

    async fn create_refund(&self, intent_id: &str, amount: Option<i64>) -> AppResult<Refund> {
        let mut form = vec![("payment_intent".to_string(), intent_id.to_string())];
        if let Some(amount) = amount {
            form.push(("amount".to_string(), amount.to_string()));
        }
        self.post_form("/refunds", &form).await
    }

    fn construct_webhook_event(&self, payload: &[u8], signature: &str) -> AppResult<WebhookEvent> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or_else(|| AppError::Signature("Webhook secret not configured".to_string()))?;
        verify_signature(payload, signature, secret, chrono::Utc::now().timestamp())?;
        serde_json::from_slice(payload)
            .map_err(|e| AppError::Signature(format!("invalid event payload: {e}")))
    }
}

fn request_error(err: reqwest::Error) -> AppError {
    AppError::Gateway(err.to_string())
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> AppResult<T> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(request_error)?;
    if !status.is_success() {
        let message = serde_json::from_slice::<StripeErrorEnvelope>(&bytes)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        return Err(AppError::Gateway(message));
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::Gateway(format!("unexpected response body: {e}")))
}

/// Check a `Stripe-Signature` header (`t=<ts>,v1=<hex hmac>`) against the
/// payload: HMAC-SHA256 over `"{t}.{payload}"` keyed with the endpoint
/// secret, plus a timestamp tolerance window.
fn verify_signature(payload: &[u8], header: &str, secret: &str, now: i64) -> AppResult<()> {
    let mut timestamp = "";
    let mut v1 = "";
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value,
            Some(("v1", value)) => v1 = value,
            _ => {}
        }
    }

    if timestamp.is_empty() || v1.is_empty() {
        return Err(AppError::Signature("malformed signature header".into()));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| AppError::Signature("malformed timestamp".into()))?;
    if (now - ts).unsigned_abs() > SIGNATURE_TOLERANCE_SECS as u64 {
        return Err(AppError::Signature("timestamp outside tolerance".into()));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Signature("invalid secret".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    if constant_time_eq(expected.as_bytes(), v1.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::Signature("signature mismatch".into()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], secret: &str, ts: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{ts}.").as_bytes());
        mac.update(payload);
        format!("t={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = sign(payload, "whsec_test", 1_700_000_000);
        assert!(verify_signature(payload, &header, "whsec_test", 1_700_000_000).is_ok());
    }

    #[test]
    fn rejects_tampered_payload() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = sign(payload, "whsec_test", 1_700_000_000);
        let err = verify_signature(
            br#"{"type":"payment_intent.canceled"}"#,
            &header,
            "whsec_test",
            1_700_000_000,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Signature(_)));
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = b"{}";
        let header = sign(payload, "whsec_test", 1_700_000_000);
        assert!(verify_signature(payload, &header, "whsec_other", 1_700_000_000).is_err());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let payload = b"{}";
        let ts = 1_700_000_000;
        let header = sign(payload, "whsec_test", ts);
        let err =
            verify_signature(payload, &header, "whsec_test", ts + SIGNATURE_TOLERANCE_SECS + 1)
                .unwrap_err();
        assert!(matches!(err, AppError::Signature(_)));
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(verify_signature(b"{}", "v1=abc", "whsec_test", 0).is_err());
        assert!(verify_signature(b"{}", "t=123", "whsec_test", 0).is_err());
        assert!(verify_signature(b"{}", "", "whsec_test", 0).is_err());
    }
}
