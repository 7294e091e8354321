use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait};
use serde_json::Value;

use crate::{
    dto::payments::{PaymentStatusData, WebhookOutcome},
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    gateway::{CreateIntentParams, PaymentIntent, Refund, WebhookEvent, to_major_units, to_minor_units},
    state::AppState,
};

/// Create (or return the already-active) payment intent for an order.
///
/// The order row is locked for the duration of the retrieve-then-create
/// sequence, so two concurrent requests for the same order cannot both create
/// a gateway intent.
pub async fn create_payment_intent(
    state: &AppState,
    order_id: i32,
    currency: Option<String>,
    metadata: Option<serde_json::Map<String, Value>>,
) -> AppResult<PaymentIntent> {
    let gateway = state.gateway()?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    // Idempotent short-circuit: an existing non-canceled intent is reused.
    if let Some(intent_id) = order.payment_intent_id.as_deref() {
        let existing = gateway.retrieve_intent(intent_id).await?;
        if existing.status != "canceled" {
            txn.commit().await?;
            return Ok(existing);
        }
    }

    let amount = to_minor_units(order.total_price)?;

    let mut meta = BTreeMap::new();
    meta.insert("orderId".to_string(), order.id.to_string());
    meta.insert("userId".to_string(), order.user_id.to_string());
    if let Some(extra) = metadata {
        for (key, value) in extra {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            meta.insert(key, value);
        }
    }

    let intent = gateway
        .create_intent(CreateIntentParams {
            amount,
            currency: currency.unwrap_or_else(|| "usd".to_string()),
            description: format!("Payment for Order #{}", order.id),
            metadata: meta,
        })
        .await?;

    let mut active: OrderActive = order.into();
    active.payment_intent_id = Set(Some(intent.id.clone()));
    active.payment_status = Set("pending".to_string());
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id, intent_id = %intent.id, "payment intent created");
    Ok(intent)
}

/// Confirm an intent at the gateway. When no local order tracks the intent the
/// confirmation still stands and the store is left untouched.
pub async fn confirm_payment(
    state: &AppState,
    intent_id: &str,
    payment_method_id: Option<&str>,
) -> AppResult<PaymentIntent> {
    let gateway = state.gateway()?;
    let intent = gateway.confirm_intent(intent_id, payment_method_id).await?;

    let order = Orders::find()
        .filter(OrderCol::PaymentIntentId.eq(intent_id))
        .one(&state.orm)
        .await?;

    if let Some(order) = order {
        let mut active: OrderActive = order.into();
        active.payment_status = Set(intent.status.clone());
        active.payment_method = Set(intent.payment_method.clone());
        active.updated_at = Set(Utc::now().into());
        active.update(&state.orm).await?;
    }

    Ok(intent)
}

/// Report the payment state of an order, reconciling local drift against the
/// gateway. Orders without an intent report `no_payment` without a gateway
/// call.
pub async fn get_payment_status(state: &AppState, order_id: i32) -> AppResult<PaymentStatusData> {
    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let Some(intent_id) = order.payment_intent_id.clone() else {
        return Ok(PaymentStatusData::no_payment());
    };

    let gateway = state.gateway()?;
    let intent = gateway.retrieve_intent(&intent_id).await?;

    if order.payment_status != intent.status {
        let order_id = order.id;
        let mut active: OrderActive = order.into();
        active.payment_status = Set(intent.status.clone());
        active.updated_at = Set(Utc::now().into());
        active.update(&state.orm).await?;
        tracing::debug!(order_id, status = %intent.status, "payment status reconciled");
    }

    Ok(PaymentStatusData {
        order_id: Some(order_id),
        payment_intent_id: Some(intent.id),
        status: intent.status,
        amount: Some(to_major_units(intent.amount)),
        currency: Some(intent.currency),
        payment_method: intent.payment_method,
        message: None,
    })
}

pub async fn cancel_payment(state: &AppState, order_id: i32) -> AppResult<PaymentIntent> {
    let gateway = state.gateway()?;

    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let intent_id = order
        .payment_intent_id
        .clone()
        .ok_or(AppError::NoPaymentIntent)?;

    let intent = gateway.cancel_intent(&intent_id).await?;

    let mut active: OrderActive = order.into();
    active.payment_status = Set("canceled".to_string());
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    Ok(intent)
}

/// Refund an order's payment, partially when an amount is given. The refund
/// also moves the coarse order status to "Refunded".
pub async fn refund_payment(
    state: &AppState,
    order_id: i32,
    amount: Option<rust_decimal::Decimal>,
) -> AppResult<Refund> {
    let gateway = state.gateway()?;

    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let intent_id = order
        .payment_intent_id
        .clone()
        .ok_or(AppError::NoPaymentIntent)?;

    let amount_minor = amount.map(to_minor_units).transpose()?;
    let refund = gateway.create_refund(&intent_id, amount_minor).await?;

    let mut active: OrderActive = order.into();
    active.payment_status = Set("refunded".to_string());
    active.status = Set("Refunded".to_string());
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    tracing::info!(order_id, refund_id = %refund.id, "payment refunded");
    Ok(refund)
}

/// Apply a provider notification to the tracked order, if any. A notification
/// for an intent this system does not track is reported back, not failed.
pub async fn handle_webhook(state: &AppState, event: WebhookEvent) -> AppResult<WebhookOutcome> {
    let intent = event.data.object;

    let order = Orders::find()
        .filter(OrderCol::PaymentIntentId.eq(intent.id.as_str()))
        .one(&state.orm)
        .await?;

    let Some(order) = order else {
        tracing::warn!(intent_id = %intent.id, "webhook for untracked payment intent");
        return Ok(WebhookOutcome {
            processed: false,
            order_id: None,
            event_type: None,
            message: Some("Order not found".to_string()),
        });
    };

    let order_id = order.id;
    let mut active: OrderActive = order.into();
    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            active.payment_status = Set("succeeded".to_string());
            active.status = Set("Processing".to_string());
            active.payment_method = Set(intent.payment_method.clone());
        }
        "payment_intent.payment_failed" => {
            active.payment_status = Set("failed".to_string());
        }
        "payment_intent.canceled" => {
            active.payment_status = Set("canceled".to_string());
        }
        "payment_intent.processing" => {
            active.payment_status = Set("processing".to_string());
        }
        other => {
            // Forward compatibility with provider event types we do not model.
            tracing::info!(event_type = other, "unhandled webhook event type");
        }
    }

    if active.is_changed() {
        active.updated_at = Set(Utc::now().into());
        active.update(&state.orm).await?;
    }

    Ok(WebhookOutcome {
        processed: true,
        order_id: Some(order_id),
        event_type: Some(event.event_type),
        message: None,
    })
}

/// Verify and decode a raw webhook delivery via the gateway adapter.
pub fn construct_webhook_event(
    state: &AppState,
    payload: &[u8],
    signature: &str,
) -> AppResult<WebhookEvent> {
    state.gateway()?.construct_webhook_event(payload, signature)
}
