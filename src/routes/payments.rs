use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
};

use crate::{
    dto::payments::{
        CancelPaymentRequest, CanceledIntentData, ConfirmPaymentRequest, CreateIntentRequest,
        IntentCreatedData, IntentSummaryData, PaymentStatusData, RefundPaymentRequest,
        WebhookOutcome,
    },
    error::{AppError, AppResult},
    gateway::to_major_units,
    response::PaymentResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-intent", post(create_intent))
        .route("/confirm", post(confirm))
        .route("/status/{order_id}", get(status))
        .route("/cancel", post(cancel))
        .route("/refund", post(refund))
        .route("/webhook", post(webhook))
}

#[utoipa::path(post, path = "/api/payments/create-intent", tag = "Payments",
    request_body = CreateIntentRequest,
    responses((status = 200, description = "Intent created or reused", body = PaymentResponse<IntentCreatedData>), (status = 400, description = "Missing order id"), (status = 404, description = "Order not found")))]
pub async fn create_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreateIntentRequest>,
) -> AppResult<Json<PaymentResponse<IntentCreatedData>>> {
    let order_id = payload
        .order_id
        .ok_or_else(|| AppError::BadRequest("Order ID is required".into()))?;

    let intent =
        payment_service::create_payment_intent(&state, order_id, payload.currency, payload.metadata)
            .await?;

    Ok(Json(PaymentResponse::ok(
        "Payment intent created successfully",
        IntentCreatedData {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
            amount: to_major_units(intent.amount),
            currency: intent.currency,
        },
    )))
}

#[utoipa::path(post, path = "/api/payments/confirm", tag = "Payments",
    request_body = ConfirmPaymentRequest,
    responses((status = 200, description = "Payment confirmed", body = PaymentResponse<IntentSummaryData>), (status = 400, description = "Missing payment intent id")))]
pub async fn confirm(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> AppResult<Json<PaymentResponse<IntentSummaryData>>> {
    let intent_id = payload
        .payment_intent_id
        .ok_or_else(|| AppError::BadRequest("Payment intent ID is required".into()))?;

    let intent = payment_service::confirm_payment(
        &state,
        &intent_id,
        payload.payment_method_id.as_deref(),
    )
    .await?;

    Ok(Json(PaymentResponse::ok(
        "Payment confirmed",
        IntentSummaryData {
            id: intent.id,
            status: intent.status,
            amount: to_major_units(intent.amount),
            currency: intent.currency,
        },
    )))
}

#[utoipa::path(get, path = "/api/payments/status/{order_id}", tag = "Payments",
    responses((status = 200, description = "Payment status", body = PaymentResponse<PaymentStatusData>), (status = 404, description = "Order not found")))]
pub async fn status(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> AppResult<Json<PaymentResponse<PaymentStatusData>>> {
    let data = payment_service::get_payment_status(&state, order_id).await?;
    Ok(Json(PaymentResponse::data(data)))
}

#[utoipa::path(post, path = "/api/payments/cancel", tag = "Payments",
    request_body = CancelPaymentRequest,
    responses((status = 200, description = "Payment canceled", body = PaymentResponse<CanceledIntentData>), (status = 400, description = "Missing order id or no intent"), (status = 404, description = "Order not found")))]
pub async fn cancel(
    State(state): State<AppState>,
    Json(payload): Json<CancelPaymentRequest>,
) -> AppResult<Json<PaymentResponse<CanceledIntentData>>> {
    let order_id = payload
        .order_id
        .ok_or_else(|| AppError::BadRequest("Order ID is required".into()))?;

    let intent = payment_service::cancel_payment(&state, order_id).await?;

    Ok(Json(PaymentResponse::ok(
        "Payment canceled successfully",
        CanceledIntentData {
            id: intent.id,
            status: intent.status,
        },
    )))
}

#[utoipa::path(post, path = "/api/payments/refund", tag = "Payments",
    request_body = RefundPaymentRequest,
    responses((status = 200, description = "Payment refunded", body = PaymentResponse<IntentSummaryData>), (status = 400, description = "Missing order id or no intent"), (status = 404, description = "Order not found")))]
pub async fn refund(
    State(state): State<AppState>,
    Json(payload): Json<RefundPaymentRequest>,
) -> AppResult<Json<PaymentResponse<IntentSummaryData>>> {
    let order_id = payload
        .order_id
        .ok_or_else(|| AppError::BadRequest("Order ID is required".into()))?;

    let refund = payment_service::refund_payment(&state, order_id, payload.amount).await?;

    Ok(Json(PaymentResponse::ok(
        "Payment refunded successfully",
        IntentSummaryData {
            id: refund.id,
            status: refund.status,
            amount: to_major_units(refund.amount),
            currency: refund.currency,
        },
    )))
}

// The webhook body must stay raw: the signature covers the exact bytes the
// provider sent.
#[utoipa::path(post, path = "/api/payments/webhook", tag = "Payments",
    request_body(content = String, description = "Raw event payload as delivered by the provider"),
    responses((status = 200, description = "Webhook processed", body = PaymentResponse<WebhookOutcome>), (status = 400, description = "Missing or invalid signature")))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<PaymentResponse<WebhookOutcome>>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing stripe-signature header".into()))?;

    let event = payment_service::construct_webhook_event(&state, &body, signature)?;
    let outcome = payment_service::handle_webhook(&state, event).await?;

    Ok(Json(PaymentResponse::ok("Webhook processed", outcome)))
}
