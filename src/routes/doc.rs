use utoipa::OpenApi;
use utoipa::openapi::OpenApi as OpenApiSpec;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{orders, payments},
    models::{Order, OrderItem},
    response::{MessageResponse, PaymentResponse},
    routes::{admin, health, orders as order_routes, params, payments as payment_routes},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        order_routes::list_orders,
        order_routes::get_order,
        order_routes::create_order,
        order_routes::update_order,
        order_routes::delete_order,
        order_routes::add_items,
        order_routes::list_items,
        order_routes::update_item,
        order_routes::remove_item,
        admin::list_all_orders,
        payment_routes::create_intent,
        payment_routes::confirm,
        payment_routes::status,
        payment_routes::cancel,
        payment_routes::refund,
        payment_routes::webhook
    ),
    components(
        schemas(
            Order,
            OrderItem,
            orders::CreateOrderRequest,
            orders::UpdateOrderRequest,
            orders::OrderItemInput,
            orders::AddItemsRequest,
            orders::UpdateOrderItemRequest,
            orders::OrderWithItems,
            orders::OrderPage,
            params::Pagination,
            payments::CreateIntentRequest,
            payments::ConfirmPaymentRequest,
            payments::CancelPaymentRequest,
            payments::RefundPaymentRequest,
            payments::IntentCreatedData,
            payments::IntentSummaryData,
            payments::CanceledIntentData,
            payments::PaymentStatusData,
            payments::WebhookOutcome,
            MessageResponse,
            PaymentResponse<payments::IntentCreatedData>,
            PaymentResponse<payments::IntentSummaryData>,
            PaymentResponse<payments::CanceledIntentData>,
            PaymentResponse<payments::PaymentStatusData>,
            PaymentResponse<payments::WebhookOutcome>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Order Items", description = "Order line item endpoints"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Payments", description = "Payment lifecycle endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
