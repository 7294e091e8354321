use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    // Required fields are Options so their absence surfaces as a creation
    // failure instead of a deserialization rejection (original API contract).
    pub user_id: Option<i32>,
    pub total_price: Option<Decimal>,
    pub status: Option<String>,
    pub items: Option<Vec<OrderItemInput>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: i32,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub total_price: Option<Decimal>,
    pub payment_status: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderItemRequest {
    pub quantity: Option<i32>,
    pub price: Option<Decimal>,
}

/// Item append body: either `{"items": [...]}` or a bare array.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AddItemsRequest {
    Wrapped { items: Vec<OrderItemInput> },
    Bare(Vec<OrderItemInput>),
}

impl AddItemsRequest {
    pub fn into_items(self) -> Vec<OrderItemInput> {
        match self {
            AddItemsRequest::Wrapped { items } => items,
            AddItemsRequest::Bare(items) => items,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Admin-facing paginated listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPage {
    pub data: Vec<Order>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_items_accepts_bare_array_and_wrapped_object() {
        let bare: AddItemsRequest =
            serde_json::from_str(r#"[{"productId":1,"quantity":2,"price":"9.99"}]"#).unwrap();
        assert_eq!(bare.into_items().len(), 1);

        let wrapped: AddItemsRequest =
            serde_json::from_str(r#"{"items":[{"productId":1,"quantity":2,"price":"9.99"}]}"#)
                .unwrap();
        let items = wrapped.into_items();
        assert_eq!(items[0].product_id, 1);
        assert_eq!(items[0].quantity, 2);
    }
}
