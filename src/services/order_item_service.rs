use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set, TransactionTrait};

use crate::{
    dto::orders::{OrderItemInput, UpdateOrderItemRequest},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::Entity as Orders,
    },
    error::{AppError, AppResult},
    models::OrderItem,
    services::order_service::order_item_from_entity,
    state::AppState,
};

/// Stamp each item with the order id and insert. The parent order is checked
/// explicitly so an append against an unknown order fails with NotFound
/// instead of tripping the foreign key.
pub async fn add_items(
    state: &AppState,
    order_id: i32,
    items: Vec<OrderItemInput>,
) -> AppResult<Vec<OrderItem>> {
    let txn = state.orm.begin().await?;

    Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let model = OrderItemActive {
            id: NotSet,
            order_id: Set(order_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            price: Set(item.price),
        }
        .insert(&txn)
        .await?;
        inserted.push(order_item_from_entity(model));
    }

    txn.commit().await?;
    Ok(inserted)
}

/// Total over order ids: an unknown or empty order yields an empty vec,
/// never an error.
pub async fn list_items(state: &AppState, order_id: i32) -> AppResult<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();
    Ok(items)
}

pub async fn update_item(
    state: &AppState,
    id: i32,
    payload: UpdateOrderItemRequest,
) -> AppResult<OrderItem> {
    let existing = OrderItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order item"))?;

    let mut active: OrderItemActive = existing.into();
    if let Some(quantity) = payload.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }

    let item = active.update(&state.orm).await?;
    Ok(order_item_from_entity(item))
}

pub async fn remove_item(state: &AppState, id: i32) -> AppResult<()> {
    let existing = OrderItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order item"))?;

    existing.delete(&state.orm).await?;
    Ok(())
}
