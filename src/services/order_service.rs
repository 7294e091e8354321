use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::{
    dto::orders::{CreateOrderRequest, OrderPage, OrderWithItems, UpdateOrderRequest},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    models::{Order, OrderItem},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_orders(state: &AppState) -> AppResult<Vec<OrderWithItems>> {
    let rows = Orders::find()
        .find_with_related(OrderItems)
        .all(&state.orm)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(order, items)| OrderWithItems {
            order: order_from_entity(order),
            items: items.into_iter().map(order_item_from_entity).collect(),
        })
        .collect())
}

/// Admin-facing variant: paginated, newest first.
pub async fn list_orders_paginated(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<OrderPage> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Orders::find().order_by_desc(OrderCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let data = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    Ok(OrderPage {
        data,
        total,
        page,
        limit,
    })
}

pub async fn get_order(state: &AppState, id: i32) -> AppResult<OrderWithItems> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(OrderWithItems {
        order: order_from_entity(order),
        items,
    })
}

/// Insert the order and, when supplied, its items in one transaction so a
/// failed item insert cannot leave a half-created order behind.
pub async fn create_order(state: &AppState, payload: CreateOrderRequest) -> AppResult<Order> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::Validation("Error creating order: userId is required".into()))?;
    let total_price = payload.total_price.ok_or_else(|| {
        AppError::Validation("Error creating order: totalPrice is required".into())
    })?;

    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: NotSet,
        user_id: Set(user_id),
        total_price: Set(total_price),
        status: Set(payload.status.unwrap_or_else(|| "Pending".to_string())),
        payment_intent_id: Set(None),
        payment_status: Set("pending".to_string()),
        payment_method: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    if let Some(items) = payload.items {
        for item in items {
            OrderItemActive {
                id: NotSet,
                order_id: Set(order.id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                price: Set(item.price),
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;

    tracing::info!(order_id = order.id, user_id, "order created");
    Ok(order_from_entity(order))
}

pub async fn update_order(
    state: &AppState,
    id: i32,
    payload: UpdateOrderRequest,
) -> AppResult<Order> {
    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let mut active: OrderActive = existing.into();
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(total_price) = payload.total_price {
        active.total_price = Set(total_price);
    }
    if let Some(payment_status) = payload.payment_status {
        active.payment_status = Set(payment_status);
    }
    if let Some(payment_method) = payload.payment_method {
        active.payment_method = Set(Some(payment_method));
    }
    active.updated_at = Set(Utc::now().into());

    let order = active.update(&state.orm).await?;
    Ok(order_from_entity(order))
}

/// Items are removed first to satisfy the foreign key, all in one transaction.
pub async fn delete_order(state: &AppState, id: i32) -> AppResult<()> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?;

    Orders::delete_by_id(order.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = id, "order deleted");
    Ok(())
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        total_price: model.total_price,
        status: model.status,
        payment_intent_id: model.payment_intent_id,
        payment_status: model.payment_status,
        payment_method: model.payment_method,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
    }
}
