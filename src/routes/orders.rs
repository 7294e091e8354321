use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use crate::{
    dto::orders::{AddItemsRequest, CreateOrderRequest, OrderWithItems, UpdateOrderItemRequest, UpdateOrderRequest},
    error::AppResult,
    models::{Order, OrderItem},
    response::MessageResponse,
    services::{order_item_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route(
            "/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/{order_id}/items", get(list_items).post(add_items))
        .route("/items/{id}", put(update_item).delete(remove_item))
}

#[utoipa::path(get, path = "/api/orders", tag = "Orders",
    responses((status = 200, description = "All orders with their items", body = Vec<OrderWithItems>)))]
pub async fn list_orders(State(state): State<AppState>) -> AppResult<Json<Vec<OrderWithItems>>> {
    let orders = order_service::list_orders(&state).await?;
    Ok(Json(orders))
}

#[utoipa::path(get, path = "/api/orders/{id}", tag = "Orders",
    responses((status = 200, description = "Order with items", body = OrderWithItems), (status = 404, description = "Order not found")))]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<OrderWithItems>> {
    let order = order_service::get_order(&state, id).await?;
    Ok(Json(order))
}

#[utoipa::path(post, path = "/api/orders", tag = "Orders",
    request_body = CreateOrderRequest,
    responses((status = 201, description = "Order created", body = Order)))]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = order_service::create_order(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(put, path = "/api/orders/{id}", tag = "Orders",
    request_body = UpdateOrderRequest,
    responses((status = 200, description = "Order updated", body = Order), (status = 404, description = "Order not found")))]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<Json<Order>> {
    let order = order_service::update_order(&state, id, payload).await?;
    Ok(Json(order))
}

#[utoipa::path(delete, path = "/api/orders/{id}", tag = "Orders",
    responses((status = 200, description = "Order deleted", body = MessageResponse), (status = 404, description = "Order not found")))]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    order_service::delete_order(&state, id).await?;
    Ok(Json(MessageResponse::new("Order deleted successfully")))
}

#[utoipa::path(post, path = "/api/orders/{order_id}/items", tag = "Order Items",
    request_body = AddItemsRequest,
    responses((status = 201, description = "Items appended", body = Vec<OrderItem>), (status = 404, description = "Order not found")))]
pub async fn add_items(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    Json(payload): Json<AddItemsRequest>,
) -> AppResult<(StatusCode, Json<Vec<OrderItem>>)> {
    let items = order_item_service::add_items(&state, order_id, payload.into_items()).await?;
    Ok((StatusCode::CREATED, Json(items)))
}

#[utoipa::path(get, path = "/api/orders/{order_id}/items", tag = "Order Items",
    responses((status = 200, description = "Items for the order, empty if none", body = Vec<OrderItem>)))]
pub async fn list_items(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> AppResult<Json<Vec<OrderItem>>> {
    let items = order_item_service::list_items(&state, order_id).await?;
    Ok(Json(items))
}

#[utoipa::path(put, path = "/api/orders/items/{id}", tag = "Order Items",
    request_body = UpdateOrderItemRequest,
    responses((status = 200, description = "Item updated", body = OrderItem), (status = 404, description = "Order item not found")))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOrderItemRequest>,
) -> AppResult<Json<OrderItem>> {
    let item = order_item_service::update_item(&state, id, payload).await?;
    Ok(Json(item))
}

#[utoipa::path(delete, path = "/api/orders/items/{id}", tag = "Order Items",
    responses((status = 200, description = "Item removed", body = MessageResponse), (status = 404, description = "Order item not found")))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    order_item_service::remove_item(&state, id).await?;
    Ok(Json(MessageResponse::new("Order item removed successfully")))
}
