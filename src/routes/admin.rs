use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::orders::OrderPage,
    error::AppResult,
    routes::params::Pagination,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/orders", get(list_all_orders))
}

#[utoipa::path(get, path = "/api/admin/orders", tag = "Admin",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "page size, clamped to 100")
    ),
    responses((status = 200, description = "Paginated orders, newest first", body = OrderPage)))]
pub async fn list_all_orders(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<OrderPage>> {
    let page = order_service::list_orders_paginated(&state, pagination).await?;
    Ok(Json(page))
}
